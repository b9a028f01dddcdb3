// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compiler interface for built-in module sources

use crate::error::{LoaderError, Result};
use crate::native_module::NativeModule;
use crate::require::{InternalBinding, Require};
use crate::value::ObjectRef;
use indexmap::IndexMap;
use std::rc::Rc;

/// A compiled built-in module body.
///
/// Arguments, in order: `exports`, `require`, `module`, `process`,
/// `internalBinding`, `primordials`.
pub type CompiledFunction = Rc<
    dyn for<'a> Fn(
        &ObjectRef,
        &Require<'a>,
        &NativeModule,
        &ObjectRef,
        &InternalBinding<'a>,
        &ObjectRef,
    ) -> Result<()>,
>;

/// Turns a built-in module identifier into an executable unit
pub trait ModuleCompiler {
    /// Compile the unit for `id`
    fn compile_function(&self, id: &str) -> Result<CompiledFunction>;
}

/// In-memory catalog of precompiled units
#[derive(Default, Clone)]
pub struct ModuleCatalog {
    units: IndexMap<String, CompiledFunction>,
}

impl ModuleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a unit for `id`, replacing any earlier one
    pub fn define<F>(&mut self, id: impl Into<String>, body: F) -> &mut Self
    where
        F: for<'a> Fn(
                &ObjectRef,
                &Require<'a>,
                &NativeModule,
                &ObjectRef,
                &InternalBinding<'a>,
                &ObjectRef,
            ) -> Result<()>
            + 'static,
    {
        self.units.insert(id.into(), Rc::new(body));
        self
    }

    /// Identifiers in definition order
    pub fn ids(&self) -> Vec<String> {
        self.units.keys().cloned().collect()
    }

    /// Whether `id` has a unit
    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Number of units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl ModuleCompiler for ModuleCatalog {
    fn compile_function(&self, id: &str) -> Result<CompiledFunction> {
        self.units
            .get(id)
            .cloned()
            .ok_or_else(|| LoaderError::UnknownModule(id.to_string()))
    }
}
