// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Scoped `require` and `internalBinding` handed to compiled units

use crate::binding::InternalBindings;
use crate::error::Result;
use crate::loaders::Loaders;
use crate::value::{ObjectRef, Value};

/// How a module's `require` treats identifiers missing from the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireMode {
    /// Look the identifier up verbatim
    Default,
    /// Retry unknown identifiers under the vendored dependency namespace
    FallbackInDeps,
}

/// The `require` argument of a compiled unit
#[derive(Clone, Copy)]
pub struct Require<'a> {
    loaders: &'a Loaders,
    mode: RequireMode,
}

impl<'a> Require<'a> {
    pub(crate) fn new(loaders: &'a Loaders, mode: RequireMode) -> Self {
        Self { loaders, mode }
    }

    /// Require a built-in module
    pub fn call(&self, id: &str) -> Result<ObjectRef> {
        match self.mode {
            RequireMode::Default => self.loaders.require(id),
            RequireMode::FallbackInDeps => self.loaders.require_with_fallback_in_deps(id),
        }
    }

    /// Resolution mode of this handle
    pub fn mode(&self) -> RequireMode {
        self.mode
    }
}

/// The `internalBinding` argument of a compiled unit
#[derive(Clone, Copy)]
pub struct InternalBinding<'a> {
    bindings: &'a InternalBindings,
}

impl<'a> InternalBinding<'a> {
    pub(crate) fn new(bindings: &'a InternalBindings) -> Self {
        Self { bindings }
    }

    /// Resolve an internal binding
    pub fn call(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        self.bindings.resolve(name)
    }
}
