// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! ESM facade for built-in modules
//!
//! A built-in module keeps its exports in a plain mutable object. ESM
//! consumers instead expect individually bound names. The facade holds one
//! slot per exported name, fixed when the facade is created, and the owning
//! record pushes values into it with an explicit sync.

use crate::error::{LoaderError, Result};
use crate::value::{ObjectRef, Value};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Name of the whole-namespace export
pub const DEFAULT_EXPORT: &str = "default";

/// Lifecycle of a facade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacadeStatus {
    /// Created, not linked
    Uninstantiated,
    /// Linked, initializer not yet run
    Instantiated,
    /// Initializer has run
    Evaluated,
}

/// Deferred initializer run on evaluation until it succeeds
pub type FacadeInitializer = Box<dyn Fn(&ModuleFacade) -> Result<()>>;

/// Name-addressable export view of a built-in module
pub struct ModuleFacade {
    url: String,
    bindings: RefCell<IndexMap<String, Value>>,
    status: Cell<FacadeStatus>,
    initializer: RefCell<Option<FacadeInitializer>>,
}

impl ModuleFacade {
    /// Create a facade exposing exactly `names`
    pub fn new(url: impl Into<String>, names: Vec<String>, initializer: FacadeInitializer) -> Self {
        let bindings = names
            .into_iter()
            .map(|name| (name, Value::Undefined))
            .collect();
        Self {
            url: url.into(),
            bindings: RefCell::new(bindings),
            status: Cell::new(FacadeStatus::Uninstantiated),
            initializer: RefCell::new(Some(initializer)),
        }
    }

    /// Module URL, e.g. `node:fs`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exported names in declaration order
    pub fn names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }

    /// Current lifecycle status
    pub fn status(&self) -> FacadeStatus {
        self.status.get()
    }

    /// Link the facade
    pub fn instantiate(&self) {
        if self.status.get() == FacadeStatus::Uninstantiated {
            self.status.set(FacadeStatus::Instantiated);
        }
    }

    /// Run the deferred initializer. Once it succeeds, later calls are
    /// no-ops; if it fails, the facade stays `Instantiated` and the next
    /// call runs it again.
    pub fn evaluate(&self) -> Result<()> {
        self.instantiate();
        // Taken before the call so the initializer may touch the facade.
        let initializer = self.initializer.borrow_mut().take();
        if let Some(init) = initializer {
            if let Err(err) = init(self) {
                *self.initializer.borrow_mut() = Some(init);
                return Err(err);
            }
            self.status.set(FacadeStatus::Evaluated);
        }
        Ok(())
    }

    /// Update the binding for `name`
    pub fn set_export(&self, name: &str, value: Value) -> Result<()> {
        match self.bindings.borrow_mut().get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(LoaderError::UnknownExport {
                url: self.url.clone(),
                name: name.to_string(),
            }),
        }
    }

    /// Current binding for `name`
    pub fn get_export(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    /// The `default` binding
    pub fn default_export(&self) -> Value {
        self.get_export(DEFAULT_EXPORT).unwrap_or_default()
    }

    /// Namespace object built from the current bindings
    pub fn namespace(&self) -> ObjectRef {
        ObjectRef::from_entries(
            self.bindings
                .borrow()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        )
    }
}

impl fmt::Debug for ModuleFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleFacade")
            .field("url", &self.url)
            .field("names", &self.names())
            .field("status", &self.status.get())
            .finish()
    }
}
