// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Declarative built-in catalogs
//!
//! A manifest describes a catalog in JSON: for every module, the internal
//! bindings and modules it pulls in (in order) and the exports it defines.
//!
//! ```json
//! {
//!   "config": { "expose_internals": false },
//!   "bindings": { "fs": { "kFsStatsFieldsNumber": 14 } },
//!   "linked_bindings": { "embedder": {} },
//!   "modules": {
//!     "internal/fs/utils": { "bindings": ["fs"], "exports": { "kMaxUserId": 4294967295 } },
//!     "fs": { "requires": ["internal/fs/utils"], "exports": { "F_OK": 0 } }
//!   }
//! }
//! ```

use crate::binding::BindingTable;
use crate::compiler::ModuleCatalog;
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::loaders::LoaderOptions;
use crate::value::{ObjectRef, json_to_value};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// One built-in module in a manifest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleSpec {
    /// Internal bindings loaded first, in order
    pub bindings: Vec<String>,
    /// Built-in modules required next, in order
    pub requires: Vec<String>,
    /// Properties assigned to `exports` afterwards
    pub exports: JsonObject,
    /// Raise this message instead of finishing
    pub throws: Option<String>,
}

/// A catalog of built-in modules and bindings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Loader configuration
    pub config: LoaderConfig,
    /// Built-in modules, in registry order
    pub modules: IndexMap<String, ModuleSpec>,
    /// Bindings behind `internalBinding()`
    pub bindings: IndexMap<String, JsonObject>,
    /// Bindings behind `process._linkedBinding()`
    pub linked_bindings: IndexMap<String, JsonObject>,
}

impl Manifest {
    /// Read a manifest from a JSON file
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a manifest from JSON text
    pub fn parse(content: &str) -> Result<Self> {
        let manifest: Manifest = serde_json::from_str(content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    fn validate(&self) -> Result<()> {
        for id in self.modules.keys() {
            if id.is_empty() {
                return Err(LoaderError::Manifest("module identifier is empty".to_string()));
            }
            if *id == self.config.loader_id {
                return Err(LoaderError::Manifest(format!(
                    "'{}' is reserved for the loaders",
                    id
                )));
            }
        }
        Ok(())
    }

    /// Build the compiled units described by the manifest
    pub fn catalog(&self) -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        for (id, spec) in &self.modules {
            let spec = spec.clone();
            catalog.define(id.clone(), move |exports, require, _, _, internal_binding, _| {
                for name in &spec.bindings {
                    internal_binding.call(name.as_str())?;
                }
                for dep in &spec.requires {
                    require.call(dep)?;
                }
                for (key, value) in &spec.exports {
                    exports.set(key.clone(), json_to_value(value));
                }
                match &spec.throws {
                    Some(message) => Err(LoaderError::thrown(message.clone())),
                    None => Ok(()),
                }
            });
        }
        catalog
    }

    /// Provider for `internalBinding()`
    pub fn internal_bindings(&self) -> BindingTable {
        binding_table(&self.bindings)
    }

    /// Provider for `process._linkedBinding()`
    pub fn linked_bindings(&self) -> BindingTable {
        binding_table(&self.linked_bindings)
    }

    /// Loader options for this catalog
    pub fn into_options(self) -> LoaderOptions {
        let catalog = self.catalog();
        let ids = catalog.ids();
        LoaderOptions::new(catalog, ids)
            .with_internal_bindings(self.internal_bindings())
            .with_linked_bindings(self.linked_bindings())
            .with_config(self.config)
    }
}

fn binding_table(bindings: &IndexMap<String, JsonObject>) -> BindingTable {
    let mut table = BindingTable::new();
    for (name, properties) in bindings {
        let properties = properties.clone();
        table.register(name.clone(), move || {
            ObjectRef::from_entries(
                properties
                    .iter()
                    .map(|(key, value)| (key.clone(), json_to_value(value))),
            )
        });
    }
    table
}
