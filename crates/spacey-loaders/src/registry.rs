// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Registry of built-in module records

use crate::config::LoaderConfig;
use crate::native_module::NativeModule;
use indexmap::IndexMap;
use std::rc::Rc;

/// Identifier to record map, populated once at startup
#[derive(Debug, Default)]
pub struct NativeModuleRegistry {
    modules: IndexMap<String, Rc<NativeModule>>,
}

impl NativeModuleRegistry {
    /// Create one unloaded record per identifier. Repeated identifiers keep
    /// their first record.
    pub fn populate<S: Into<String>>(ids: impl IntoIterator<Item = S>, config: &LoaderConfig) -> Self {
        let mut modules = IndexMap::new();
        for id in ids {
            let id = id.into();
            if modules.contains_key(&id) {
                tracing::warn!(id = %id, "duplicate built-in module identifier ignored");
                continue;
            }
            let module = NativeModule::new(id.clone(), config);
            modules.insert(id, module);
        }
        tracing::debug!(count = modules.len(), "built-in module registry populated");
        Self { modules }
    }

    /// Look up a record
    pub fn get(&self, id: &str) -> Option<&Rc<NativeModule>> {
        self.modules.get(id)
    }

    /// Whether `id` is registered
    pub fn exists(&self, id: &str) -> bool {
        self.modules.contains_key(id)
    }

    /// Whether `id` is registered and requirable from user land
    pub fn can_be_required_by_users(&self, id: &str) -> bool {
        self.modules
            .get(id)
            .is_some_and(|module| module.can_be_required_by_users())
    }

    /// Registered identifiers in population order
    pub fn ids(&self) -> Vec<String> {
        self.modules.keys().cloned().collect()
    }

    /// Iterate over the records
    pub fn iter(&self) -> impl Iterator<Item = &Rc<NativeModule>> {
        self.modules.values()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Make every record except `loader_id` requirable from user land
    pub fn expose_internals(&self, loader_id: &str) {
        for (id, module) in &self.modules {
            if id != loader_id {
                module.set_can_be_required_by_users(true);
            }
        }
        tracing::debug!("internal modules exposed to user land");
    }
}
