// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration

use crate::binding::AllowList;
use serde::{Deserialize, Serialize};

/// Environment variable that turns on `--expose-internals`
pub const EXPOSE_INTERNALS_ENV: &str = "SPACEY_EXPOSE_INTERNALS";

/// Configuration for the built-in loaders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Let user land require internal modules
    pub expose_internals: bool,

    /// Identifier the loaders answer to themselves
    pub loader_id: String,

    /// Namespace of modules hidden from user land
    pub internal_prefix: String,

    /// Namespace of vendored dependencies
    pub deps_prefix: String,

    /// URL scheme of built-in modules
    pub url_scheme: String,

    /// Replacement for the default `process.binding()` allow-list
    pub legacy_allow_list: Option<Vec<String>>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            expose_internals: false,
            loader_id: "internal/bootstrap/loaders".to_string(),
            internal_prefix: "internal/".to_string(),
            deps_prefix: "internal/deps/".to_string(),
            url_scheme: "node".to_string(),
            legacy_allow_list: None,
        }
    }
}

impl LoaderConfig {
    /// Apply overrides from the process environment.
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(EXPOSE_INTERNALS_ENV) {
            self.expose_internals = matches!(value.trim(), "1" | "true" | "yes");
        }
    }

    /// Whether `id` lives in the internal namespace
    pub fn is_internal(&self, id: &str) -> bool {
        id.starts_with(&self.internal_prefix)
    }

    /// Whether `id` lives in the vendored dependency namespace
    pub fn is_dependency(&self, id: &str) -> bool {
        id.starts_with(&self.deps_prefix)
    }

    /// URL of the built-in module `id`
    pub fn url_for(&self, id: &str) -> String {
        format!("{}:{}", self.url_scheme, id)
    }

    /// The `process.binding()` allow-list in force
    pub fn allow_list(&self) -> AllowList {
        match &self.legacy_allow_list {
            Some(names) => AllowList::new(names.iter().cloned()),
            None => AllowList::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert!(!config.expose_internals);
        assert!(config.is_internal("internal/util"));
        assert!(config.is_internal("internal/deps/acorn"));
        assert!(config.is_dependency("internal/deps/acorn"));
        assert!(!config.is_dependency("internal/util"));
        assert!(!config.is_internal("fs"));
        assert_eq!(config.url_for("fs"), "node:fs");
        assert!(config.allow_list().contains("fs"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{"expose_internals": true, "url_scheme": "spacey"}"#).unwrap();
        assert!(config.expose_internals);
        assert_eq!(config.url_for("fs"), "spacey:fs");
        assert_eq!(config.loader_id, "internal/bootstrap/loaders");
    }

    #[test]
    fn test_apply_env() {
        let mut config = LoaderConfig::default();
        config.apply_env(|key| (key == EXPOSE_INTERNALS_ENV).then(|| "1".to_string()));
        assert!(config.expose_internals);

        config.apply_env(|_| Some("0".to_string()));
        assert!(!config.expose_internals);

        config.expose_internals = true;
        config.apply_env(|_| None);
        assert!(config.expose_internals);
    }

    #[test]
    fn test_custom_allow_list() {
        let config = LoaderConfig {
            legacy_allow_list: Some(vec!["tty_wrap".to_string()]),
            ..Default::default()
        };
        let list = config.allow_list();
        assert_eq!(list.len(), 1);
        assert!(list.contains("tty_wrap"));
        assert!(!list.contains("fs"));
    }
}
