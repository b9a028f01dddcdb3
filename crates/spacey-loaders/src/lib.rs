// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-loaders
//!
//! The loaders that run before anything else in a spacey realm. They give
//! built-in modules their `require` and `internalBinding`, and give user land
//! `process.binding()` and `process._linkedBinding()`:
//!
//! - **Native bindings** in three tiers: internal, linked (embedder) and the
//!   legacy allow-listed `process.binding()`, each resolving a name once.
//! - **Built-in modules** compiled lazily from a precompiled catalog, at most
//!   once each, tolerating cyclic `require`.
//! - **ESM facades** exposing a built-in module's exports as individually
//!   bound names for the public module loaders.
//! - **`process.moduleLoadList`**, the ordered record of what was loaded.
//!
//! ## Quick Start
//!
//! ```rust
//! use spacey_loaders::{LoaderOptions, Loaders, ModuleCatalog};
//!
//! let mut catalog = ModuleCatalog::new();
//! catalog.define("path", |exports, _require, _module, _process, _binding, _primordials| {
//!     exports.set("sep", "/");
//!     Ok(())
//! });
//! let ids = catalog.ids();
//!
//! let loaders = Loaders::bootstrap(LoaderOptions::new(catalog, ids));
//! let path = loaders.require("path")?;
//! assert_eq!(path.get_own("sep").to_js_string(), "/");
//! assert_eq!(loaders.module_load_list(), vec!["NativeModule path"]);
//! # Ok::<(), spacey_loaders::LoaderError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod binding;
pub mod compiler;
pub mod config;
pub mod error;
pub mod facade;
pub mod load_log;
pub mod loaders;
pub mod manifest;
pub mod native_module;
pub mod registry;
pub mod require;
pub mod value;

// Re-exports
pub use binding::{
    AllowList, BindingProvider, BindingTable, InternalBindings, LEGACY_BINDINGS, LegacyBindings,
    LinkedBindings,
};
pub use compiler::{CompiledFunction, ModuleCatalog, ModuleCompiler};
pub use config::LoaderConfig;
pub use error::{LoaderError, Result};
pub use facade::{DEFAULT_EXPORT, FacadeStatus, ModuleFacade};
pub use load_log::{LoadKind, LoadLog, LoadLogEntry};
pub use loaders::{LoaderOptions, Loaders};
pub use manifest::{Manifest, ModuleSpec};
pub use native_module::{ModuleState, NativeModule};
pub use registry::NativeModuleRegistry;
pub use require::{InternalBinding, Require, RequireMode};
pub use value::{NativeFunction, ObjectRef, Value};

/// Version of the spacey-loaders crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
