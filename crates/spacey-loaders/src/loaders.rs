// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bootstrap context owning every loader cache
//!
//! [`Loaders`] is created once per realm, before any built-in module runs.
//! It owns the load log, the three binding tiers and the module registry,
//! and it is what `require`, `internalBinding`, `process.binding()` and
//! `process._linkedBinding()` resolve through.

use crate::binding::{BindingProvider, BindingTable, InternalBindings, LegacyBindings, LinkedBindings};
use crate::compiler::ModuleCompiler;
use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::load_log::LoadLog;
use crate::native_module::NativeModule;
use crate::registry::NativeModuleRegistry;
use crate::value::{NativeFunction, ObjectRef, Value};
use std::rc::{Rc, Weak};

/// Everything the loaders need from the embedder
pub struct LoaderOptions {
    /// Loader configuration
    pub config: LoaderConfig,
    /// Identifiers of the built-in module catalog
    pub module_ids: Vec<String>,
    /// Compiler for built-in module sources
    pub compiler: Box<dyn ModuleCompiler>,
    /// Provider behind `internalBinding()`
    pub internal_bindings: Box<dyn BindingProvider>,
    /// Provider behind `process._linkedBinding()`
    pub linked_bindings: Box<dyn BindingProvider>,
    /// The `process` object handed to every module
    pub process: ObjectRef,
    /// The frozen intrinsics namespace handed to every module
    pub primordials: ObjectRef,
}

impl LoaderOptions {
    /// Options with default configuration, no bindings and fresh
    /// `process`/`primordials` objects
    pub fn new<S: Into<String>>(
        compiler: impl ModuleCompiler + 'static,
        module_ids: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            config: LoaderConfig::default(),
            module_ids: module_ids.into_iter().map(Into::into).collect(),
            compiler: Box::new(compiler),
            internal_bindings: Box::new(BindingTable::new()),
            linked_bindings: Box::new(BindingTable::new()),
            process: ObjectRef::new(),
            primordials: ObjectRef::new(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the internal binding provider
    pub fn with_internal_bindings(mut self, provider: impl BindingProvider + 'static) -> Self {
        self.internal_bindings = Box::new(provider);
        self
    }

    /// Replace the linked binding provider
    pub fn with_linked_bindings(mut self, provider: impl BindingProvider + 'static) -> Self {
        self.linked_bindings = Box::new(provider);
        self
    }

    /// Replace the `process` object
    pub fn with_process(mut self, process: ObjectRef) -> Self {
        self.process = process;
        self
    }

    /// Replace the primordials namespace
    pub fn with_primordials(mut self, primordials: ObjectRef) -> Self {
        self.primordials = primordials;
        self
    }
}

/// The built-in loaders of one realm
pub struct Loaders {
    config: LoaderConfig,
    log: LoadLog,
    internal: Rc<InternalBindings>,
    linked: LinkedBindings,
    legacy: LegacyBindings,
    registry: NativeModuleRegistry,
    compiler: Box<dyn ModuleCompiler>,
    process: ObjectRef,
    primordials: ObjectRef,
    exports: ObjectRef,
}

impl Loaders {
    /// Build the loaders, populate the registry and wire `process`.
    pub fn bootstrap(options: LoaderOptions) -> Rc<Self> {
        let LoaderOptions {
            config,
            module_ids,
            compiler,
            internal_bindings,
            linked_bindings,
            process,
            primordials,
        } = options;

        let log = LoadLog::new();
        let internal = Rc::new(InternalBindings::new(internal_bindings, log.clone()));
        let legacy = LegacyBindings::new(config.allow_list(), Rc::clone(&internal));
        let registry = NativeModuleRegistry::populate(module_ids, &config);

        let loaders = Rc::new_cyclic(|this: &Weak<Loaders>| {
            install_process_methods(&process, this);
            Self {
                exports: loader_exports(this),
                linked: LinkedBindings::new(linked_bindings),
                config,
                log,
                internal,
                legacy,
                registry,
                compiler,
                process,
                primordials,
            }
        });

        if loaders.config.expose_internals {
            loaders.expose_internals();
        }
        tracing::debug!(modules = loaders.registry.len(), "loaders bootstrapped");
        loaders
    }

    /// `process.binding(name)`
    pub fn binding(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        self.legacy.resolve(name)
    }

    /// `process._linkedBinding(name)`
    pub fn linked_binding(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        self.linked.resolve(name)
    }

    /// `internalBinding(name)`. Not for user land.
    pub fn internal_binding(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        self.internal.resolve(name)
    }

    /// `require(id)` as seen by built-in modules
    pub fn require(&self, id: &str) -> Result<ObjectRef> {
        if id == self.config.loader_id {
            return Ok(self.exports.clone());
        }
        match self.registry.get(id) {
            Some(module) => module.compile(self),
            None => Err(LoaderError::missing_module(id)),
        }
    }

    /// `require(id)` for vendored dependencies: identifiers unknown to the
    /// registry are retried under the dependency namespace.
    pub fn require_with_fallback_in_deps(&self, id: &str) -> Result<ObjectRef> {
        if self.registry.exists(id) {
            return self.require(id);
        }
        let fallback = format!("{}{}", self.config.deps_prefix, id);
        tracing::trace!(id, fallback = %fallback, "require falling back to deps");
        self.require(&fallback)
    }

    /// Compile `id` for a user-facing module loader
    pub fn compile_for_public_loader(&self, id: &str) -> Result<ObjectRef> {
        if id == self.config.loader_id {
            return Err(LoaderError::AccessDenied(id.to_string()));
        }
        match self.registry.get(id) {
            Some(module) => module.compile_for_public_loader(self),
            None => Err(LoaderError::missing_module(id)),
        }
    }

    /// `--expose-internals`: let user land require every built-in module
    /// except the loaders themselves
    pub fn expose_internals(&self) {
        self.registry.expose_internals(&self.config.loader_id);
    }

    /// Whether `id` is a registered built-in module
    pub fn exists(&self, id: &str) -> bool {
        self.registry.exists(id)
    }

    /// Whether user land may require `id`
    pub fn can_be_required_by_users(&self, id: &str) -> bool {
        self.registry.can_be_required_by_users(id)
    }

    /// The record for `id`
    pub fn module(&self, id: &str) -> Option<Rc<NativeModule>> {
        self.registry.get(id).cloned()
    }

    /// The module registry
    pub fn registry(&self) -> &NativeModuleRegistry {
        &self.registry
    }

    /// `process.moduleLoadList`
    pub fn module_load_list(&self) -> Vec<String> {
        self.log.to_strings()
    }

    /// Read handle on the load log
    pub fn load_log(&self) -> &LoadLog {
        &self.log
    }

    /// What `require('internal/bootstrap/loaders')` returns
    pub fn loader_exports(&self) -> &ObjectRef {
        &self.exports
    }

    /// The `process` object
    pub fn process(&self) -> &ObjectRef {
        &self.process
    }

    /// The primordials namespace
    pub fn primordials(&self) -> &ObjectRef {
        &self.primordials
    }

    /// Loader configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub(crate) fn compiler(&self) -> &dyn ModuleCompiler {
        self.compiler.as_ref()
    }

    pub(crate) fn internal_bindings(&self) -> &InternalBindings {
        &self.internal
    }
}

fn first_arg(args: &[Value]) -> Value {
    args.first().cloned().unwrap_or_default()
}

/// Native function that calls back into the loaders
fn loader_fn(
    this: &Weak<Loaders>,
    name: &str,
    body: impl Fn(&Loaders, &[Value]) -> Result<Value> + 'static,
) -> NativeFunction {
    let this = this.clone();
    NativeFunction::new(name, move |args| {
        let loaders = this
            .upgrade()
            .ok_or_else(|| LoaderError::thrown("built-in loaders are no longer alive"))?;
        body(&loaders, args)
    })
}

fn install_process_methods(process: &ObjectRef, this: &Weak<Loaders>) {
    process.set(
        "binding",
        loader_fn(this, "binding", |loaders, args| {
            loaders.binding(first_arg(args)).map(Value::Object)
        }),
    );
    process.set(
        "_linkedBinding",
        loader_fn(this, "_linkedBinding", |loaders, args| {
            loaders.linked_binding(first_arg(args)).map(Value::Object)
        }),
    );
}

fn loader_exports(this: &Weak<Loaders>) -> ObjectRef {
    let native_module = ObjectRef::new();
    native_module.set(
        "exists",
        loader_fn(this, "exists", |loaders, args| {
            Ok(Value::Boolean(loaders.exists(&first_arg(args).to_js_string())))
        }),
    );
    native_module.set(
        "canBeRequiredByUsers",
        loader_fn(this, "canBeRequiredByUsers", |loaders, args| {
            Ok(Value::Boolean(
                loaders.can_be_required_by_users(&first_arg(args).to_js_string()),
            ))
        }),
    );
    native_module.set(
        "exposeInternals",
        loader_fn(this, "exposeInternals", |loaders, _| {
            loaders.expose_internals();
            Ok(Value::Undefined)
        }),
    );

    let exports = ObjectRef::new();
    exports.set(
        "internalBinding",
        loader_fn(this, "internalBinding", |loaders, args| {
            loaders.internal_binding(first_arg(args)).map(Value::Object)
        }),
    );
    exports.set("NativeModule", native_module);
    exports.set(
        "require",
        loader_fn(this, "require", |loaders, args| {
            loaders.require(&first_arg(args).to_js_string()).map(Value::Object)
        }),
    );
    exports
}
