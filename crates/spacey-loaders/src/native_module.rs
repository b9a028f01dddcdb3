// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in module records
//!
//! A [`NativeModule`] is created for every catalog identifier at startup and
//! compiled on first `require`. Compilation runs at most once: a module that
//! requires itself (directly or through a cycle) while it is loading gets the
//! exports object as populated so far.

use crate::config::LoaderConfig;
use crate::error::{LoaderError, Result};
use crate::facade::{DEFAULT_EXPORT, ModuleFacade};
use crate::load_log::LoadKind;
use crate::loaders::Loaders;
use crate::require::{InternalBinding, Require, RequireMode};
use crate::value::{ObjectRef, Value};
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Compilation state of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Not compiled yet, or the last attempt failed
    Unloaded,
    /// Compilation in progress further up the call stack
    Loading,
    /// Compiled and executed successfully
    Loaded,
}

/// A built-in module record
pub struct NativeModule {
    id: String,
    filename: String,
    url: String,
    internal: bool,
    require_mode: RequireMode,
    exports: RefCell<ObjectRef>,
    state: Cell<ModuleState>,
    can_be_required_by_users: Cell<bool>,
    export_keys: RefCell<Option<Vec<String>>>,
    facade: OnceCell<Rc<ModuleFacade>>,
    this: Weak<NativeModule>,
}

impl NativeModule {
    /// Create an unloaded record for `id`
    pub fn new(id: impl Into<String>, config: &LoaderConfig) -> Rc<Self> {
        let id = id.into();
        let internal = config.is_internal(&id);
        let require_mode = if config.is_dependency(&id) {
            RequireMode::FallbackInDeps
        } else {
            RequireMode::Default
        };
        Rc::new_cyclic(|this| Self {
            filename: format!("{}.js", id),
            url: config.url_for(&id),
            internal,
            require_mode,
            exports: RefCell::new(ObjectRef::new()),
            state: Cell::new(ModuleState::Unloaded),
            can_be_required_by_users: Cell::new(!internal),
            export_keys: RefCell::new(None),
            facade: OnceCell::new(),
            this: this.clone(),
            id,
        })
    }

    /// Module identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Synthesized filename, `<id>.js`
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Module URL, e.g. `node:fs`
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current compilation state
    pub fn state(&self) -> ModuleState {
        self.state.get()
    }

    /// Whether compilation has completed
    pub fn is_loaded(&self) -> bool {
        self.state.get() == ModuleState::Loaded
    }

    /// Whether compilation is in progress
    pub fn is_loading(&self) -> bool {
        self.state.get() == ModuleState::Loading
    }

    /// How this module's `require` resolves identifiers
    pub fn require_mode(&self) -> RequireMode {
        self.require_mode
    }

    /// The exports object
    pub fn exports(&self) -> ObjectRef {
        self.exports.borrow().clone()
    }

    /// Replace the exports object (`module.exports = ...`)
    pub fn set_exports(&self, exports: ObjectRef) {
        *self.exports.borrow_mut() = exports;
    }

    /// Whether user land may require this module
    pub fn can_be_required_by_users(&self) -> bool {
        self.can_be_required_by_users.get()
    }

    pub(crate) fn set_can_be_required_by_users(&self, value: bool) {
        self.can_be_required_by_users.set(value);
    }

    /// Names exposed to ESM, once the snapshot has been taken
    pub fn export_keys(&self) -> Option<Vec<String>> {
        self.export_keys.borrow().clone()
    }

    /// The ESM facade, if one has been created
    pub fn facade(&self) -> Option<Rc<ModuleFacade>> {
        self.facade.get().cloned()
    }

    /// Compile and execute the module on first call; return its exports.
    pub fn compile(&self, loaders: &Loaders) -> Result<ObjectRef> {
        match self.state.get() {
            ModuleState::Loaded | ModuleState::Loading => return Ok(self.exports()),
            ModuleState::Unloaded => {}
        }

        self.state.set(ModuleState::Loading);
        tracing::debug!(id = %self.id, "compiling built-in module");

        if let Err(err) = self.execute(loaders) {
            self.state.set(ModuleState::Unloaded);
            tracing::debug!(id = %self.id, error = %err, "built-in module failed to compile");
            return Err(err);
        }

        self.state.set(ModuleState::Loaded);
        loaders.load_log().append(LoadKind::Module, &self.id);
        Ok(self.exports())
    }

    fn execute(&self, loaders: &Loaders) -> Result<()> {
        let function = loaders.compiler().compile_function(&self.id)?;
        let exports = self.exports();
        let require = Require::new(loaders, self.require_mode);
        let internal_binding = InternalBinding::new(loaders.internal_bindings());
        function(
            &exports,
            &require,
            self,
            loaders.process(),
            &internal_binding,
            loaders.primordials(),
        )
    }

    /// Compile for a user-facing loader and return the synced exports.
    ///
    /// Fails with [`LoaderError::AccessDenied`] if users may not require
    /// this module; that is a bug in the caller, not a recoverable state.
    pub fn compile_for_public_loader(&self, loaders: &Loaders) -> Result<ObjectRef> {
        if !self.can_be_required_by_users() {
            return Err(LoaderError::AccessDenied(self.id.clone()));
        }
        self.compile(loaders)?;
        self.snapshot_export_keys();
        self.get_facade()?;
        self.sync_exports()?;
        Ok(self.exports())
    }

    /// Record the names exposed to ESM, once.
    fn snapshot_export_keys(&self) -> Vec<String> {
        if let Some(keys) = self.export_keys.borrow().as_ref() {
            return keys.clone();
        }
        // Named exports of internal modules are not reflected; reading
        // them could trigger getters.
        let keys = if self.internal {
            Vec::new()
        } else {
            self.exports().own_enumerable_keys()
        };
        *self.export_keys.borrow_mut() = Some(keys.clone());
        keys
    }

    /// Return the ESM facade, creating and evaluating it on first use.
    ///
    /// The export names are fixed when the facade is created, taking the
    /// snapshot here if the public loader has not taken it yet.
    pub fn get_facade(&self) -> Result<Rc<ModuleFacade>> {
        let facade = Rc::clone(self.facade.get_or_init(|| Rc::new(self.create_facade())));
        facade.evaluate()?;
        Ok(facade)
    }

    fn create_facade(&self) -> ModuleFacade {
        let mut names = self.snapshot_export_keys();
        names.push(DEFAULT_EXPORT.to_string());
        let this = self.this.clone();
        ModuleFacade::new(
            self.url.clone(),
            names,
            Box::new(move |facade: &ModuleFacade| {
                let Some(module) = this.upgrade() else {
                    return Ok(());
                };
                module.push_named_exports(facade)?;
                facade.set_export(DEFAULT_EXPORT, Value::Object(module.exports()))
            }),
        )
    }

    /// Push the current value of every exposed name into the facade.
    ///
    /// Missing own properties are published as `undefined`. The `default`
    /// binding is re-pointed at the current exports object.
    pub fn sync_exports(&self) -> Result<()> {
        if let Some(facade) = self.facade.get() {
            self.push_named_exports(facade)?;
            facade.set_export(DEFAULT_EXPORT, Value::Object(self.exports()))?;
        }
        Ok(())
    }

    fn push_named_exports(&self, facade: &ModuleFacade) -> Result<()> {
        let exports = self.exports();
        let names = self.export_keys().unwrap_or_default();
        for name in names.iter().filter(|name| *name != DEFAULT_EXPORT) {
            facade.set_export(name, exports.get_own(name))?;
        }
        Ok(())
    }
}

impl fmt::Debug for NativeModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeModule")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("can_be_required_by_users", &self.can_be_required_by_users.get())
            .field("export_keys", &self.export_keys.borrow())
            .finish()
    }
}
