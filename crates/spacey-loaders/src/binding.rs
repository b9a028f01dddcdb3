// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Native binding loaders
//!
//! Three access tiers sit over the native binding providers:
//!
//! - [`InternalBindings`] - `internalBinding()`, the private loader used by
//!   built-in modules. First resolutions are recorded in the load log.
//! - [`LinkedBindings`] - `process._linkedBinding()`, for bindings supplied by
//!   an embedder. Separate provider, separate cache, never logged.
//! - [`LegacyBindings`] - `process.binding()`, a frozen door into the
//!   internal tier for the names on the [`AllowList`].
//!
//! Every tier coerces the requested name to a string before looking it up.

use crate::error::{LoaderError, Result};
use crate::load_log::{LoadKind, LoadLog};
use crate::value::{ObjectRef, Value};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::rc::Rc;

/// Internal bindings that stay reachable through `process.binding()`
pub const LEGACY_BINDINGS: &[&str] = &[
    "async_wrap",
    "buffer",
    "cares_wrap",
    "config",
    "constants",
    "contextify",
    "crypto",
    "fs",
    "fs_event_wrap",
    "http_parser",
    "icu",
    "inspector",
    "js_stream",
    "natives",
    "os",
    "pipe_wrap",
    "process_wrap",
    "signal_wrap",
    "spawn_sync",
    "stream_wrap",
    "tcp_wrap",
    "tls_wrap",
    "tty_wrap",
    "udp_wrap",
    "url",
    "util",
    "uv",
    "v8",
    "zlib",
];

/// Source of native binding objects
pub trait BindingProvider {
    /// Produce the binding object for `name`
    fn get_binding(&self, name: &str) -> Result<ObjectRef>;
}

type BindingFactory = Rc<dyn Fn() -> ObjectRef>;

fn canonical_name(name: impl Into<Value>) -> String {
    let name: Value = name.into();
    name.to_js_string()
}

/// In-memory binding provider
#[derive(Default, Clone)]
pub struct BindingTable {
    factories: FxHashMap<String, BindingFactory>,
}

impl BindingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory invoked every time the provider is asked for `name`
    pub fn register(&mut self, name: impl Into<String>, factory: impl Fn() -> ObjectRef + 'static) {
        self.factories.insert(name.into(), Rc::new(factory));
    }

    /// Register a binding whose object is produced fresh on each request
    /// from a fixed set of properties
    pub fn register_static<K, V>(&mut self, name: impl Into<String>, entries: Vec<(K, V)>)
    where
        K: Into<String> + Clone + 'static,
        V: Into<Value> + Clone + 'static,
    {
        self.register(name, move || ObjectRef::from_entries(entries.clone()));
    }

    /// Whether `name` is known
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.keys().cloned().collect();
        names.sort();
        names
    }
}

impl BindingProvider for BindingTable {
    fn get_binding(&self, name: &str) -> Result<ObjectRef> {
        match self.factories.get(name) {
            Some(factory) => Ok(factory()),
            None => Err(LoaderError::BindingNotFound(name.to_string())),
        }
    }
}

/// Name-keyed cache shared by the internal and linked tiers
#[derive(Default)]
struct BindingCache {
    objects: RefCell<FxHashMap<String, ObjectRef>>,
}

impl BindingCache {
    /// Returns the binding and whether this call resolved it
    fn get_or_resolve(
        &self,
        name: &str,
        provider: &dyn BindingProvider,
    ) -> Result<(ObjectRef, bool)> {
        if let Some(obj) = self.objects.borrow().get(name) {
            tracing::trace!(name, "binding cache hit");
            return Ok((obj.clone(), false));
        }
        let obj = provider.get_binding(name)?;
        self.objects
            .borrow_mut()
            .insert(name.to_string(), obj.clone());
        Ok((obj, true))
    }

    fn get(&self, name: &str) -> Option<ObjectRef> {
        self.objects.borrow().get(name).cloned()
    }

    fn len(&self) -> usize {
        self.objects.borrow().len()
    }
}

/// `internalBinding()`
pub struct InternalBindings {
    provider: Box<dyn BindingProvider>,
    cache: BindingCache,
    log: LoadLog,
}

impl InternalBindings {
    /// Create the internal tier over `provider`, logging into `log`
    pub fn new(provider: Box<dyn BindingProvider>, log: LoadLog) -> Self {
        Self {
            provider,
            cache: BindingCache::default(),
            log,
        }
    }

    /// Resolve a binding, at most once per name
    pub fn resolve(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        let name = canonical_name(name);
        let (obj, fresh) = self.cache.get_or_resolve(&name, self.provider.as_ref())?;
        if fresh {
            tracing::debug!(name = %name, "internal binding loaded");
            self.log.append(LoadKind::Binding, &name);
        }
        Ok(obj)
    }

    /// The cached binding, without resolving
    pub fn cached(&self, name: &str) -> Option<ObjectRef> {
        self.cache.get(name)
    }

    /// Number of resolved bindings
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether nothing has been resolved
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `process._linkedBinding()`
pub struct LinkedBindings {
    provider: Box<dyn BindingProvider>,
    cache: BindingCache,
}

impl LinkedBindings {
    /// Create the embedder tier over `provider`
    pub fn new(provider: Box<dyn BindingProvider>) -> Self {
        Self {
            provider,
            cache: BindingCache::default(),
        }
    }

    /// Resolve a linked binding, at most once per name
    pub fn resolve(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        let name = canonical_name(name);
        let (obj, fresh) = self.cache.get_or_resolve(&name, self.provider.as_ref())?;
        if fresh {
            tracing::debug!(name = %name, "linked binding loaded");
        }
        Ok(obj)
    }

    /// The cached binding, without resolving
    pub fn cached(&self, name: &str) -> Option<ObjectRef> {
        self.cache.get(name)
    }
}

/// Fixed set of names admitted by `process.binding()`
#[derive(Debug, Clone)]
pub struct AllowList {
    names: FxHashSet<String>,
}

impl AllowList {
    /// Build an allow-list from names
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Membership check
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Number of admitted names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether nothing is admitted
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new(LEGACY_BINDINGS.iter().copied())
    }
}

/// `process.binding()`
pub struct LegacyBindings {
    allow_list: AllowList,
    internal: Rc<InternalBindings>,
}

impl LegacyBindings {
    /// Create the legacy tier in front of `internal`
    pub fn new(allow_list: AllowList, internal: Rc<InternalBindings>) -> Self {
        Self {
            allow_list,
            internal,
        }
    }

    /// Resolve an allow-listed binding through the internal tier
    pub fn resolve(&self, name: impl Into<Value>) -> Result<ObjectRef> {
        let name = canonical_name(name);
        if self.allow_list.contains(&name) {
            return self.internal.resolve(name);
        }
        tracing::debug!(name = %name, "process.binding rejected");
        Err(LoaderError::NoSuchCapability(name))
    }

    /// The allow-list in force
    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }
}
