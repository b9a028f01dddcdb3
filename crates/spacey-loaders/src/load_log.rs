// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! `process.moduleLoadList` - ordered record of first resolutions

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// What kind of unit was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadKind {
    /// Internal native binding
    Binding,
    /// Built-in source module
    Module,
}

/// One first-resolution event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadLogEntry {
    /// Kind of unit
    pub kind: LoadKind,
    /// Binding name or module identifier
    pub id: String,
}

impl fmt::Display for LoadLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LoadKind::Binding => write!(f, "Internal Binding {}", self.id),
            LoadKind::Module => write!(f, "NativeModule {}", self.id),
        }
    }
}

/// Append-only load log.
///
/// Clones share the same underlying sequence. Only the loaders append to it;
/// everybody else gets read access.
#[derive(Debug, Clone, Default)]
pub struct LoadLog {
    entries: Rc<RefCell<Vec<LoadLogEntry>>>,
}

impl LoadLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn append(&self, kind: LoadKind, id: &str) {
        tracing::trace!(?kind, id, "load log append");
        self.entries.borrow_mut().push(LoadLogEntry {
            kind,
            id: id.to_string(),
        });
    }

    /// Copy of the entries in resolution order
    pub fn snapshot(&self) -> Vec<LoadLogEntry> {
        self.entries.borrow().clone()
    }

    /// Entries rendered as `process.moduleLoadList` strings
    pub fn to_strings(&self) -> Vec<String> {
        self.entries.borrow().iter().map(ToString::to_string).collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Count the entries recorded for `id` of the given kind
    pub fn count(&self, kind: LoadKind, id: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|entry| entry.kind == kind && entry.id == id)
            .count()
    }
}
