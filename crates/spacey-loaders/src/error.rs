// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the built-in loaders

use thiserror::Error;

/// Result type for loader operations
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Errors that can occur while resolving bindings and built-in modules
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Binding name is not on the legacy allow-list
    #[error("No such module: {0}")]
    NoSuchCapability(String),

    /// Identifier is not registered in the built-in module registry
    #[error("Missing internal module '{0}'")]
    MissingModule(String),

    /// Public loader asked for a module users may not require
    #[error("Should not compile {0} for public use")]
    AccessDenied(String),

    /// The compiler has no unit for this identifier
    #[error("No compiled source for built-in module '{0}'")]
    UnknownModule(String),

    /// The native binding provider does not know this name
    #[error("No such binding: {0}")]
    BindingNotFound(String),

    /// A facade was asked to bind a name it was not created with
    #[error("Export '{name}' is not defined by {url}")]
    UnknownExport {
        /// Facade URL
        url: String,
        /// Requested export name
        name: String,
    },

    /// A compiled unit raised while executing
    #[error("{0}")]
    Thrown(String),

    /// Manifest is structurally invalid
    #[error("Invalid manifest: {0}")]
    Manifest(String),

    /// File system error
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LoaderError {
    /// Create an error raised from inside a compiled unit
    pub fn thrown(msg: impl Into<String>) -> Self {
        Self::Thrown(msg.into())
    }

    /// Create a missing module error
    pub fn missing_module(id: impl Into<String>) -> Self {
        Self::MissingModule(id.into())
    }
}
