// Copyright 2025 Schelling Point Labs Inc
// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for the configuration form engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for form engine operations
pub type Result<T> = std::result::Result<T, FormError>;

/// Errors surfaced by the form engine.
///
/// Malformed documents and schemas degrade to defaults inside the engine;
/// these variants only reach callers from the strict entry points and from
/// the store seam.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Schema decoding failed at '{path}': {message}")]
    SchemaDecode { path: String, message: String },

    #[error("Schema document is invalid:\n  - {0}")]
    SchemaInvalid(String),

    #[error("Invalid field path '{input}': {reason} (at byte {position})")]
    Path {
        input: String,
        position: usize,
        reason: &'static str,
    },

    #[error("Config document must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("Value at '{path}' has the wrong shape: {message}")]
    Extract { path: String, message: String },

    #[error("Config store error: {0}")]
    Store(String),
}

impl FormError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FormError::Io {
            path: path.into(),
            source,
        }
    }
}
