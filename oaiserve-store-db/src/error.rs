// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Error types for record store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during record store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to open database with context
    #[error("Failed to open database at '{path}': {source}")]
    DatabaseOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Database file not found
    #[error("Database not found at: {0}")]
    DatabaseNotFound(PathBuf),

    /// Schema version mismatch
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersionMismatch { expected: i32, found: i32 },

    /// Malformed input handed to `update_record` or `add_set`
    #[error("Invalid record {id}: {reason}")]
    Validation { id: String, reason: String },

    /// Stored metadata body could not be encoded or decoded
    #[error("Metadata of record {id} is not valid JSON: {source}")]
    Metadata {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    pub(crate) fn validation(id: &str, reason: impl Into<String>) -> Self {
        Error::Validation {
            id: id.to_owned(),
            reason: reason.into(),
        }
    }
}
