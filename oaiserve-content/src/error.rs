// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Error types for content acquisition and database updates.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for content operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A provider was asked for an id it never reported.
    #[error("Unknown content id: {0}")]
    UnknownContent(String),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Content {id} is not valid JSON: {source}")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    /// Raw content was readable but does not describe a record.
    #[error("Invalid content {id}: {reason}")]
    Content { id: String, reason: String },

    /// The store rejected a content object.
    #[error("Failed to store record {id}: {source}")]
    Database {
        id: String,
        #[source]
        source: oaiserve_store_db::Error,
    },

    #[error("Store error: {0}")]
    Store(#[from] oaiserve_store_db::Error),
}

impl Error {
    pub(crate) fn content(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Content {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
