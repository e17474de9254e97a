// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! OAI-PMH error conditions.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, OaiError>;

/// A protocol error, or a storage failure underneath one.
///
/// Protocol errors are rendered as `<error code="...">` in the response;
/// storage failures are not part of the protocol and surface to the caller.
#[derive(Error, Debug)]
pub enum OaiError {
    #[error("{0}")]
    BadVerb(String),

    #[error("{0}")]
    BadArgument(String),

    #[error("Resumption token {0} is not valid")]
    BadResumptionToken(String),

    #[error("Metadata format {0} is not disseminated by this repository")]
    CannotDisseminateFormat(String),

    #[error("Identifier {0} does not exist")]
    IdDoesNotExist(String),

    #[error("No records match the request")]
    NoRecordsMatch,

    #[error("This repository does not have a set hierarchy")]
    NoSetHierarchy,

    #[error("Store error: {0}")]
    Store(#[from] oaiserve_store_db::Error),
}

impl OaiError {
    /// The OAI-PMH error code, `None` for storage failures.
    pub fn code(&self) -> Option<&'static str> {
        Some(match self {
            OaiError::BadVerb(_) => "badVerb",
            OaiError::BadArgument(_) => "badArgument",
            OaiError::BadResumptionToken(_) => "badResumptionToken",
            OaiError::CannotDisseminateFormat(_) => "cannotDisseminateFormat",
            OaiError::IdDoesNotExist(_) => "idDoesNotExist",
            OaiError::NoRecordsMatch => "noRecordsMatch",
            OaiError::NoSetHierarchy => "noSetHierarchy",
            OaiError::Store(_) => return None,
        })
    }

    pub(crate) fn bad_argument(reason: impl Into<String>) -> Self {
        OaiError::BadArgument(reason.into())
    }
}

/// Feed configuration that cannot be served.
#[derive(Error, Debug)]
pub enum FeedConfigError {
    #[error("Metadata format {0} is configured but not registered")]
    UnregisteredFormat(String),

    #[error("Invalid feed configuration: {reason}")]
    Invalid { reason: String },
}
