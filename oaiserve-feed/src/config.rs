// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use serde::Deserialize;

use crate::error::FeedConfigError;
use crate::format::FormatRegistry;

fn default_repository_name() -> String {
    "oaiserve".into()
}

fn default_base_url() -> String {
    "http://localhost:5000/oai".into()
}

fn default_metadata_prefixes() -> Vec<String> {
    vec!["oai_dc".into()]
}

fn default_batch_size() -> i64 {
    100
}

fn default_identifier_prefix() -> String {
    "oai:".into()
}

/// Settings of one OAI-PMH feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    #[serde(default = "default_repository_name")]
    pub repository_name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(default = "default_metadata_prefixes")]
    pub metadata_prefixes: Vec<String>,
    /// Records or sets served per list request.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Prepended to record ids to form OAI identifiers.
    #[serde(default = "default_identifier_prefix")]
    pub identifier_prefix: String,

    /// Records must be in all of these sets.
    #[serde(default)]
    pub sets_needed: BTreeSet<String>,
    /// If non-empty, records must be in one of these sets.
    #[serde(default)]
    pub sets_allowed: BTreeSet<String>,
    /// Records in any of these sets are never served.
    #[serde(default)]
    pub sets_disallowed: BTreeSet<String>,
    /// Records in any of these sets are served as deleted.
    #[serde(default)]
    pub sets_deleted: BTreeSet<String>,

    /// Seconds subtracted from the upper date bound of every request.
    #[serde(default)]
    pub delay: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            repository_name: default_repository_name(),
            base_url: default_base_url(),
            admin_emails: Vec::new(),
            metadata_prefixes: default_metadata_prefixes(),
            batch_size: default_batch_size(),
            identifier_prefix: default_identifier_prefix(),
            sets_needed: BTreeSet::new(),
            sets_allowed: BTreeSet::new(),
            sets_disallowed: BTreeSet::new(),
            sets_deleted: BTreeSet::new(),
            delay: 0,
        }
    }
}

impl FeedConfig {
    /// Check that the feed can be served with `registry`.
    pub fn validate(&self, registry: &FormatRegistry) -> Result<(), FeedConfigError> {
        if self.metadata_prefixes.is_empty() {
            return Err(FeedConfigError::Invalid {
                reason: "metadata_prefixes must not be empty".into(),
            });
        }
        if let Some(prefix) = self
            .metadata_prefixes
            .iter()
            .find(|prefix| !registry.contains(prefix))
        {
            return Err(FeedConfigError::UnregisteredFormat(prefix.clone()));
        }
        if self.batch_size <= 0 {
            return Err(FeedConfigError::Invalid {
                reason: "batch_size must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// OAI identifier of a record id.
    pub fn oai_id(&self, id: &str) -> String {
        format!("{}{id}", self.identifier_prefix)
    }

    /// Record id of an OAI identifier, `None` if it lacks the prefix.
    pub fn record_id<'a>(&self, oai_id: &'a str) -> Option<&'a str> {
        oai_id
            .strip_prefix(self.identifier_prefix.as_str())
            .filter(|id| !id.is_empty())
    }

    pub fn disseminates(&self, prefix: &str) -> bool {
        self.metadata_prefixes.iter().any(|p| p == prefix)
    }
}
