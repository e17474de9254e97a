// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! The content object seam: raw provider content parsed into a record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use oaiserve_store_db::{Metadata, RecordSets, SetDescriptor};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::provider::RawContent;

/// A file attached to a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub filename: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub mimetype: String,
    #[serde(default)]
    pub md5: String,
    #[serde(default)]
    pub absolute_uri: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Parsed content, ready to be written to the store.
pub trait ContentObject: Sized {
    /// Parse raw content. `Ok(None)` means the content is skipped on purpose.
    fn from_raw(content_id: &str, raw: RawContent) -> Result<Option<Self>>;

    fn id(&self) -> &str;

    fn modified(&self) -> DateTime<Utc>;

    fn deleted(&self) -> bool;

    /// Sets the record belongs to, with the descriptor each one is declared
    /// with.
    fn sets(&self) -> &RecordSets;

    fn metadata(&self) -> &Metadata;

    fn assets(&self) -> &[Asset];

    /// Some content declares a set instead of a record; such objects are
    /// stored through `add_set` using [`ContentObject::set_descriptor`].
    fn is_set(&self) -> bool {
        false
    }

    fn set_descriptor(&self) -> Option<SetDescriptor> {
        None
    }
}

/// Parse a content timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DDThh:mm:ss` and `YYYY-MM-DD`; values without
/// an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(time.with_timezone(&Utc));
    }
    if let Ok(time) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(time.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|time| time.and_utc())
}
