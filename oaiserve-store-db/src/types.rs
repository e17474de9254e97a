// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Record and set types.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single scalar metadata value (string, number or boolean).
pub type MetadataValue = serde_json::Value;

/// Generic pre-serialization record body: field name -> list of scalars.
pub type Metadata = BTreeMap<String, Vec<MetadataValue>>;

/// Set memberships of a record as handed to `update_record`.
pub type RecordSets = BTreeMap<String, SetDescriptor>;

/// Descriptor of a set, as declared by a record or by `add_set`.
///
/// A descriptor built with [`SetDescriptor::reference`] only names the set:
/// it creates the set when missing and never overwrites a stored
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(skip)]
    pub(crate) reference: bool,
}

impl SetDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            hidden: false,
            reference: false,
        }
    }

    /// A bare membership in `set_id`, named after its id if it has to be
    /// created.
    pub fn reference(set_id: impl Into<String>) -> Self {
        Self {
            reference: true,
            ..Self::new(set_id)
        }
    }

    pub fn is_reference(&self) -> bool {
        self.reference
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark the set hidden: it still filters, but is never listed.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A stored record.
///
/// `sets` only lists sets that are not hidden, sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: String,
    pub modified: DateTime<Utc>,
    pub deleted: bool,
    pub sets: Vec<String>,
    pub metadata: Metadata,
}

impl Record {
    /// Values of a metadata field, empty if the field is absent.
    pub fn values(&self, field: &str) -> &[MetadataValue] {
        self.metadata.get(field).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A stored set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub hidden: bool,
}

/// A set as exposed through `ListSets`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiSet {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Convert a unix timestamp (seconds) to a UTC datetime.
pub(crate) fn unix_to_datetime(timestamp: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Convert a UTC datetime to a unix timestamp, dropping sub-second precision.
pub(crate) fn datetime_to_unix(time: DateTime<Utc>) -> i64 {
    time.timestamp()
}
