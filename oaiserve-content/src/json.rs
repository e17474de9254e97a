// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Content object for JSON documents.
//!
//! A record document looks like
//!
//! ```json
//! {
//!   "id": "id:1",
//!   "modified": "2008-01-01T14:30:00Z",
//!   "deleted": false,
//!   "sets": {"publications": {"name": "Publications", "hidden": false}},
//!   "metadata": {"title": "A title", "creator": ["Doe, J.", "Roe, R."]},
//!   "assets": [{"filename": "a.pdf", "mimetype": "application/pdf"}]
//! }
//! ```
//!
//! `sets` may also be a plain list of set ids. Those only reference their
//! sets: a missing set is created with its id as name, an existing
//! declaration is left alone. A document with `"is_set": true` declares a set
//! (`id`, `name`, `description`, `hidden`) instead of a record.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use oaiserve_store_db::{Metadata, MetadataValue, RecordSets, SetDescriptor};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::object::{Asset, ContentObject, parse_timestamp};
use crate::provider::RawContent;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonSets {
    List(Vec<String>),
    Map(BTreeMap<String, SetDescriptor>),
}

impl Default for JsonSets {
    fn default() -> Self {
        JsonSets::List(Vec::new())
    }
}

impl From<JsonSets> for RecordSets {
    fn from(sets: JsonSets) -> Self {
        match sets {
            JsonSets::List(ids) => ids
                .into_iter()
                .map(|id| {
                    let descriptor = SetDescriptor::reference(id.clone());
                    (id, descriptor)
                })
                .collect(),
            JsonSets::Map(sets) => sets,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<MetadataValue>),
    One(MetadataValue),
}

impl From<OneOrMany> for Vec<MetadataValue> {
    fn from(values: OneOrMany) -> Self {
        match values {
            OneOrMany::Many(values) => values,
            OneOrMany::One(value) => vec![value],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct JsonDocument {
    id: String,
    #[serde(default)]
    modified: Option<String>,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    is_set: bool,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    sets: JsonSets,
    #[serde(default)]
    metadata: BTreeMap<String, OneOrMany>,
    #[serde(default)]
    assets: Vec<Asset>,
}

/// A record (or set declaration) parsed from a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonContentObject {
    id: String,
    modified: DateTime<Utc>,
    deleted: bool,
    sets: RecordSets,
    metadata: Metadata,
    assets: Vec<Asset>,
    set: Option<SetDescriptor>,
}

impl JsonContentObject {
    /// Build from a decoded document. `fallback_modified` is used when the
    /// document has no `modified` key.
    pub fn from_value(
        content_id: &str,
        value: serde_json::Value,
        fallback_modified: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let document: JsonDocument =
            serde_json::from_value(value).map_err(|e| Error::Json {
                id: content_id.to_owned(),
                source: e,
            })?;
        if document.id.is_empty() {
            return Err(Error::content(content_id, "id must not be empty"));
        }

        let modified = match &document.modified {
            Some(text) => parse_timestamp(text).ok_or_else(|| {
                Error::content(&document.id, format!("unreadable modified date '{text}'"))
            })?,
            None if document.is_set => DateTime::<Utc>::UNIX_EPOCH,
            None => fallback_modified
                .ok_or_else(|| Error::content(&document.id, "modified date is missing"))?,
        };

        let set = document.is_set.then(|| {
            let mut set = SetDescriptor::new(document.name.as_deref().unwrap_or(&document.id));
            set.description = document.description.clone();
            set.hidden = document.hidden;
            set
        });

        Ok(Self {
            id: document.id,
            modified,
            deleted: document.deleted,
            sets: document.sets.into(),
            metadata: document
                .metadata
                .into_iter()
                .map(|(field, values)| (field, values.into()))
                .collect(),
            assets: document.assets,
            set,
        })
    }

    fn from_file(content_id: &str, path: &Path) -> Result<Self> {
        let io_error = |source| Error::Io {
            path: path.to_owned(),
            source,
        };
        let text = fs::read_to_string(path).map_err(io_error)?;
        let mtime = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .map_err(io_error)?;
        let value = serde_json::from_str(&text).map_err(|e| Error::Json {
            id: content_id.to_owned(),
            source: e,
        })?;
        Self::from_value(content_id, value, Some(DateTime::<Utc>::from(mtime)))
    }
}

impl ContentObject for JsonContentObject {
    fn from_raw(content_id: &str, raw: RawContent) -> Result<Option<Self>> {
        let object = match raw {
            RawContent::Value(value) => Self::from_value(content_id, value, None)?,
            RawContent::File(path) => Self::from_file(content_id, &path)?,
        };
        Ok(Some(object))
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    fn deleted(&self) -> bool {
        self.deleted
    }

    fn sets(&self) -> &RecordSets {
        &self.sets
    }

    fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    fn assets(&self) -> &[Asset] {
        &self.assets
    }

    fn is_set(&self) -> bool {
        self.set.is_some()
    }

    fn set_descriptor(&self) -> Option<SetDescriptor> {
        self.set.clone()
    }
}
