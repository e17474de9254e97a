// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! The OAI-PMH facade over the record store.
//!
//! Turns verb-level requests into [`OaiQuery`] calls, merging the feed's
//! static set filters with the request's set, and turns records into
//! protocol headers.

use chrono::{DateTime, Duration, Utc};
use oaiserve_store_db::{OaiQuery, OaiSet, Record, StoreDb};
use tracing::debug;

use crate::config::FeedConfig;
use crate::datestamp::GRANULARITY;
use crate::error::{OaiError, Result};
use crate::format::FormatRegistry;

/// Response to `Identify`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identify {
    pub repository_name: String,
    pub base_url: String,
    pub protocol_version: &'static str,
    pub admin_emails: Vec<String>,
    pub earliest_datestamp: DateTime<Utc>,
    pub deleted_record: &'static str,
    pub granularity: &'static str,
}

/// One entry of `ListMetadataFormats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatInfo {
    pub prefix: String,
    pub schema: String,
    pub namespace: String,
}

/// Protocol header of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub identifier: String,
    pub datestamp: DateTime<Utc>,
    pub set_specs: Vec<String>,
    pub deleted: bool,
}

/// Selective harvesting arguments of `ListRecords` and `ListIdentifiers`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListRequest {
    pub metadata_prefix: String,
    pub set: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub cursor: u64,
    /// Defaults to the feed's batch size.
    pub batch_size: Option<i64>,
}

impl ListRequest {
    pub fn new(metadata_prefix: impl Into<String>) -> Self {
        Self {
            metadata_prefix: metadata_prefix.into(),
            ..Self::default()
        }
    }
}

pub struct OaiServer<'a> {
    db: &'a StoreDb,
    config: &'a FeedConfig,
    registry: &'a FormatRegistry,
    now: Option<DateTime<Utc>>,
}

impl<'a> OaiServer<'a> {
    pub fn new(db: &'a StoreDb, config: &'a FeedConfig, registry: &'a FormatRegistry) -> Self {
        Self {
            db,
            config,
            registry,
            now: None,
        }
    }

    /// Pin "now" instead of reading the clock on every request.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn config(&self) -> &FeedConfig {
        self.config
    }

    pub fn registry(&self) -> &FormatRegistry {
        self.registry
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub fn identify(&self) -> Result<Identify> {
        Ok(Identify {
            repository_name: self.config.repository_name.clone(),
            base_url: self.config.base_url.clone(),
            protocol_version: "2.0",
            admin_emails: self.config.admin_emails.clone(),
            earliest_datestamp: self.db.oai_earliest_datestamp_at(self.now())?,
            deleted_record: "transient",
            granularity: GRANULARITY,
        })
    }

    /// Formats of the feed; with an identifier, the record must be served
    /// by the feed.
    pub fn list_metadata_formats(&self, identifier: Option<&str>) -> Result<Vec<FormatInfo>> {
        if let Some(identifier) = identifier {
            self.find_record(identifier)?;
        }
        Ok(self
            .config
            .metadata_prefixes
            .iter()
            .filter_map(|prefix| self.registry.get(prefix))
            .map(|format| FormatInfo {
                prefix: format.prefix().to_owned(),
                schema: format.schema_location().to_owned(),
                namespace: format.namespace().to_owned(),
            })
            .collect())
    }

    pub fn list_sets(&self, cursor: u64, batch_size: i64) -> Result<Vec<OaiSet>> {
        Ok(self.db.oai_sets(cursor, batch_size)?)
    }

    pub fn list_records(&self, request: &ListRequest) -> Result<Vec<(Header, Record)>> {
        self.check_metadata_prefix(&request.metadata_prefix)?;
        self.list_query(request, None)?
            .into_iter()
            .map(|record| Ok((self.header(&record)?, record)))
            .collect()
    }

    pub fn list_identifiers(&self, request: &ListRequest) -> Result<Vec<Header>> {
        self.check_metadata_prefix(&request.metadata_prefix)?;
        self.list_query(request, None)?
            .iter()
            .map(|record| self.header(record))
            .collect()
    }

    /// A single record by OAI identifier.
    ///
    /// Records filtered out by the feed are reported as not existing.
    pub fn get_record(&self, metadata_prefix: &str, identifier: &str) -> Result<(Header, Record)> {
        self.check_metadata_prefix(metadata_prefix)?;
        let record = self.find_record(identifier)?;
        Ok((self.header(&record)?, record))
    }

    fn find_record(&self, identifier: &str) -> Result<Record> {
        let id = self
            .config
            .record_id(identifier)
            .ok_or_else(|| OaiError::IdDoesNotExist(identifier.to_owned()))?;
        let request = ListRequest {
            batch_size: Some(1),
            ..ListRequest::default()
        };
        self.list_query(&request, Some(id))?
            .pop()
            .ok_or_else(|| OaiError::IdDoesNotExist(identifier.to_owned()))
    }

    fn check_metadata_prefix(&self, prefix: &str) -> Result<()> {
        if self.config.disseminates(prefix) && self.registry.contains(prefix) {
            Ok(())
        } else {
            Err(OaiError::CannotDisseminateFormat(prefix.to_owned()))
        }
    }

    fn list_query(&self, request: &ListRequest, identifier: Option<&str>) -> Result<Vec<Record>> {
        let now = self.now();
        let mut query = OaiQuery::new()
            .offset(request.cursor)
            .batch_size(request.batch_size.unwrap_or(self.config.batch_size))
            .needed_sets(self.config.sets_needed.iter().cloned())
            .allowed_sets(self.config.sets_allowed.iter().cloned())
            .disallowed_sets(self.config.sets_disallowed.iter().cloned());
        if let Some(set) = &request.set {
            query = query.needed_set(set.clone());
        }
        if let Some(id) = identifier {
            query = query.identifier(id);
        }
        query.from_date = request.from;
        query.until_date = request.until;

        if self.config.delay > 0 {
            let delay = i64::try_from(self.config.delay)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX);
            let until = query.effective_until(now);
            query.until_date = Some(
                until
                    .checked_sub_signed(delay)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC),
            );
        }

        debug!("Running {query:?}");
        Ok(self.db.oai_query_at(&query, now)?)
    }

    fn header(&self, record: &Record) -> Result<Header> {
        let deleted = record.deleted
            || (!self.config.sets_deleted.is_empty()
                && self
                    .db
                    .get_setrefs(&record.id, true)?
                    .iter()
                    .any(|set| self.config.sets_deleted.contains(set)));
        Ok(Header {
            identifier: self.config.oai_id(&record.id),
            datestamp: record.modified,
            set_specs: record.sets.clone(),
            deleted,
        })
    }
}
