// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use oaiserve_store_db::StoreDb;
use tracing::{debug, warn};

use crate::config::FeedConfig;
use crate::error::{FeedConfigError, OaiError, Result};
use crate::format::{FormatRegistry, MetadataFormat};
use crate::request::OaiRequest;
use crate::response::{Payload, render, render_error};
use crate::server::OaiServer;

/// A configured feed: the single `handle_request` entry point used by
/// transports.
#[derive(Debug, Clone)]
pub struct Feed {
    config: FeedConfig,
    registry: FormatRegistry,
}

impl Feed {
    /// Validate `config` against `registry` and build the feed.
    pub fn new(
        config: FeedConfig,
        registry: FormatRegistry,
    ) -> std::result::Result<Self, FeedConfigError> {
        config.validate(&registry)?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    pub fn server<'a>(&'a self, db: &'a StoreDb) -> OaiServer<'a> {
        OaiServer::new(db, &self.config, &self.registry)
    }

    /// Answer one request with an OAI-PMH XML document.
    ///
    /// Protocol errors are part of the document; only storage failures are
    /// returned as `Err`.
    pub fn handle_request(&self, db: &StoreDb, params: &[(String, String)]) -> Result<String> {
        self.handle_request_at(db, params, Utc::now())
    }

    pub fn handle_request_at(
        &self,
        db: &StoreDb,
        params: &[(String, String)],
        now: DateTime<Utc>,
    ) -> Result<String> {
        let base_url = &self.config.base_url;
        let request = match OaiRequest::parse(params) {
            Ok(request) => request,
            Err(e) => {
                debug!("Rejected request {params:?}: {e}");
                return Ok(render_error(now, base_url, params, &e));
            }
        };

        let server = self.server(db).at(now);
        match self.payload(&server, &request) {
            Ok(payload) => Ok(render(now, base_url, &request, params, &payload)),
            Err(OaiError::Store(e)) => {
                warn!("{} failed: {e}", request.verb());
                Err(OaiError::Store(e))
            }
            Err(e) => {
                debug!(
                    "{} answered with {}: {e}",
                    request.verb(),
                    e.code().unwrap_or_default()
                );
                Ok(render_error(now, base_url, params, &e))
            }
        }
    }

    fn payload(&self, server: &OaiServer<'_>, request: &OaiRequest) -> Result<Payload<'_>> {
        Ok(match request {
            OaiRequest::Identify => Payload::Identify(server.identify()?),
            OaiRequest::ListMetadataFormats { identifier } => {
                Payload::ListMetadataFormats(server.list_metadata_formats(identifier.as_deref())?)
            }
            OaiRequest::ListSets => {
                let sets = server.list_sets(0, self.config.batch_size)?;
                if sets.is_empty() {
                    return Err(OaiError::NoSetHierarchy);
                }
                Payload::ListSets(sets)
            }
            OaiRequest::ListIdentifiers(list) => {
                let headers = server.list_identifiers(list)?;
                if headers.is_empty() {
                    return Err(OaiError::NoRecordsMatch);
                }
                Payload::ListIdentifiers(headers)
            }
            OaiRequest::ListRecords(list) => {
                let records = server.list_records(list)?;
                if records.is_empty() {
                    return Err(OaiError::NoRecordsMatch);
                }
                Payload::ListRecords {
                    records,
                    format: self.format(&list.metadata_prefix)?,
                }
            }
            OaiRequest::GetRecord {
                metadata_prefix,
                identifier,
            } => Payload::GetRecord {
                record: server.get_record(metadata_prefix, identifier)?,
                format: self.format(metadata_prefix)?,
            },
        })
    }

    fn format(&self, prefix: &str) -> Result<&dyn MetadataFormat> {
        self.registry
            .get(prefix)
            .map(|format| format.as_ref())
            .ok_or_else(|| OaiError::CannotDisseminateFormat(prefix.to_owned()))
    }
}
