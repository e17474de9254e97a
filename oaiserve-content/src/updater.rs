// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Batch update of a record store from a content provider.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use oaiserve_store_db::StoreDb;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::object::ContentObject;
use crate::provider::ContentProvider;

/// What to do when a single content item fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMode {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Log the failure, count it and continue with the next item.
    Suppress,
}

/// Outcome of [`DatabaseUpdater::update_database`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    /// Content items known to the provider.
    pub total: usize,
    /// Records and sets handed to the store.
    pub updated: usize,
    /// Items the content object chose to skip.
    pub ignored: usize,
    /// Failures tolerated in [`UpdateMode::Suppress`].
    pub errors: usize,
}

/// Feeds content objects of type `C`, built from the raw content of a
/// provider, into a [`StoreDb`].
pub struct DatabaseUpdater<P, C> {
    provider: P,
    flush_threshold: Option<usize>,
    content: PhantomData<fn() -> C>,
}

impl<P: ContentProvider, C: ContentObject> DatabaseUpdater<P, C> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            flush_threshold: None,
            content: PhantomData,
        }
    }

    /// Flush every `threshold` items instead of once at the end.
    pub fn with_flush_threshold(mut self, threshold: Option<usize>) -> Self {
        self.flush_threshold = threshold.filter(|&n| n > 0);
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Refresh the provider, returning the content ids changed since `from`.
    pub fn update_provider(&mut self, from: Option<DateTime<Utc>>) -> Result<Vec<String>> {
        match from {
            Some(from) => info!("Starting the update of {} from {from}", self.provider.name()),
            None => info!("Starting the update of {}", self.provider.name()),
        }
        let ids = self.provider.update(from)?;
        info!(
            "Updating {} returned {} new/modified objects",
            self.provider.name(),
            ids.len()
        );
        Ok(ids)
    }

    /// Write every known content item to `db`.
    ///
    /// Staged writes are flushed every `flush_threshold` items and always
    /// once at the end.
    pub fn update_database(&self, db: &mut StoreDb, mode: UpdateMode) -> Result<UpdateReport> {
        let content_ids = self.provider.content_ids();
        let mut report = UpdateReport {
            total: self.provider.count(),
            ..UpdateReport::default()
        };
        info!("Updating database with {} objects", report.total);

        for (count, content_id) in content_ids.iter().enumerate() {
            if count > 0 && self.flush_threshold.is_some_and(|n| count % n == 0) {
                tolerate(mode, &mut report, db.flush_update().map_err(Error::from))?;
            }

            let object = match self
                .provider
                .content_by_id(content_id)
                .and_then(|raw| C::from_raw(content_id, raw))
            {
                Ok(Some(object)) => object,
                Ok(None) => {
                    info!("Ignoring {content_id}");
                    report.ignored += 1;
                    continue;
                }
                Err(e) => {
                    tolerate::<()>(mode, &mut report, Err(e))?;
                    continue;
                }
            };

            let stored = store_object(db, &object).map_err(|e| Error::Database {
                id: object.id().to_owned(),
                source: e,
            });
            if tolerate(mode, &mut report, stored)? {
                report.updated += 1;
            }
        }

        tolerate(mode, &mut report, db.flush().map_err(Error::from))?;
        info!(
            "Updated {} of {} objects ({} ignored, {} errors)",
            report.updated, report.total, report.ignored, report.errors
        );
        Ok(report)
    }
}

fn store_object<C: ContentObject>(db: &mut StoreDb, object: &C) -> oaiserve_store_db::Result<()> {
    match object.set_descriptor().filter(|_| object.is_set()) {
        Some(set) => db.ensure_set_exists(object.id(), &set),
        None => db.update_record(
            object.id(),
            object.modified(),
            object.deleted(),
            object.sets(),
            object.metadata(),
        ),
    }
}

/// Apply the error policy: `Ok(true)` on success, `Ok(false)` for a
/// suppressed failure.
fn tolerate<T>(mode: UpdateMode, report: &mut UpdateReport, result: Result<T>) -> Result<bool> {
    match result {
        Ok(_) => Ok(true),
        Err(e) if mode == UpdateMode::Suppress => {
            warn!("{e}");
            report.errors += 1;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
