// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Write operations for the record store.
//!
//! `update_record` and `add_set` only stage; `flush` is the single point at
//! which staged writes become visible. Removals are immediate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::params;
use tracing::debug;

use crate::connection::StoreDb;
use crate::error::{Error, Result};
use crate::pending::{FlushStats, PendingRecord, PendingWriteSet};
use crate::types::{Metadata, MetadataValue, RecordSets, SetDescriptor, datetime_to_unix};

impl StoreDb {
    /// Stage a full record for the next flush, replacing any staged or
    /// stored version with the same id.
    ///
    /// Every set in `sets` is declared through [`StoreDb::ensure_set_exists`],
    /// so sets referenced before being declared are created on the fly.
    pub fn update_record(
        &mut self,
        id: &str,
        modified: DateTime<Utc>,
        deleted: bool,
        sets: &RecordSets,
        metadata: &Metadata,
    ) -> Result<()> {
        if id.is_empty() {
            return Err(Error::validation(id, "record id must not be empty"));
        }
        validate_metadata(id, metadata)?;
        for set_id in sets.keys() {
            if set_id.is_empty() {
                return Err(Error::validation(id, "set ids must not be empty"));
            }
        }

        let data = serde_json::to_string(metadata).map_err(|e| Error::Metadata {
            id: id.to_owned(),
            source: e,
        })?;

        for (set_id, descriptor) in sets {
            self.ensure_set_exists(set_id, descriptor)?;
        }
        self.pending.stage_record(
            id,
            PendingRecord {
                modified: datetime_to_unix(modified),
                deleted,
                data,
                sets: sets.keys().cloned().collect::<BTreeSet<_>>(),
            },
        );
        Ok(())
    }

    /// Stage a set descriptor so the set exists after the next flush.
    ///
    /// An existing set keeps its record references; only name, description
    /// and hidden flag are replaced. A [`SetDescriptor::reference`] replaces
    /// nothing and only creates the set if it is missing.
    pub fn ensure_set_exists(&mut self, set_id: &str, descriptor: &SetDescriptor) -> Result<()> {
        if set_id.is_empty() {
            return Err(Error::validation(set_id, "set id must not be empty"));
        }
        self.pending.stage_set(set_id, descriptor.clone());
        Ok(())
    }

    /// Declare a set explicitly.
    pub fn add_set(
        &mut self,
        set_id: &str,
        name: &str,
        description: Option<&str>,
        hidden: bool,
    ) -> Result<()> {
        self.ensure_set_exists(
            set_id,
            &SetDescriptor {
                description: description.map(str::to_owned),
                hidden,
                ..SetDescriptor::new(name)
            },
        )
    }

    /// Commit every staged write atomically and clear the write cache.
    pub fn flush(&mut self) -> Result<FlushStats> {
        if self.pending.is_empty() {
            return Ok(FlushStats::default());
        }
        let stats = self.pending.commit(&mut self.conn)?;
        debug!(
            "Flushed {} records, {} sets, {} set references",
            stats.records, stats.sets, stats.setrefs
        );
        Ok(stats)
    }

    /// Alias of [`StoreDb::flush`], called by batch updaters.
    pub fn flush_update(&mut self) -> Result<FlushStats> {
        self.flush()
    }

    /// True if writes are staged but not yet flushed.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &PendingWriteSet {
        &self.pending
    }

    /// Drop staged writes without committing them.
    pub fn discard_pending(&mut self) {
        self.pending.clear();
    }

    /// Delete a record immediately, together with its set references.
    pub fn remove_record(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM records WHERE record_id = ?1", params![id])?;
        Ok(rows > 0)
    }

    /// Delete a set immediately.
    ///
    /// This cascades into every record -> set reference to it, but the
    /// records themselves are kept.
    pub fn remove_set(&self, set_id: &str) -> Result<bool> {
        let rows = self
            .conn
            .execute("DELETE FROM sets WHERE set_id = ?1", params![set_id])?;
        Ok(rows > 0)
    }

    /// Delete all records, sets and references, keeping the schema.
    ///
    /// Staged writes are discarded too.
    pub fn empty_database(&mut self) -> Result<()> {
        self.pending.clear();
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            r#"
            DELETE FROM setrefs;
            DELETE FROM records;
            DELETE FROM sets;
            "#,
        )?;
        tx.commit()?;
        debug!("Emptied database");
        Ok(())
    }
}

fn validate_metadata(id: &str, metadata: &Metadata) -> Result<()> {
    for (field, values) in metadata {
        if field.is_empty() {
            return Err(Error::validation(id, "metadata field names must not be empty"));
        }
        if let Some(value) = values.iter().find(|v| !is_scalar(v)) {
            return Err(Error::validation(
                id,
                format!("metadata field '{field}' holds a non-scalar value: {value}"),
            ));
        }
    }
    Ok(())
}

fn is_scalar(value: &MetadataValue) -> bool {
    matches!(
        value,
        MetadataValue::String(_) | MetadataValue::Number(_) | MetadataValue::Bool(_)
    )
}
