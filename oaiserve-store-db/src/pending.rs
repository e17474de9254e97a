// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Write cache between `update_record` and `flush`.

use std::collections::{BTreeMap, BTreeSet};

use rusqlite::{Connection, params};

use crate::error::Result;
use crate::types::SetDescriptor;

/// A record waiting to be committed.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingRecord {
    pub(crate) modified: i64,
    pub(crate) deleted: bool,
    pub(crate) data: String,
    pub(crate) sets: BTreeSet<String>,
}

/// Number of rows written by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushStats {
    pub records: usize,
    pub sets: usize,
    pub setrefs: usize,
}

/// Buffered record and set writes, keyed by id (last write wins).
///
/// Nothing in here is visible to queries until [`PendingWriteSet::commit`].
#[derive(Debug, Default)]
pub struct PendingWriteSet {
    records: BTreeMap<String, PendingRecord>,
    sets: BTreeMap<String, SetDescriptor>,
}

impl PendingWriteSet {
    pub(crate) fn stage_record(&mut self, id: &str, record: PendingRecord) {
        self.records.insert(id.to_owned(), record);
    }

    /// A reference never replaces a staged declaration.
    pub(crate) fn stage_set(&mut self, id: &str, descriptor: SetDescriptor) {
        if descriptor.is_reference() && self.sets.contains_key(id) {
            return;
        }
        self.sets.insert(id.to_owned(), descriptor);
    }

    /// True if neither records nor sets are staged.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.sets.is_empty()
    }

    /// Number of staged records.
    pub fn record_len(&self) -> usize {
        self.records.len()
    }

    /// Number of staged set descriptors.
    pub fn set_len(&self) -> usize {
        self.sets.len()
    }

    /// Drop everything staged without writing it.
    pub fn clear(&mut self) {
        self.records.clear();
        self.sets.clear();
    }

    /// Write all staged rows in a single transaction.
    ///
    /// The cache is emptied before writing, so a failed commit leaves the
    /// database untouched and the batch dropped.
    pub(crate) fn commit(&mut self, conn: &mut Connection) -> Result<FlushStats> {
        let records = std::mem::take(&mut self.records);
        let sets = std::mem::take(&mut self.sets);
        let mut stats = FlushStats::default();

        let tx = conn.transaction()?;
        {
            // Sets are upserted rather than replaced: deleting the row would
            // cascade into references held by records outside this batch.
            let mut upsert_set = tx.prepare_cached(
                r#"
                INSERT INTO sets (set_id, name, description, hidden)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(set_id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    hidden = excluded.hidden
                "#,
            )?;
            let mut reference_set = tx.prepare_cached(
                r#"
                INSERT INTO sets (set_id, name, description, hidden)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(set_id) DO NOTHING
                "#,
            )?;
            for (set_id, descriptor) in &sets {
                let statement = if descriptor.is_reference() {
                    &mut reference_set
                } else {
                    &mut upsert_set
                };
                stats.sets += statement.execute(params![
                    set_id,
                    descriptor.name,
                    descriptor.description,
                    descriptor.hidden,
                ])?;
            }

            // Delete-then-insert; the delete cascades into the old setrefs.
            let mut delete_record =
                tx.prepare_cached("DELETE FROM records WHERE record_id = ?1")?;
            let mut insert_record = tx.prepare_cached(
                "INSERT INTO records (record_id, modified, deleted, data) VALUES (?1, ?2, ?3, ?4)",
            )?;
            let mut insert_setref =
                tx.prepare_cached("INSERT INTO setrefs (record_id, set_id) VALUES (?1, ?2)")?;
            for (record_id, record) in &records {
                delete_record.execute(params![record_id])?;
                insert_record.execute(params![
                    record_id,
                    record.modified,
                    record.deleted,
                    record.data,
                ])?;
                stats.records += 1;
                for set_id in &record.sets {
                    insert_setref.execute(params![record_id, set_id])?;
                    stats.setrefs += 1;
                }
            }
        }
        tx.commit()?;
        Ok(stats)
    }
}
