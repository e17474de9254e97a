// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Point lookups, set membership and counts.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::connection::StoreDb;
use crate::error::{Error, Result};
use crate::types::{Metadata, OaiSet, Record, SetInfo, datetime_to_unix, unix_to_datetime};

impl StoreDb {
    /// Query a record by id.
    ///
    /// Returns `None` if the record has not been flushed. `sets` holds the
    /// visible (non-hidden) sets only.
    pub fn get_record(&self, id: &str) -> Result<Option<Record>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT record_id, modified, deleted, data
            FROM records
            WHERE record_id = ?1
            "#,
        )?;

        let row = stmt
            .query_row(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .optional()?;

        match row {
            Some((id, modified, deleted, data)) => {
                Ok(Some(self.build_record(id, modified, deleted, &data)?))
            }
            None => Ok(None),
        }
    }

    /// Query a set by id. Hidden sets are returned too.
    pub fn get_set(&self, set_id: &str) -> Result<Option<SetInfo>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT set_id, name, description, hidden
            FROM sets
            WHERE set_id = ?1
            "#,
        )?;

        let info = stmt
            .query_row(params![set_id], |row| {
                Ok(SetInfo {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    hidden: row.get(3)?,
                })
            })
            .optional()?;
        Ok(info)
    }

    /// Sorted ids of the sets a record belongs to.
    ///
    /// Hidden sets are left out unless `include_hidden_sets` is set.
    pub fn get_setrefs(&self, id: &str, include_hidden_sets: bool) -> Result<Vec<String>> {
        let sql = if include_hidden_sets {
            r#"
            SELECT set_id FROM setrefs
            WHERE record_id = ?1
            ORDER BY set_id
            "#
        } else {
            r#"
            SELECT r.set_id
            FROM setrefs r
            JOIN sets s ON s.set_id = r.set_id
            WHERE r.record_id = ?1 AND s.hidden = 0
            ORDER BY r.set_id
            "#
        };
        let mut stmt = self.conn.prepare_cached(sql)?;

        let mut set_ids = Vec::new();
        let mut rows = stmt.query(params![id])?;
        while let Some(row) = rows.next()? {
            set_ids.push(row.get(0)?);
        }
        Ok(set_ids)
    }

    /// One page of the public (non-hidden) sets, ordered by id.
    pub fn oai_sets(&self, offset: u64, batch_size: i64) -> Result<Vec<OaiSet>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT set_id, name, description
            FROM sets
            WHERE hidden = 0
            ORDER BY set_id
            LIMIT ?1 OFFSET ?2
            "#,
        )?;

        let mut sets = Vec::new();
        let mut rows = stmt.query(params![batch_size.max(0), to_sql_offset(offset)])?;
        while let Some(row) = rows.next()? {
            sets.push(OaiSet {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            });
        }
        Ok(sets)
    }

    /// Count the number of flushed records.
    pub fn record_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Count the number of flushed sets, hidden ones included.
    pub fn set_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sets", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Oldest `modified` timestamp of a harvestable record, or the unix
    /// epoch if there is none.
    pub fn oai_earliest_datestamp(&self) -> Result<DateTime<Utc>> {
        self.oai_earliest_datestamp_at(Utc::now())
    }

    /// Like [`StoreDb::oai_earliest_datestamp`], ignoring records dated
    /// after `now`.
    pub fn oai_earliest_datestamp_at(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let earliest: Option<i64> = self.conn.query_row(
            "SELECT MIN(modified) FROM records WHERE modified <= ?1",
            params![datetime_to_unix(now)],
            |row| row.get(0),
        )?;
        Ok(earliest.map_or(DateTime::<Utc>::UNIX_EPOCH, unix_to_datetime))
    }

    pub(crate) fn build_record(
        &self,
        id: String,
        modified: i64,
        deleted: bool,
        data: &str,
    ) -> Result<Record> {
        let metadata: Metadata = serde_json::from_str(data).map_err(|e| Error::Metadata {
            id: id.clone(),
            source: e,
        })?;
        let sets = self.get_setrefs(&id, false)?;
        Ok(Record {
            id,
            modified: unix_to_datetime(modified),
            deleted,
            sets,
            metadata,
        })
    }
}

pub(crate) fn to_sql_offset(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}
