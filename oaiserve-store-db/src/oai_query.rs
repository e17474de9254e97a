// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Selective harvesting queries.
//!
//! Filter order: date window, identifier, needed sets (all of), allowed sets
//! (any of), disallowed sets (none of). Disallow is applied last and always
//! wins. Matches are ordered by `modified` descending, then id ascending, so
//! offset paging over an unchanged store neither skips nor repeats records.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rusqlite::params_from_iter;
use rusqlite::types::Value;

use crate::connection::StoreDb;
use crate::error::Result;
use crate::query::to_sql_offset;
use crate::types::{Record, datetime_to_unix};

/// Batch size used when none is given.
pub const DEFAULT_BATCH_SIZE: i64 = 20;

/// Parameters of [`StoreDb::oai_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiQuery {
    /// Number of matching records to skip.
    pub offset: u64,
    /// Maximum number of records to return; zero or negative yields nothing.
    pub batch_size: i64,
    /// A record must belong to every one of these sets.
    pub needed_sets: BTreeSet<String>,
    /// If non-empty, a record must belong to at least one of these sets.
    pub allowed_sets: BTreeSet<String>,
    /// A record belonging to any of these sets is excluded.
    pub disallowed_sets: BTreeSet<String>,
    /// Inclusive lower bound on `modified`.
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `modified`, clamped to "now".
    pub until_date: Option<DateTime<Utc>>,
    /// Restrict to exactly this record id.
    pub identifier: Option<String>,
}

impl Default for OaiQuery {
    fn default() -> Self {
        Self {
            offset: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            needed_sets: BTreeSet::new(),
            allowed_sets: BTreeSet::new(),
            disallowed_sets: BTreeSet::new(),
            from_date: None,
            until_date: None,
            identifier: None,
        }
    }
}

impl OaiQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn needed_set(mut self, set_id: impl Into<String>) -> Self {
        self.needed_sets.insert(set_id.into());
        self
    }

    pub fn needed_sets<I, S>(mut self, set_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.needed_sets.extend(set_ids.into_iter().map(Into::into));
        self
    }

    pub fn allowed_set(mut self, set_id: impl Into<String>) -> Self {
        self.allowed_sets.insert(set_id.into());
        self
    }

    pub fn allowed_sets<I, S>(mut self, set_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_sets.extend(set_ids.into_iter().map(Into::into));
        self
    }

    pub fn disallowed_set(mut self, set_id: impl Into<String>) -> Self {
        self.disallowed_sets.insert(set_id.into());
        self
    }

    pub fn disallowed_sets<I, S>(mut self, set_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.disallowed_sets
            .extend(set_ids.into_iter().map(Into::into));
        self
    }

    pub fn from_date(mut self, from: DateTime<Utc>) -> Self {
        self.from_date = Some(from);
        self
    }

    pub fn until_date(mut self, until: DateTime<Utc>) -> Self {
        self.until_date = Some(until);
        self
    }

    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = Some(id.into());
        self
    }

    /// Effective upper bound: `until_date`, but never later than `now`.
    pub fn effective_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.until_date {
            Some(until) if until <= now => until,
            _ => now,
        }
    }

    /// Render the WHERE/ORDER/LIMIT SQL and its positional arguments.
    fn to_sql(&self, now: DateTime<Utc>) -> (String, Vec<Value>) {
        let mut sql = String::from(
            "SELECT r.record_id, r.modified, r.deleted, r.data FROM records r WHERE r.modified <= ?",
        );
        let mut args = vec![Value::Integer(datetime_to_unix(self.effective_until(now)))];

        if let Some(from) = self.from_date {
            sql.push_str(" AND r.modified >= ?");
            args.push(Value::Integer(datetime_to_unix(from)));
        }

        if let Some(id) = &self.identifier {
            sql.push_str(" AND r.record_id = ?");
            args.push(Value::Text(id.clone()));
        }

        for set_id in &self.needed_sets {
            sql.push_str(
                " AND EXISTS (SELECT 1 FROM setrefs s WHERE s.record_id = r.record_id AND s.set_id = ?)",
            );
            args.push(Value::Text(set_id.clone()));
        }

        if !self.allowed_sets.is_empty() {
            sql.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM setrefs s WHERE s.record_id = r.record_id AND s.set_id IN ({}))",
                placeholders(self.allowed_sets.len())
            ));
            args.extend(self.allowed_sets.iter().cloned().map(Value::Text));
        }

        if !self.disallowed_sets.is_empty() {
            sql.push_str(&format!(
                " AND NOT EXISTS (SELECT 1 FROM setrefs s WHERE s.record_id = r.record_id AND s.set_id IN ({}))",
                placeholders(self.disallowed_sets.len())
            ));
            args.extend(self.disallowed_sets.iter().cloned().map(Value::Text));
        }

        sql.push_str(" ORDER BY r.modified DESC, r.record_id ASC LIMIT ? OFFSET ?");
        args.push(Value::Integer(self.batch_size));
        args.push(Value::Integer(to_sql_offset(self.offset)));

        (sql, args)
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

impl StoreDb {
    /// Run a harvesting query against the wall clock.
    pub fn oai_query(&self, query: &OaiQuery) -> Result<Vec<Record>> {
        self.oai_query_at(query, Utc::now())
    }

    /// Run a harvesting query with an explicit "now".
    ///
    /// Records modified after `now` are embargoed: they never match, even
    /// when asked for by identifier or with a later `until_date`.
    pub fn oai_query_at(&self, query: &OaiQuery, now: DateTime<Utc>) -> Result<Vec<Record>> {
        if query.batch_size <= 0 {
            return Ok(Vec::new());
        }

        // Each match is a single row of `records`; EXISTS never multiplies it.
        let (sql, args) = query.to_sql(now);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, bool>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, modified, deleted, data)| self.build_record(id, modified, deleted, &data))
            .collect()
    }
}
