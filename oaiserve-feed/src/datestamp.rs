// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! OAI-PMH UTC datestamps.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Granularity advertised in `Identify`.
pub const GRANULARITY: &str = "YYYY-MM-DDThh:mm:ssZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Second,
}

/// A `from`/`until` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Datestamp {
    pub time: DateTime<Utc>,
    pub granularity: Granularity,
}

impl Datestamp {
    /// Parse `YYYY-MM-DD` or `YYYY-MM-DDThh:mm:ssZ`.
    pub fn parse(value: &str) -> Option<Self> {
        if value.len() == 10 {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()?;
            return Some(Self {
                time: date.and_hms_opt(0, 0, 0)?.and_utc(),
                granularity: Granularity::Day,
            });
        }
        let time = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%SZ").ok()?;
        Some(Self {
            time: time.and_utc(),
            granularity: Granularity::Second,
        })
    }

    /// Lower bound: the instant itself.
    pub fn as_from(&self) -> DateTime<Utc> {
        self.time
    }

    /// Upper bound: a bare date covers the whole day.
    pub fn as_until(&self) -> DateTime<Utc> {
        match self.granularity {
            Granularity::Day => self.time + chrono::Duration::seconds(86_399),
            Granularity::Second => self.time,
        }
    }
}

pub fn format_datestamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}
