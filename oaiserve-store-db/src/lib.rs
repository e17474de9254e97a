// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! SQLite record store for an OAI-PMH repository.
//!
//! This crate keeps versioned, set-tagged, timestamped records and answers
//! the selective harvesting queries behind `ListRecords`, `ListIdentifiers`
//! and `GetRecord`.
//!
//! **Architecture**: This is the storage layer. The OAI-PMH facade in
//! `oaiserve-feed` only ever talks to [`StoreDb`].
//!
//! # Key Features
//!
//! - Buffered writes: [`StoreDb::update_record`] stages into a
//!   [`PendingWriteSet`], [`StoreDb::flush`] commits it in one transaction
//! - Set membership with hidden sets and cascading set removal
//! - [`OaiQuery`]: date windows, needed/allowed/disallowed sets, embargo of
//!   future-dated records, stable `modified DESC, id ASC` paging
//!
//! # Example
//!
//! ```ignore
//! use oaiserve_store_db::{OaiQuery, OpenMode, StoreDb};
//!
//! let mut db = StoreDb::open("repo.sqlite", OpenMode::Create)?;
//! db.update_record("oai:spam", modified, false, &sets, &metadata)?;
//! db.flush()?;
//!
//! for record in db.oai_query(&OaiQuery::new().needed_set("spam"))? {
//!     println!("{} {}", record.id, record.modified);
//! }
//! ```

mod connection;
mod error;
mod oai_query;
mod pending;
mod query;
mod schema;
mod types;
mod write;

pub use connection::{OpenMode, StoreDb};
pub use error::{Error, Result};
pub use oai_query::{DEFAULT_BATCH_SIZE, OaiQuery};
pub use pending::{FlushStats, PendingWriteSet};
pub use schema::SCHEMA_VERSION;
pub use types::*;
