// SPDX-FileCopyrightText: 2025 oaiserve contributors
// SPDX-License-Identifier: MIT

//! Database connection management.

use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pending::PendingWriteSet;
use crate::schema::{SCHEMA_SQL, SCHEMA_VERSION};

/// Database open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only access (for serving queries)
    ReadOnly,
    /// Read-write access to an existing database
    ReadWrite,
    /// Create new database if it doesn't exist
    Create,
}

/// SQLite record store.
///
/// Writes made through [`StoreDb::update_record`] and [`StoreDb::add_set`]
/// stay in memory until [`StoreDb::flush`].
pub struct StoreDb {
    pub(crate) conn: Connection,
    pub(crate) pending: PendingWriteSet,
}

impl StoreDb {
    /// Open or create a database at a custom path.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let flags = match mode {
            OpenMode::ReadOnly => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_ONLY
            }
            OpenMode::ReadWrite => {
                if !path.exists() {
                    return Err(Error::DatabaseNotFound(path.to_owned()));
                }
                OpenFlags::SQLITE_OPEN_READ_WRITE
            }
            OpenMode::Create => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
        };

        let conn = Connection::open_with_flags(path, flags).map_err(|e| Error::DatabaseOpen {
            path: path.to_owned(),
            source: e,
        })?;
        let db = Self {
            conn,
            pending: PendingWriteSet::default(),
        };

        match mode {
            OpenMode::ReadOnly => {
                db.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
                db.check_schema_version()?;
            }
            OpenMode::ReadWrite => {
                db.configure_pragmas()?;
                db.check_schema_version()?;
            }
            OpenMode::Create => {
                db.configure_pragmas()?;
                if db.schema_version()? == 0 {
                    db.create_schema()?;
                } else {
                    db.check_schema_version()?;
                }
            }
        }

        debug!("Opened database at {} ({:?})", path.display(), mode);
        Ok(db)
    }

    /// Create an in-memory database (for testing).
    ///
    /// The database is initialized with the full schema.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn,
            pending: PendingWriteSet::default(),
        };
        db.configure_pragmas()?;
        db.create_schema()?;
        debug!("Created in-memory database");
        Ok(db)
    }

    /// Configure SQLite pragmas.
    ///
    /// `foreign_keys` is per connection and carries the cascading deletes of
    /// set references.
    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;
        Ok(())
    }

    /// Create the database schema and stamp its version.
    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA_SQL)?;
        self.conn
            .pragma_update(None, "user_version", SCHEMA_VERSION)?;
        debug!("Created database schema (version {SCHEMA_VERSION})");
        Ok(())
    }

    fn schema_version(&self) -> Result<i32> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;
        Ok(version)
    }

    fn check_schema_version(&self) -> Result<()> {
        let found = self.schema_version()?;
        if found != SCHEMA_VERSION {
            return Err(Error::SchemaVersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        Ok(())
    }

    /// Check if the database has the expected schema tables.
    pub fn has_schema(&self) -> Result<bool> {
        let count: i32 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('records', 'sets', 'setrefs')",
            [],
            |row| row.get(0),
        )?;
        Ok(count == 3)
    }
}
