//! Database connection and table management.

use crate::error::{DbError, Result};
use crate::schema;
use paperwatch_common::SourceTag;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Main database handle. Share it behind an `Arc`; all access to the
/// underlying connection is serialised through one lock, and every
/// multi-statement write runs in its own SQLite transaction.
///
/// Calls are synchronous and may block on the lock or on disk. From async
/// code, run bulk work through `tokio::task::spawn_blocking`.
pub struct Database {
    conn: Mutex<Connection>,
    path: String,
}

impl Database {
    /// Open or create a database at the specified path and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        // WAL is unavailable for some filesystems; the store still works without it.
        if let Err(e) = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        }) {
            warn!(error = %e, "Could not enable WAL journal mode");
        }

        let db = Self {
            conn: Mutex::new(conn),
            path: path.to_string_lossy().to_string(),
        };
        db.initialize()?;
        debug!(path = %db.path, "Database opened");
        Ok(db)
    }

    /// Private in-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
            path: ":memory:".to_string(),
        };
        db.initialize()?;
        Ok(db)
    }

    /// Get the database path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Lock the connection for a unit of work.
    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    /// Create tables, the FTS index, and secondary indexes if they don't exist.
    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(schema::CREATE_RECORDS)?;
        conn.execute_batch(schema::CREATE_SUMMARIES)?;
        conn.execute_batch(schema::CREATE_RECORDS_FTS)?;
        for ddl in schema::CREATE_INDEXES {
            conn.execute_batch(ddl)?;
        }
        Ok(())
    }

    /// Row counts across both tables.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;

        let total_records: i64 =
            conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        let total_summaries: i64 =
            conn.query_row("SELECT COUNT(*) FROM summaries", [], |row| row.get(0))?;

        let mut stmt = conn.prepare("SELECT source, COUNT(*) FROM records GROUP BY source")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut records_by_source = BTreeMap::new();
        for row in rows {
            let (source, count) = row?;
            let tag: SourceTag = source.parse().map_err(|_| DbError::Corrupt {
                table: schema::TABLE_RECORDS,
                reason: format!("unknown source '{}'", source),
            })?;
            records_by_source.insert(tag, count as u64);
        }

        Ok(StoreStats {
            total_records: total_records as u64,
            total_summaries: total_summaries as u64,
            records_by_source,
        })
    }
}

/// Database statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total_records: u64,
    pub total_summaries: u64,
    pub records_by_source: BTreeMap<SourceTag, u64>,
}
