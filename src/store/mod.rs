//! Persistent, single-file transactional database (§4.1).
//!
//! `Store` owns a single `rusqlite::Connection` configured with WAL
//! journaling, foreign-key enforcement, and a bounded busy timeout so
//! concurrent writers serialize instead of erroring immediately. Callers
//! are expected to open a fresh `Store` per CLI invocation or per HTTP
//! request — there is no connection pooling, matching §4.4's "opened and
//! closed per request" requirement.

pub mod migrations;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode, Transaction};

use crate::error::{Error, Result};

/// Busy-wait budget before a write acquisition surfaces as
/// [`Error::StoreBusy`] (§5).
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct Store {
    conn: Connection,
}

impl Store {
    fn configure(conn: &Connection) -> Result<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    /// Open a connection without verifying schema version. Used by
    /// `migrate`, which exists specifically to correct a mismatch.
    fn open_raw(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    /// Open a handle, applying connection-scoped pragmas and verifying
    /// schema version (I7). Fails with [`Error::SchemaMismatch`] if the
    /// store has not been migrated to the version this binary expects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] if the stored version doesn't
    /// match what this binary's embedded migrations expect, and propagates
    /// any underlying storage error.
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self::open_raw(path)?;
        migrations::verify_current(&store.conn)?;
        Ok(store)
    }

    /// Discover and apply every pending migration (§4.1). Returns the
    /// resulting schema version.
    ///
    /// # Errors
    ///
    /// Propagates any underlying storage error.
    pub fn migrate(path: &Path) -> Result<i64> {
        let mut store = Self::open_raw(path)?;
        migrations::apply_pending(&mut store.conn)
    }

    /// Begin an immediate-write transaction, serializing concurrent
    /// writers per §5's single-writer discipline. Maps a busy-timeout
    /// expiry to [`Error::StoreBusy`] so callers can retry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreBusy`] if the busy timeout expires while
    /// waiting for the write lock.
    pub fn begin_immediate(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)
            .map_err(map_busy)
    }

    /// Direct access to the underlying connection for read-only queries
    /// that don't need an explicit transaction (auto-commit semantics).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Translate a `SQLITE_BUSY` failure into the retryable [`Error::StoreBusy`]
/// kind; everything else passes through unchanged.
#[must_use]
pub fn map_busy(err: rusqlite::Error) -> Error {
    if let rusqlite::Error::SqliteFailure(ref sqlite_err, _) = err {
        if sqlite_err.code == ErrorCode::DatabaseBusy {
            return Error::StoreBusy;
        }
    }
    Error::Sqlite(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn open_before_migrate_is_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        // Touch the file via open_raw (creates it) without migrating.
        Store::open_raw(&path).unwrap();
        let err = Store::open(&path).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn migrate_then_open_succeeds() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.db");
        Store::migrate(&path).unwrap();
        assert!(Store::open(&path).is_ok());
    }
}
