//! Discovery and application of versioned migration artifacts (§4.1).
//!
//! Migrations are embedded into the binary at compile time via
//! `rust-embed` so the resulting executable can initialize or upgrade a
//! store with no external files alongside it. Filenames are expected to
//! look like `NNN_description.sql`; the integer prefix is the version.

use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use rusqlite::Connection;
use rust_embed::RustEmbed;

use crate::error::{Error, Result};

#[derive(RustEmbed)]
#[folder = "migrations/"]
struct MigrationAssets;

static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)_.*\.sql$").unwrap());

/// A single discovered migration artifact.
pub struct Migration {
    pub version: i64,
    pub sql: String,
}

/// Discover all embedded migrations, ordered by ascending version.
///
/// # Panics
///
/// Panics if an embedded migration file is not valid UTF-8 — this would
/// indicate a corrupted build, not a runtime condition callers should
/// recover from.
#[must_use]
pub fn discover() -> Vec<Migration> {
    let mut migrations: Vec<Migration> = MigrationAssets::iter()
        .filter_map(|name| {
            let caps = FILENAME_PATTERN.captures(&name)?;
            let version: i64 = caps[1].parse().ok()?;
            let file = MigrationAssets::get(&name)?;
            let sql = std::str::from_utf8(&file.data)
                .expect("embedded migration is not valid UTF-8")
                .to_string();
            Some(Migration { version, sql })
        })
        .collect();
    migrations.sort_by_key(|m| m.version);
    migrations
}

/// The schema version the running binary expects: the highest version
/// among its embedded migrations. This is what §3's I7 calls "the
/// version encoded by the codebase".
#[must_use]
pub fn expected_version() -> i64 {
    discover().iter().map(|m| m.version).max().unwrap_or(0)
}

/// Read the currently recorded schema version, or `0` if the store has
/// never had a migration applied (the `schema_version` table itself is
/// created by the first migration).
///
/// # Errors
///
/// Propagates any underlying storage error.
pub fn current_version(conn: &Connection) -> Result<i64> {
    let table_exists: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
            [],
            |_| Ok(()),
        )
        .optional_row()?;
    if !table_exists {
        return Ok(0);
    }
    let version: i64 = conn.query_row("SELECT version FROM schema_version WHERE id = 0", [], |row| {
        row.get(0)
    })?;
    Ok(version)
}

/// Apply every migration whose version exceeds the currently recorded
/// version, in order, then record the new version — all in one
/// transaction, as required by §4.1.
///
/// # Errors
///
/// Propagates any underlying storage error.
pub fn apply_pending(conn: &mut Connection) -> Result<i64> {
    let stored = current_version(conn)?;
    let pending: Vec<Migration> = discover().into_iter().filter(|m| m.version > stored).collect();
    if pending.is_empty() {
        return Ok(stored);
    }

    let bar = ProgressBar::new(pending.len() as u64);
    #[allow(clippy::literal_string_with_formatting_args)]
    if let Ok(style) = ProgressStyle::with_template("applying migrations [{bar:30}] {pos}/{len}") {
        bar.set_style(style);
    }

    let tx = conn.transaction()?;
    let mut latest = stored;
    for migration in &pending {
        tx.execute_batch(&migration.sql)?;
        latest = migration.version;
        bar.inc(1);
    }
    bar.finish_and_clear();
    tx.execute(
        "INSERT INTO schema_version (id, version) VALUES (0, ?1)
         ON CONFLICT(id) DO UPDATE SET version = excluded.version",
        [latest],
    )?;
    tx.commit()?;
    Ok(latest)
}

/// Verify the store's recorded version matches what this binary expects
/// (I7). Called by `Store::open`; deliberately not called by `migrate`
/// itself, which exists to correct a mismatch.
///
/// # Errors
///
/// Returns [`Error::SchemaMismatch`] if the stored version doesn't match
/// what this binary's embedded migrations expect, and propagates any
/// underlying storage error.
pub fn verify_current(conn: &Connection) -> Result<()> {
    let stored = current_version(conn)?;
    let expected = expected_version();
    if stored != expected {
        return Err(Error::SchemaMismatch { stored, expected });
    }
    Ok(())
}

trait OptionalRow<T> {
    fn optional_row(self) -> Result<bool>;
}

impl<T> OptionalRow<T> for rusqlite::Result<T> {
    fn optional_row(self) -> Result<bool> {
        match self {
            Ok(_) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_embedded_migrations_in_order() {
        let migrations = discover();
        assert!(!migrations.is_empty());
        let versions: Vec<i64> = migrations.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        assert_eq!(versions, sorted);
    }

    #[test]
    fn fresh_connection_has_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(current_version(&conn).unwrap(), 0);
    }

    #[test]
    fn apply_pending_brings_store_to_expected_version() {
        let mut conn = Connection::open_in_memory().unwrap();
        let applied = apply_pending(&mut conn).unwrap();
        assert_eq!(applied, expected_version());
        assert_eq!(current_version(&conn).unwrap(), expected_version());
    }

    #[test]
    fn apply_pending_is_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_pending(&mut conn).unwrap();
        let second = apply_pending(&mut conn).unwrap();
        assert_eq!(second, expected_version());
    }

    #[test]
    fn verify_current_fails_before_migration() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(verify_current(&conn).is_err());
    }

    #[test]
    fn verify_current_succeeds_after_migration() {
        let mut conn = Connection::open_in_memory().unwrap();
        apply_pending(&mut conn).unwrap();
        assert!(verify_current(&conn).is_ok());
    }
}
