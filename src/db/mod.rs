// src/db/mod.rs

//! Database layer for transaction history
//!
//! All reads and writes of history go through this module. Multi-row writes
//! run inside [`transaction`], so a failed call leaves nothing behind.

pub(crate) mod gateway;
pub mod history;
mod migrations;
pub mod models;
pub mod paths;
pub mod schema;

use crate::error::Result;
use rusqlite::{Connection, OpenFlags};
use std::fs;
use std::time::Duration;
use tracing::{debug, info};

/// How long a writer waits for a concurrent writer to release the database
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Create the database (and its directory) if needed and apply migrations
pub fn init(db_path: &str) -> Result<()> {
    info!("Initializing history database at: {}", db_path);

    let dir = paths::db_dir(db_path);
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(&dir)?;
    }

    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(())
}

/// Open an existing database
pub fn open(db_path: &str) -> Result<Connection> {
    debug!("Opening history database: {}", db_path);
    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    configure(&conn)?;
    Ok(conn)
}

/// Open a private in-memory database with the full schema
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    schema::migrate(&conn)?;
    Ok(conn)
}

/// Run `f` inside a single SQLite transaction
///
/// Commits when `f` returns `Ok`; any error rolls back every write made
/// through `tx`.
pub fn transaction<T, F>(conn: &mut Connection, f: F) -> Result<T>
where
    F: FnOnce(&rusqlite::Transaction) -> Result<T>,
{
    let tx = conn.transaction()?;
    let result = f(&tx)?;
    tx.commit()?;
    Ok(result)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
        row.get::<_, String>(0)
    })?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested/dir/history.db");
        let db_path = db_path.to_str().unwrap();

        init(db_path).unwrap();
        let conn = open(db_path).unwrap();
        assert_eq!(
            schema::get_schema_version(&conn).unwrap(),
            schema::SCHEMA_VERSION
        );
    }

    #[test]
    fn test_open_missing_database_fails() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing.db");
        assert!(open(db_path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_in_memory().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_transaction_rolls_back_on_error() {
        let mut conn = open_in_memory().unwrap();

        let result: Result<()> = transaction(&mut conn, |tx| {
            tx.execute(
                "INSERT INTO transactions (releasever, user_id, state) VALUES ('26', 0, 'started')",
                [],
            )?;
            Err(crate::Error::EmptyTransaction)
        });
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
