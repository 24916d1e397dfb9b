// src/db/paths.rs
//! Location of the history database

use std::path::{Path, PathBuf};

/// Default database directory
pub const DEFAULT_DB_DIR: &str = "/var/lib/swdb";

/// Database file name inside the database directory
pub const DB_FILE_NAME: &str = "history.db";

/// Environment variable overriding the database directory
pub const DB_DIR_ENV: &str = "SWDB_DB_DIR";

/// Get the directory containing the database
pub fn db_dir(db_path: &str) -> PathBuf {
    Path::new(db_path)
        .parent()
        .unwrap_or(Path::new(DEFAULT_DB_DIR))
        .to_path_buf()
}

/// Database path, honoring `SWDB_DB_DIR`
pub fn default_db_path() -> PathBuf {
    db_path_in(std::env::var(DB_DIR_ENV).ok().as_deref())
}

fn db_path_in(dir: Option<&str>) -> PathBuf {
    match dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir).join(DB_FILE_NAME),
        _ => PathBuf::from(DEFAULT_DB_DIR).join(DB_FILE_NAME),
    }
}
