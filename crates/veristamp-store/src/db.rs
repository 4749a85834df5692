//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, io_error, Result};
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Open a SQLite database at the given path, creating parent directories
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| io_error("db_open", e))?;
    }
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with ledger settings
pub fn configure(conn: &Connection) -> Result<()> {
    // set first: other processes may hold the lock while WAL is switched on
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(from_rusqlite)?;

    // journal_mode answers with a row, so go through execute_batch
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)?;

    Ok(())
}
