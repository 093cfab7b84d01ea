//! SQLite-backed persistence.
//!
//! The database is the only contract with the league's web frontend: it
//! reads the same tables this batch job writes. All import work runs inside
//! one transaction obtained from [`Database::transaction`].

mod repository;
mod schema;

pub use repository::*;
pub use schema::create_tables;

use std::path::Path;

use rusqlite::{Connection, Transaction};
use thiserror::Error;
use tracing::debug;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An open league database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (and if needed initialize) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        schema::create_tables(&conn)?;

        debug!("Opened database at {:?}", path);
        Ok(Self { conn })
    }

    /// In-memory database for tests.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        schema::create_tables(&conn)?;
        Ok(Self { conn })
    }

    /// Begin a transaction; commits only when [`Transaction::commit`] is
    /// called, rolls back on drop otherwise.
    pub fn transaction(&mut self) -> Result<Transaction<'_>, StorageError> {
        Ok(self.conn.transaction()?)
    }

    /// Read-only access to the underlying connection.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}
