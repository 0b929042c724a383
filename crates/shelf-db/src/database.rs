use std::path::{Path, PathBuf};

use rusqlite::{Connection, Transaction};

use crate::error::{DbError, DbResult};
use crate::schema;

/// A migrated SQLite database with foreign keys enforced.
///
/// Reads go through [`Database::conn`]. Every multi-step write goes through
/// [`Database::transaction`], which is the only way this crate hands out a
/// writable scope.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Database {
    /// Open (creating if needed) the database file at `path` and migrate it.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Self::init(conn, Some(path.to_path_buf()))?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// A private in-memory database, used by tests and dry runs.
    pub fn open_in_memory() -> DbResult<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(mut conn: Connection, path: Option<PathBuf>) -> DbResult<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::migrate(&mut conn)?;
        Ok(Self { conn, path })
    }

    /// File backing this database, `None` when in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read-only access for queries outside a transaction.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is rolled back
    /// explicitly before the error is returned, so no partial write from `f`
    /// survives.
    pub fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T, E>,
        E: From<DbError>,
    {
        let tx = self.conn.transaction().map_err(DbError::from)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(DbError::from)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    tracing::warn!(error = %rollback, "transaction rollback failed");
                } else {
                    tracing::debug!("transaction rolled back");
                }
                Err(err)
            }
        }
    }
}
