use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::driver::{Connection, Driver};
use crate::error::WebSqlError;

use super::worker::SqliteConnection;

/// Where the driver keeps each named database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqliteStorage {
    /// Private in-memory database per name; contents vanish with the connection.
    Memory,
    /// One `<name>.sqlite` file per database inside this directory.
    Directory(PathBuf),
}

/// Options for the `SQLite` driver.
#[derive(Debug, Clone)]
pub struct SqliteDriverOptions {
    pub storage: SqliteStorage,
    pub journal_wal: bool,
}

impl SqliteDriverOptions {
    #[must_use]
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            storage,
            journal_wal: true,
        }
    }

    #[must_use]
    pub fn with_wal(mut self, journal_wal: bool) -> Self {
        self.journal_wal = journal_wal;
        self
    }

    /// Path of the file backing `name`, or `None` for in-memory storage.
    #[must_use]
    pub fn database_path(&self, name: &str) -> Option<PathBuf> {
        match &self.storage {
            SqliteStorage::Memory => None,
            SqliteStorage::Directory(dir) => Some(dir.join(format!("{}.sqlite", file_stem(name)))),
        }
    }
}

/// Fluent builder for `SQLite` driver options.
#[derive(Debug, Clone)]
pub struct SqliteDriverOptionsBuilder {
    opts: SqliteDriverOptions,
}

impl SqliteDriverOptionsBuilder {
    #[must_use]
    pub fn memory() -> Self {
        Self {
            opts: SqliteDriverOptions::new(SqliteStorage::Memory),
        }
    }

    #[must_use]
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self {
            opts: SqliteDriverOptions::new(SqliteStorage::Directory(dir.into())),
        }
    }

    #[must_use]
    pub fn wal(mut self, journal_wal: bool) -> Self {
        self.opts.journal_wal = journal_wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteDriverOptions {
        self.opts
    }

    #[must_use]
    pub fn build(self) -> SqliteDriver {
        SqliteDriver::new(self.finish())
    }
}

/// [`Driver`] that opens one rusqlite connection per database name, each owned by its own
/// worker thread.
#[derive(Debug, Clone)]
pub struct SqliteDriver {
    options: SqliteDriverOptions,
}

impl SqliteDriver {
    #[must_use]
    pub fn new(options: SqliteDriverOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        SqliteDriverOptionsBuilder::memory().build()
    }

    #[must_use]
    pub fn options(&self) -> &SqliteDriverOptions {
        &self.options
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    async fn open_connection(&self, name: &str) -> Result<Arc<dyn Connection>, WebSqlError> {
        let path = self.options.database_path(name);
        let journal_wal = self.options.journal_wal;
        debug!(database = name, path = ?path, "opening sqlite connection");

        let conn = tokio::task::spawn_blocking(move || open_sqlite(path.as_deref(), journal_wal))
            .await
            .map_err(|e| {
                WebSqlError::ConnectionError(format!("sqlite spawn_blocking join error: {e}"))
            })??;

        let connection = SqliteConnection::new(conn, name)?;
        Ok(Arc::new(connection))
    }
}

fn open_sqlite(path: Option<&Path>, journal_wal: bool) -> Result<rusqlite::Connection, WebSqlError> {
    let Some(path) = path else {
        return Ok(rusqlite::Connection::open_in_memory()?);
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let conn = rusqlite::Connection::open(path)?;
    if journal_wal {
        // journal_mode returns a row, so it cannot go through execute_batch
        conn.query_row("PRAGMA journal_mode = WAL;", [], |_| Ok(()))?;
    }
    Ok(conn)
}

/// Database names are free text; keep only characters that are safe in a file name.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "_".to_string()
    } else {
        stem
    }
}
