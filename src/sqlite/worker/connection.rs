use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::driver::{Connection, StatementOutput};
use crate::error::WebSqlError;
use crate::sqlite::params::convert_params;
use crate::types::RowValues;

use super::manager::SqliteWorker;

/// Owned `SQLite` connection backed by a dedicated worker thread.
#[derive(Clone)]
pub struct SqliteConnection {
    worker: Arc<SqliteWorker>,
}

impl SqliteConnection {
    /// Move `conn` onto a new worker thread and return the async handle to it.
    ///
    /// # Errors
    /// Returns [`WebSqlError`] if the background worker thread cannot be spawned.
    pub fn new(conn: rusqlite::Connection, label: impl Into<String>) -> Result<Self, WebSqlError> {
        let worker = SqliteWorker::spawn(conn, label.into())?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    async fn execute(
        &self,
        sql: &str,
        args: &[RowValues],
    ) -> Result<Vec<StatementOutput>, WebSqlError> {
        self.worker
            .execute(sql.to_string(), convert_params(args))
            .await
    }

    async fn changes_since_last_statement(&self) -> Result<u64, WebSqlError> {
        self.worker.changes().await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("database", &self.worker.label())
            .finish()
    }
}
