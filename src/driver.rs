use std::sync::Arc;

use async_trait::async_trait;

use crate::error::WebSqlError;
use crate::types::RowValues;

/// Raw tabular output of one statement: column names and positional row values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RowValues>>,
}

/// An open connection to one named database.
///
/// Implementations are only ever driven one call at a time: every call is issued from a unit of
/// work on the execution queue.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run `sql` (one or more statements) with positional `args` bound to its placeholders.
    ///
    /// # Errors
    /// Returns [`WebSqlError`] when the text is malformed or the backend rejects it.
    async fn execute(
        &self,
        sql: &str,
        args: &[RowValues],
    ) -> Result<Vec<StatementOutput>, WebSqlError>;

    /// Rows changed by the most recent INSERT, UPDATE or DELETE.
    ///
    /// # Errors
    /// Returns [`WebSqlError`] if the backend cannot be reached.
    async fn changes_since_last_statement(&self) -> Result<u64, WebSqlError>;
}

/// Opens backend connections by database name.
#[async_trait]
pub trait Driver: Send + Sync {
    /// # Errors
    /// Returns [`WebSqlError`] if the database cannot be opened.
    async fn open_connection(&self, name: &str) -> Result<Arc<dyn Connection>, WebSqlError>;
}
