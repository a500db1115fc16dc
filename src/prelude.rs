//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open a database, run transactions
//! and read results.

pub use crate::config::{
    DatabaseConfig, JsonFileStore, KeyValueStore, MemoryStore, WebSqlOptions, WebSqlOptionsBuilder,
};
pub use crate::database::{ChangeVersionCallbacks, Database};
pub use crate::driver::{Connection, Driver, StatementOutput};
pub use crate::error::{SqlError, SqlErrorCode, WebSqlError};
pub use crate::results::{ResultSet, Row, RowList};
pub use crate::transaction::{
    ErrorAction, StatementCallbacks, Transaction, TransactionCallbacks, TxPhase,
};
pub use crate::translation::{StatementKind, normalize_quotes};
pub use crate::tx_outcome::{TransactionCompletion, TransactionOutcome};
pub use crate::types::RowValues;
pub use crate::websql::{WebSql, WebSqlBuilder};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteDriver, SqliteDriverOptions, SqliteDriverOptionsBuilder, SqliteStorage};
