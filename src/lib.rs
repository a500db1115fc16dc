//! Callback-driven, implicitly transactional database API in the style of the legacy browser
//! WebSQL interface, running on an asynchronous SQL driver.
//!
//! Every transaction start, BEGIN, statement and COMMIT/ROLLBACK goes through one FIFO
//! execution queue per [`WebSql`] service, so callback-style code keeps the ordering and error
//! propagation it was written against.

pub mod config;
pub mod database;
pub mod driver;
pub mod error;
pub mod prelude;
pub mod queue;
pub mod registry;
pub mod results;
pub mod transaction;
pub mod translation;
pub mod tx_outcome;
pub mod types;
pub mod websql;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use database::{ChangeVersionCallbacks, Database};
pub use error::{SqlError, SqlErrorCode, WebSqlError};
pub use results::{ResultSet, Row, RowList};
pub use transaction::{ErrorAction, StatementCallbacks, Transaction, TransactionCallbacks, TxPhase};
pub use tx_outcome::{TransactionCompletion, TransactionOutcome};
pub use types::RowValues;
pub use websql::{WebSql, WebSqlBuilder};
