// Transaction state machine
//
// - callbacks: user callback types and builders
// - state: phase + first-error-wins slot
// - statement: one executeSql unit of work
// - runner: the transaction-start and finalization units

mod callbacks;
mod runner;
mod state;
mod statement;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::driver::Connection;
use crate::error::{SqlError, SqlErrorCode, WebSqlError};
use crate::queue::ExecQueue;
use crate::types::RowValues;

pub use callbacks::{ErrorAction, StatementCallbacks, TransactionCallbacks};
pub(crate) use runner::{TransactionBody, TransactionRequest, run_transaction};
pub use state::TxPhase;

use state::TxState;
use statement::PendingStatement;

/// Handle passed to a transaction body and to statement callbacks.
///
/// Cloning is cheap; every clone refers to the same transaction.
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<TxInner>,
}

struct TxInner {
    id: u64,
    database: String,
    connection: Arc<dyn Connection>,
    queue: ExecQueue,
    state: Mutex<TxState>,
    /// Statements queued but not yet run, including ones chained from callbacks.
    pending: AtomicUsize,
}

impl Transaction {
    pub(crate) fn new(
        id: u64,
        database: String,
        connection: Arc<dyn Connection>,
        queue: ExecQueue,
    ) -> Self {
        Self {
            inner: Arc::new(TxInner {
                id,
                database,
                connection,
                queue,
                state: Mutex::new(TxState::new()),
                pending: AtomicUsize::new(0),
            }),
        }
    }

    /// Queue `sql` with positional `args` and no callbacks.
    ///
    /// # Errors
    /// See [`Transaction::execute_sql_with`].
    pub fn execute_sql(&self, sql: impl Into<String>, args: &[RowValues]) -> Result<(), SqlError> {
        self.execute_sql_with(sql, args, StatementCallbacks::default())
    }

    /// Queue `sql` with positional `args`.
    ///
    /// The statement runs later, after everything already queued, and in the order calls were
    /// made. A statement queued from a result or error callback still runs before the
    /// transaction commits or rolls back. On success `on_result` receives the result set; on failure the error goes to
    /// `on_error` if given (whose [`ErrorAction`] decides whether the transaction fails),
    /// otherwise it fails the transaction.
    ///
    /// # Errors
    /// Returns an [`SqlErrorCode::Unknown`] error when the transaction has already finished or
    /// the execution queue has shut down.
    pub fn execute_sql_with(
        &self,
        sql: impl Into<String>,
        args: &[RowValues],
        callbacks: StatementCallbacks,
    ) -> Result<(), SqlError> {
        if self.phase().is_finished() {
            return Err(SqlError::with_message(
                SqlErrorCode::Unknown,
                "transaction is no longer active",
            ));
        }
        let statement = PendingStatement {
            sql: sql.into(),
            args: args.to_vec(),
            callbacks,
        };
        let in_flight = InFlight::track(self);
        let queued = self.inner.queue.enqueue(async move {
            in_flight.tx.run_statement(statement).await;
        });
        queued
            .map(drop)
            .map_err(|err| SqlError::with_message(SqlErrorCode::Unknown, err.to_string()))
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.inner.database
    }

    #[must_use]
    pub fn phase(&self) -> TxPhase {
        self.state().phase
    }

    /// The error that will (or did) roll this transaction back, if any.
    #[must_use]
    pub fn error(&self) -> Option<SqlError> {
        self.state().error.clone()
    }

    pub(crate) fn connection(&self) -> &Arc<dyn Connection> {
        &self.inner.connection
    }

    /// Record a statement-level failure; the first one wins.
    pub(crate) fn escalate(&self, error: SqlError) {
        if !self.state().record_error(error) {
            debug!(tx = self.inner.id, "later error ignored, transaction already failing");
        }
    }

    /// Statements queued on this transaction that have not finished running.
    pub(crate) fn pending_statements(&self) -> usize {
        self.inner.pending.load(Ordering::Acquire)
    }

    pub(crate) fn abort(&self, error: SqlError, raised: bool) {
        self.state().abort(error, raised);
    }

    fn state(&self) -> MutexGuard<'_, TxState> {
        // State updates are single assignments, so a poisoned lock still holds consistent data.
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    async fn control(&self, sql: &'static str) -> Result<(), WebSqlError> {
        debug!(tx = self.inner.id, database = %self.inner.database, "{sql}");
        self.inner.connection.execute(sql, &[]).await.map(drop)
    }
}

/// Counts one queued statement until it has run, or until its unit is dropped unrun.
struct InFlight {
    tx: Transaction,
}

impl InFlight {
    fn track(tx: &Transaction) -> Self {
        tx.inner.pending.fetch_add(1, Ordering::AcqRel);
        Self { tx: tx.clone() }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.tx.inner.pending.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.inner.id)
            .field("database", &self.inner.database)
            .field("phase", &self.phase())
            .field("pending", &self.pending_statements())
            .finish()
    }
}
