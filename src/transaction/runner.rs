use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::callbacks::{ErrorCallback, TransactionCallbacks, guarded};
use super::{Transaction, TxPhase};
use crate::error::{SqlError, SqlErrorCode};
use crate::queue::ExecQueue;
use crate::registry::ConnectionRegistry;
use crate::tx_outcome::TransactionOutcome;

pub(crate) type TransactionBody = Box<dyn FnOnce(&Transaction) -> Result<(), SqlError> + Send>;
type Done = oneshot::Sender<Result<TransactionOutcome, SqlError>>;

/// Everything the transaction-start unit needs once it reaches the head of the queue.
pub(crate) struct TransactionRequest {
    pub(crate) id: u64,
    pub(crate) database: String,
    pub(crate) registry: Arc<ConnectionRegistry>,
    pub(crate) queue: ExecQueue,
    pub(crate) body: TransactionBody,
    pub(crate) callbacks: TransactionCallbacks,
    pub(crate) done: Done,
}

/// The transaction-start unit.
///
/// Opens (or reuses) the connection, queues BEGIN, runs the body so its statements queue up
/// behind BEGIN, then queues the finalization unit behind them.
///
/// Statements chained from callbacks land behind the finalization unit, which then moves itself
/// to the back of the queue until none are left.
pub(crate) async fn run_transaction(request: TransactionRequest) {
    let TransactionRequest {
        id,
        database,
        registry,
        queue,
        body,
        callbacks,
        done,
    } = request;

    let connection = match registry.connection(&database).await {
        Ok(connection) => connection,
        Err(err) => {
            warn!(tx = id, %database, "cannot open connection: {err}");
            let error = SqlError::from(err);
            let _ = done.send(route(error, true, callbacks.on_error));
            return;
        }
    };

    let tx = Transaction::new(id, database, connection, queue.clone());
    debug!(tx = id, database = tx.database(), "transaction started");

    let begin = tx.clone();
    if let Err(err) = queue.enqueue(async move { begin.begin().await }) {
        let error = SqlError::with_message(SqlErrorCode::Unknown, err.to_string());
        let _ = done.send(route(error, true, callbacks.on_error));
        return;
    }

    match guarded("transaction body", || body(&tx)) {
        Some(Ok(())) => {}
        Some(Err(error)) => {
            debug!(tx = id, "transaction body failed: {error}");
            tx.abort(error, true);
        }
        None => tx.abort(
            SqlError::with_message(
                SqlErrorCode::Unknown,
                "the transaction callback raised an exception",
            ),
            true,
        ),
    }

    tx.schedule_finalize(callbacks, done);
}

impl Transaction {
    fn schedule_finalize(&self, callbacks: TransactionCallbacks, done: Done) {
        let tx = self.clone();
        let scheduled = self.inner.queue.enqueue(async move {
            let pending = tx.pending_statements();
            if pending > 0 {
                debug!(tx = tx.id(), pending, "statements still queued, transaction end deferred");
                tx.schedule_finalize(callbacks, done);
                return;
            }
            let outcome = tx.finalize(callbacks).await;
            let _ = done.send(outcome);
        });
        if let Err(err) = scheduled {
            // The completion handle reports the dropped sender.
            warn!(tx = self.id(), "cannot schedule transaction end: {err}");
        }
    }

    /// BEGIN unit. Runs only for a transaction whose body has not failed.
    pub(super) async fn begin(&self) {
        if self.phase() != TxPhase::Created {
            debug!(tx = self.id(), "transaction aborted before BEGIN");
            return;
        }
        match self.control("BEGIN TRANSACTION;").await {
            Ok(()) => self.state().begin(),
            Err(err) => {
                warn!(tx = self.id(), "BEGIN failed: {err}");
                self.abort(
                    SqlError::with_message(SqlErrorCode::Database, err.to_string()),
                    false,
                );
            }
        }
    }

    /// Finalization unit: COMMIT and `on_success`, or ROLLBACK and `on_error`.
    pub(super) async fn finalize(
        &self,
        callbacks: TransactionCallbacks,
    ) -> Result<TransactionOutcome, SqlError> {
        let TransactionCallbacks {
            on_error,
            on_success,
        } = callbacks;
        let (error, began, raised) = {
            let state = self.state();
            (state.error.clone(), state.began, state.raised)
        };

        let Some(error) = error else {
            return match self.control("COMMIT;").await {
                Ok(()) => {
                    self.finish(TxPhase::Committed);
                    debug!(tx = self.id(), "transaction committed");
                    if let Some(on_success) = on_success {
                        guarded("transaction success", on_success);
                    }
                    Ok(TransactionOutcome::Committed)
                }
                Err(err) => {
                    warn!(tx = self.id(), "COMMIT failed: {err}");
                    if let Err(err) = self.control("ROLLBACK;").await {
                        warn!(tx = self.id(), "ROLLBACK after failed COMMIT failed: {err}");
                    }
                    self.finish(TxPhase::RolledBack);
                    let error = SqlError::with_message(SqlErrorCode::Database, err.to_string());
                    self.state().record_error(error.clone());
                    route(error, false, on_error)
                }
            };
        };

        let rollback = if began {
            self.control("ROLLBACK;").await
        } else {
            Ok(())
        };
        self.finish(TxPhase::RolledBack);

        if let Err(err) = rollback {
            warn!(tx = self.id(), "ROLLBACK failed: {err}");
            if on_error.is_none() {
                return Err(SqlError::with_message(
                    SqlErrorCode::Database,
                    err.to_string(),
                ));
            }
        }
        debug!(tx = self.id(), began, "transaction rolled back: {error}");
        route(error, raised, on_error)
    }

    fn finish(&self, phase: TxPhase) {
        self.state().phase = phase;
    }
}

/// Hand a transaction-level error to `on_error`. Without one, errors raised by the body (or by
/// the start unit) surface as `Err`; escalated statement errors only show in the outcome.
fn route(
    error: SqlError,
    raised: bool,
    on_error: Option<ErrorCallback>,
) -> Result<TransactionOutcome, SqlError> {
    match on_error {
        Some(on_error) => {
            let reported = error.clone();
            guarded("transaction error", move || on_error(reported));
            Ok(TransactionOutcome::RolledBack(error))
        }
        None if raised => Err(error),
        None => Ok(TransactionOutcome::RolledBack(error)),
    }
}
