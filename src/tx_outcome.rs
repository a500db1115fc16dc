use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::{SqlError, SqlErrorCode};

/// How a transaction ended.
///
/// The legacy API only reports this through callbacks; the outcome is also handed back through
/// [`TransactionCompletion`] so async callers can await the end of a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Committed,
    /// Rolled back (or never begun) because of this error.
    RolledBack(SqlError),
}

impl TransactionOutcome {
    #[must_use]
    pub fn is_committed(&self) -> bool {
        matches!(self, TransactionOutcome::Committed)
    }

    #[must_use]
    pub fn error(&self) -> Option<&SqlError> {
        match self {
            TransactionOutcome::Committed => None,
            TransactionOutcome::RolledBack(err) => Some(err),
        }
    }
}

/// Resolves once a scheduled transaction has committed or rolled back.
///
/// Dropping it does not cancel the transaction. It resolves to `Err` when an error had no
/// error callback to go to and had to be raised instead: the body failed, the connection could
/// not be opened, or the rollback itself failed.
#[derive(Debug)]
pub struct TransactionCompletion {
    receiver: oneshot::Receiver<Result<TransactionOutcome, SqlError>>,
}

impl TransactionCompletion {
    pub(crate) fn channel() -> (
        oneshot::Sender<Result<TransactionOutcome, SqlError>>,
        TransactionCompletion,
    ) {
        let (tx, receiver) = oneshot::channel();
        (tx, TransactionCompletion { receiver })
    }
}

impl Future for TransactionCompletion {
    type Output = Result<TransactionOutcome, SqlError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver).poll(cx).map(|res| {
            res.unwrap_or_else(|_| {
                Err(SqlError::with_message(
                    SqlErrorCode::Unknown,
                    "transaction was dropped before it finished",
                ))
            })
        })
    }
}
