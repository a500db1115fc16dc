use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use super::Transaction;
use crate::error::SqlError;
use crate::results::ResultSet;

pub(crate) type ResultCallback = Box<dyn FnOnce(&Transaction, &ResultSet) + Send>;
pub(crate) type StatementErrorCallback = Box<dyn FnOnce(&Transaction, &SqlError) -> ErrorAction + Send>;
pub(crate) type ErrorCallback = Box<dyn FnOnce(SqlError) + Send>;
pub(crate) type SuccessCallback = Box<dyn FnOnce() + Send>;

/// What a statement error callback decides about the error it was handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// The error is handled; the transaction carries on and can still commit.
    Suppress,
    /// The transaction fails and is rolled back at the end.
    Escalate,
}

/// Optional callbacks for one `execute_sql` call.
#[derive(Default)]
pub struct StatementCallbacks {
    pub(crate) on_result: Option<ResultCallback>,
    pub(crate) on_error: Option<StatementErrorCallback>,
}

impl StatementCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the adapted result when the statement succeeds.
    #[must_use]
    pub fn on_result<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Transaction, &ResultSet) + Send + 'static,
    {
        self.on_result = Some(Box::new(callback));
        self
    }

    /// Called when the statement fails. A panic inside the callback counts as
    /// [`ErrorAction::Escalate`].
    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Transaction, &SqlError) -> ErrorAction + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }
}

/// Optional transaction-level callbacks, run after the commit or rollback.
#[derive(Default)]
pub struct TransactionCallbacks {
    pub(crate) on_error: Option<ErrorCallback>,
    pub(crate) on_success: Option<SuccessCallback>,
}

impl TransactionCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn on_error<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(SqlError) + Send + 'static,
    {
        self.on_error = Some(Box::new(callback));
        self
    }

    #[must_use]
    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }
}

/// Run a user callback, turning a panic into `None` so it cannot take a unit of work down.
pub(crate) fn guarded<T>(label: &'static str, callback: impl FnOnce() -> T) -> Option<T> {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(callback = label, "callback panicked");
            None
        }
    }
}
