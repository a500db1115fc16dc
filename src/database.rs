use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::error::{SqlError, SqlErrorCode};
use crate::transaction::{
    Transaction, TransactionBody, TransactionCallbacks, TransactionRequest, run_transaction,
};
use crate::tx_outcome::TransactionCompletion;
use crate::websql::Shared;

type VersionCallback = Box<dyn FnOnce() + Send>;
type VersionErrorCallback = Box<dyn FnOnce(SqlError) + Send>;

/// Handle to a named database returned by [`crate::WebSql::open_database`].
///
/// Every handle for the same name shares one backend connection, opened lazily by the first
/// transaction. Cloning is cheap.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    name: String,
    display_name: String,
    size: u64,
    version: Mutex<String>,
    shared: Arc<Shared>,
}

impl Database {
    pub(crate) fn new(
        name: &str,
        version: &str,
        display_name: &str,
        size: u64,
        shared: Arc<Shared>,
    ) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                name: name.to_string(),
                display_name: display_name.to_string(),
                size,
                version: Mutex::new(version.to_string()),
                shared,
            }),
        }
    }

    /// Schedule a read/write transaction.
    ///
    /// `body` runs once the transaction reaches the head of the execution queue and its
    /// connection is open; statements it queues through [`Transaction::execute_sql`] run after it
    /// returns, in order. Returning `Err` (or panicking) from `body` abandons the transaction
    /// before anything reaches the database.
    pub fn transaction<F>(&self, body: F) -> TransactionCompletion
    where
        F: FnOnce(&Transaction) -> Result<(), SqlError> + Send + 'static,
    {
        self.transaction_with(body, TransactionCallbacks::default())
    }

    /// [`Database::transaction`] with transaction-level error and success callbacks.
    pub fn transaction_with<F>(&self, body: F, callbacks: TransactionCallbacks) -> TransactionCompletion
    where
        F: FnOnce(&Transaction) -> Result<(), SqlError> + Send + 'static,
    {
        self.schedule(Box::new(body), callbacks)
    }

    /// Same as [`Database::transaction`]; writes are not rejected.
    pub fn read_transaction<F>(&self, body: F) -> TransactionCompletion
    where
        F: FnOnce(&Transaction) -> Result<(), SqlError> + Send + 'static,
    {
        self.transaction(body)
    }

    pub fn read_transaction_with<F>(
        &self,
        body: F,
        callbacks: TransactionCallbacks,
    ) -> TransactionCompletion
    where
        F: FnOnce(&Transaction) -> Result<(), SqlError> + Send + 'static,
    {
        self.transaction_with(body, callbacks)
    }

    /// Replace the version string when it currently equals `old_version`.
    ///
    /// Only the in-memory version of this handle changes. On success `callback` then `on_success`
    /// run immediately; on a mismatch the version error goes to `on_error`.
    ///
    /// # Errors
    /// Returns an [`SqlErrorCode::Version`] error on a mismatch when no error callback was given.
    pub fn change_version(
        &self,
        old_version: &str,
        new_version: &str,
        callbacks: ChangeVersionCallbacks,
    ) -> Result<(), SqlError> {
        {
            let mut version = self.version_slot();
            if *version != old_version {
                drop(version);
                let error = SqlError::new(SqlErrorCode::Version);
                debug!(database = %self.inner.name, expected = old_version, "version mismatch");
                return match callbacks.on_error {
                    Some(on_error) => {
                        on_error(error);
                        Ok(())
                    }
                    None => Err(error),
                };
            }
            *version = new_version.to_string();
        }
        debug!(database = %self.inner.name, version = new_version, "version changed");

        if let Some(callback) = callbacks.callback {
            callback();
        }
        if let Some(on_success) = callbacks.on_success {
            on_success();
        }
        Ok(())
    }

    #[must_use]
    pub fn version(&self) -> String {
        self.version_slot().clone()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.inner.display_name
    }

    /// Estimated size given at open time. Informational only.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.inner.size
    }

    fn schedule(&self, body: TransactionBody, callbacks: TransactionCallbacks) -> TransactionCompletion {
        let shared = &self.inner.shared;
        let (done, completion) = TransactionCompletion::channel();
        let request = TransactionRequest {
            id: shared.next_transaction_id(),
            database: self.inner.name.clone(),
            registry: Arc::clone(&shared.registry),
            queue: shared.queue.clone(),
            body,
            callbacks,
            done,
        };
        debug!(tx = request.id, database = %self.inner.name, "transaction queued");
        if let Err(err) = shared.queue.enqueue(run_transaction(request)) {
            warn!(database = %self.inner.name, "cannot schedule transaction: {err}");
        }
        completion
    }

    fn version_slot(&self) -> MutexGuard<'_, String> {
        self.inner
            .version
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.inner.name)
            .field("version", &self.version())
            .field("display_name", &self.inner.display_name)
            .field("size", &self.inner.size)
            .finish()
    }
}

/// Optional callbacks for [`Database::change_version`].
#[derive(Default)]
pub struct ChangeVersionCallbacks {
    callback: Option<VersionCallback>,
    on_error: Option<VersionErrorCallback>,
    on_success: Option<VersionCallback>,
}

impl ChangeVersionCallbacks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs right after the version changes.
    #[must_use]
    pub fn callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
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
