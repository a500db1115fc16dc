use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::{
    self, DatabaseConfig, KeyValueStore, MemoryStore, WebSqlOptions,
};
use crate::database::Database;
use crate::driver::Driver;
use crate::error::WebSqlError;
use crate::queue::ExecQueue;
use crate::registry::ConnectionRegistry;

/// State every [`Database`] handle of one service shares.
pub(crate) struct Shared {
    pub(crate) queue: ExecQueue,
    pub(crate) registry: Arc<ConnectionRegistry>,
    next_tx: AtomicU64,
}

impl Shared {
    pub(crate) fn next_transaction_id(&self) -> u64 {
        self.next_tx.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Entry point of the legacy database API.
///
/// Owns the execution queue that totally orders every transaction and statement, the
/// connection registry, and the store configurations are persisted to.
///
/// ```no_run
/// use websql_middleware::prelude::*;
///
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let websql = WebSql::builder()
///     .driver(SqliteDriver::in_memory())
///     .build()?;
/// let db = websql.open_database("mydb", "1.0", "Test DB", 2 * 1024 * 1024)?;
///
/// let outcome = db
///     .transaction(|tx| {
///         tx.execute_sql("CREATE TABLE IF NOT EXISTS t (id INTEGER PRIMARY KEY, v TEXT)", &[])?;
///         tx.execute_sql("INSERT INTO t (v) VALUES (?)", &["hello".into()])
///     })
///     .await?;
/// assert!(outcome.is_committed());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct WebSql {
    shared: Arc<Shared>,
    store: Arc<dyn KeyValueStore>,
    options: WebSqlOptions,
}

impl WebSql {
    #[must_use]
    pub fn builder() -> WebSqlBuilder {
        WebSqlBuilder::default()
    }

    /// Install (or replace) the backend driver. The service counts as ready from then on.
    ///
    /// # Errors
    /// Returns [`WebSqlError::ConnectionError`] if the registry lock is poisoned.
    pub fn install_driver(&self, driver: Arc<dyn Driver>) -> Result<(), WebSqlError> {
        self.shared.registry.install_driver(driver)?;
        info!("database driver installed");
        Ok(())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.shared.registry.has_driver()
    }

    /// Wait until a driver is installed, polling at the configured interval.
    ///
    /// # Errors
    /// Returns [`WebSqlError::ReadyTimeout`] when no driver shows up within the configured
    /// timeout.
    pub async fn ready(&self) -> Result<(), WebSqlError> {
        let started = Instant::now();
        loop {
            if self.is_ready() {
                return Ok(());
            }
            if started.elapsed() >= self.options.ready_timeout {
                return Err(WebSqlError::ReadyTimeout(self.options.ready_timeout));
            }
            tokio::time::sleep(self.options.ready_poll_interval).await;
        }
    }

    /// Open (or reopen) a named database and record it in the configuration store.
    ///
    /// Reopening with a different version is allowed; the stored record takes the new values.
    /// No connection is made until the first transaction runs.
    ///
    /// # Errors
    /// Returns [`WebSqlError`] if the configuration store cannot be read or written.
    pub fn open_database(
        &self,
        name: &str,
        version: &str,
        display_name: &str,
        size: u64,
    ) -> Result<Database, WebSqlError> {
        config::record_open(self.store.as_ref(), name, version, display_name, size)?;
        debug!(database = name, version, "database opened");
        Ok(Database::new(
            name,
            version,
            display_name,
            size,
            Arc::clone(&self.shared),
        ))
    }

    /// [`WebSql::open_database`], then hand the new handle to `creation_callback`.
    ///
    /// # Errors
    /// See [`WebSql::open_database`].
    pub fn open_database_with_callback<F>(
        &self,
        name: &str,
        version: &str,
        display_name: &str,
        size: u64,
        creation_callback: F,
    ) -> Result<Database, WebSqlError>
    where
        F: FnOnce(&Database),
    {
        let database = self.open_database(name, version, display_name, size)?;
        creation_callback(&database);
        Ok(database)
    }

    /// Every database configuration recorded so far, keyed by name.
    ///
    /// # Errors
    /// Returns [`WebSqlError`] if the store cannot be read or holds malformed records.
    pub fn database_configurations(
        &self,
    ) -> Result<BTreeMap<String, DatabaseConfig>, WebSqlError> {
        config::all_configurations(self.store.as_ref())
    }

    /// Shallow-merge `updates` into the stored record for `name`.
    ///
    /// # Errors
    /// Returns [`WebSqlError`] if the store cannot be read or written.
    pub fn update_database_configuration(
        &self,
        name: &str,
        updates: Map<String, Value>,
    ) -> Result<(), WebSqlError> {
        config::update_configuration(self.store.as_ref(), name, updates)
    }

    /// Whether the backend connection for `name` has been opened.
    #[must_use]
    pub fn is_connected(&self, name: &str) -> bool {
        self.shared.registry.is_open(name)
    }

    /// Resolves once every unit of work queued before the call has run.
    ///
    /// A transaction queued before the call has at least started; its statements and its end
    /// are queued behind this marker.
    ///
    /// # Errors
    /// Returns [`WebSqlError::QueueClosed`] if the execution queue has stopped.
    pub async fn drain(&self) -> Result<(), WebSqlError> {
        self.shared.queue.drain().await
    }

    #[must_use]
    pub fn options(&self) -> &WebSqlOptions {
        &self.options
    }
}

impl fmt::Debug for WebSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebSql")
            .field("ready", &self.is_ready())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Fluent builder for [`WebSql`].
#[derive(Default)]
pub struct WebSqlBuilder {
    driver: Option<Arc<dyn Driver>>,
    store: Option<Arc<dyn KeyValueStore>>,
    options: WebSqlOptions,
}

impl WebSqlBuilder {
    /// Driver used to open connections. Without one the service is not ready until
    /// [`WebSql::install_driver`] is called.
    #[must_use]
    pub fn driver(mut self, driver: impl Driver + 'static) -> Self {
        self.driver = Some(Arc::new(driver));
        self
    }

    #[must_use]
    pub fn shared_driver(mut self, driver: Arc<dyn Driver>) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Where database configurations are persisted. Defaults to an in-memory store.
    #[must_use]
    pub fn config_store(mut self, store: impl KeyValueStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    #[must_use]
    pub fn options(mut self, options: WebSqlOptions) -> Self {
        self.options = options;
        self
    }

    /// Start the execution queue and assemble the service.
    ///
    /// # Errors
    /// Returns [`WebSqlError::ConfigError`] when called outside a tokio runtime.
    pub fn build(self) -> Result<WebSql, WebSqlError> {
        let registry = match self.driver {
            Some(driver) => ConnectionRegistry::with_driver(driver),
            None => ConnectionRegistry::new(),
        };
        let shared = Shared {
            queue: ExecQueue::spawn()?,
            registry: Arc::new(registry),
            next_tx: AtomicU64::new(0),
        };
        Ok(WebSql {
            shared: Arc::new(shared),
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStore::new())),
            options: self.options,
        })
    }
}
