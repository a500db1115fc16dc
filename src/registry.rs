use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::OnceCell;
use tracing::debug;

use crate::driver::{Connection, Driver};
use crate::error::WebSqlError;

type ConnectionCell = Arc<OnceCell<Arc<dyn Connection>>>;

/// Owns the backend driver and one lazily-opened connection per database name.
///
/// Concurrent first users of a name await the same pending initialization; a failed
/// initialization leaves the slot empty so a later caller can retry.
#[derive(Default)]
pub struct ConnectionRegistry {
    driver: RwLock<Option<Arc<dyn Driver>>>,
    connections: Mutex<HashMap<String, ConnectionCell>>,
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_driver(driver: Arc<dyn Driver>) -> Self {
        Self {
            driver: RwLock::new(Some(driver)),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Install (or replace) the driver used for connections not yet opened.
    ///
    /// # Errors
    /// Returns [`WebSqlError::ConnectionError`] if the driver lock is poisoned.
    pub fn install_driver(&self, driver: Arc<dyn Driver>) -> Result<(), WebSqlError> {
        let mut slot = self
            .driver
            .write()
            .map_err(|err| WebSqlError::ConnectionError(format!("driver lock poisoned: {err}")))?;
        *slot = Some(driver);
        Ok(())
    }

    #[must_use]
    pub fn has_driver(&self) -> bool {
        self.driver.read().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Connection for `name`, opening it through the driver on first use.
    ///
    /// # Errors
    /// Returns [`WebSqlError::NoDriver`] when no driver is installed, or whatever the driver
    /// reports when opening fails.
    pub async fn connection(&self, name: &str) -> Result<Arc<dyn Connection>, WebSqlError> {
        let cell = self.cell(name)?;
        let conn = cell
            .get_or_try_init(|| async {
                let driver = self.driver()?;
                debug!(database = name, "initializing backend connection");
                driver.open_connection(name).await
            })
            .await?;
        Ok(Arc::clone(conn))
    }

    /// Whether a connection for `name` has finished opening.
    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        self.connections
            .lock()
            .map(|map| map.get(name).is_some_and(|cell| cell.initialized()))
            .unwrap_or(false)
    }

    fn cell(&self, name: &str) -> Result<ConnectionCell, WebSqlError> {
        let mut map = self.connections.lock().map_err(|err| {
            WebSqlError::ConnectionError(format!("connection registry poisoned: {err}"))
        })?;
        Ok(Arc::clone(
            map.entry(name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        ))
    }

    fn driver(&self) -> Result<Arc<dyn Driver>, WebSqlError> {
        let slot = self
            .driver
            .read()
            .map_err(|err| WebSqlError::ConnectionError(format!("driver lock poisoned: {err}")))?;
        slot.clone().ok_or(WebSqlError::NoDriver)
    }
}
