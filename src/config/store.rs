use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::WebSqlError;

/// Durable string key-value storage, the role `localStorage` plays for the legacy API.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    /// Returns [`WebSqlError`] if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, WebSqlError>;

    /// # Errors
    /// Returns [`WebSqlError`] if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), WebSqlError>;
}

/// Process-local store; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, WebSqlError> {
        let entries = self.entries.lock().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WebSqlError> {
        let mut entries = self.entries.lock().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Store persisted as one JSON object (`{"key": "value", ...}`) in a file.
///
/// The whole file is rewritten on every `set`; a missing file reads as empty.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, WebSqlError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, WebSqlError> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), WebSqlError> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&entries)?)?;
        Ok(())
    }
}

fn poisoned<E: std::fmt::Display>(err: E) -> WebSqlError {
    WebSqlError::ConfigError(format!("configuration store lock poisoned: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trip() -> Result<(), WebSqlError> {
        let store = MemoryStore::new();
        assert_eq!(store.get("k")?, None);
        store.set("k", "v")?;
        assert_eq!(store.get("k")?.as_deref(), Some("v"));
        Ok(())
    }

    #[test]
    fn file_store_survives_reopen() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("store.json");

        JsonFileStore::new(&path).set("WebSQLdbConfigs", "{}")?;
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("WebSQLdbConfigs")?.as_deref(), Some("{}"));
        assert_eq!(reopened.get("other")?, None);
        Ok(())
    }

    #[test]
    fn corrupt_file_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("store.json");
        fs::write(&path, "not json")?;
        assert!(matches!(
            JsonFileStore::new(&path).get("k"),
            Err(WebSqlError::SerializationError(_))
        ));
        Ok(())
    }
}
