// Configuration: persisted per-database records plus runtime options
//
// - options: readiness probe timing for the service
// - store: durable key-value storage the records are written to

mod options;
mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::WebSqlError;

pub use options::{WebSqlOptions, WebSqlOptionsBuilder};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};

/// Storage key holding the map of every opened database's configuration.
pub const CONFIGS_KEY: &str = "WebSQLdbConfigs";

/// Persisted description of a named database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, alias = "displayname")]
    pub display_name: String,
    #[serde(default)]
    pub size: u64,
    /// Advisory write lock. Stored for introspection only; nothing checks it before writing.
    #[serde(default)]
    pub locked: bool,
}

/// Every persisted configuration, keyed by database name.
///
/// # Errors
/// Returns [`WebSqlError`] if the store cannot be read or holds malformed JSON.
pub fn all_configurations(
    store: &dyn KeyValueStore,
) -> Result<BTreeMap<String, DatabaseConfig>, WebSqlError> {
    let Some(text) = store.get(CONFIGS_KEY)? else {
        return Ok(BTreeMap::new());
    };
    let raw: BTreeMap<String, Value> = serde_json::from_str(&text)?;
    raw.into_iter()
        .map(|(name, value)| {
            let mut config: DatabaseConfig = serde_json::from_value(value)?;
            if config.name.is_empty() {
                config.name.clone_from(&name);
            }
            Ok((name, config))
        })
        .collect()
}

/// Merge `updates` into the record for `name`, creating the record if needed.
///
/// Fields present in `updates` overwrite, every other stored field is kept. A new record starts
/// out carrying its own `name`.
///
/// # Errors
/// Returns [`WebSqlError`] if the store cannot be read or written.
pub fn update_configuration(
    store: &dyn KeyValueStore,
    name: &str,
    updates: Map<String, Value>,
) -> Result<(), WebSqlError> {
    let mut configs: Map<String, Value> = match store.get(CONFIGS_KEY)? {
        Some(text) => serde_json::from_str(&text)?,
        None => Map::new(),
    };

    match configs.get_mut(name) {
        Some(Value::Object(existing)) => existing.extend(updates),
        _ => {
            let mut record = Map::new();
            record.insert("name".into(), Value::from(name));
            record.extend(updates);
            configs.insert(name.to_string(), Value::Object(record));
        }
    }

    store.set(CONFIGS_KEY, &serde_json::to_string(&configs)?)
}

/// Record a database opening: name, version, display name and size.
///
/// # Errors
/// Returns [`WebSqlError`] if the store cannot be read or written.
pub fn record_open(
    store: &dyn KeyValueStore,
    name: &str,
    version: &str,
    display_name: &str,
    size: u64,
) -> Result<(), WebSqlError> {
    let mut updates = Map::new();
    updates.insert("name".into(), Value::from(name));
    updates.insert("version".into(), Value::from(version));
    updates.insert("displayName".into(), Value::from(display_name));
    updates.insert("size".into(), Value::from(size));
    update_configuration(store, name, updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_opens_merge_into_one_record() -> Result<(), WebSqlError> {
        let store = MemoryStore::new();
        record_open(&store, "mydb", "1.0", "Test DB", 1024)?;

        let mut lock = Map::new();
        lock.insert("locked".into(), json!(true));
        update_configuration(&store, "mydb", lock)?;

        record_open(&store, "mydb", "2.0", "Renamed", 2048)?;
        record_open(&store, "testdb", "1.0", "Other", 1)?;

        let configs = all_configurations(&store)?;
        assert_eq!(configs.len(), 2);
        assert_eq!(
            configs["mydb"],
            DatabaseConfig {
                name: "mydb".into(),
                version: "2.0".into(),
                display_name: "Renamed".into(),
                size: 2048,
                locked: true,
            }
        );
        Ok(())
    }

    #[test]
    fn stored_shape_is_camel_case_json() -> Result<(), WebSqlError> {
        let store = MemoryStore::new();
        record_open(&store, "t", "1.0", "T", 5)?;
        let stored: Value = serde_json::from_str(&store.get(CONFIGS_KEY)?.unwrap_or_default())?;
        assert_eq!(
            stored,
            json!({"t": {"name": "t", "version": "1.0", "displayName": "T", "size": 5}})
        );
        Ok(())
    }

    #[test]
    fn update_before_open_keeps_every_record_readable() -> Result<(), WebSqlError> {
        let store = MemoryStore::new();
        record_open(&store, "a", "1.0", "A", 1)?;

        let mut lock = Map::new();
        lock.insert("locked".into(), json!(true));
        update_configuration(&store, "b", lock)?;

        let configs = all_configurations(&store)?;
        assert_eq!(configs.len(), 2);
        assert_eq!(configs["a"].version, "1.0");
        assert_eq!(
            configs["b"],
            DatabaseConfig {
                name: "b".into(),
                locked: true,
                ..DatabaseConfig::default()
            }
        );

        record_open(&store, "b", "2.0", "B", 3)?;
        let b = &all_configurations(&store)?["b"];
        assert_eq!((b.version.as_str(), b.locked), ("2.0", true));
        Ok(())
    }

    #[test]
    fn record_without_name_takes_its_key() -> Result<(), WebSqlError> {
        let store = MemoryStore::new();
        store.set(CONFIGS_KEY, r#"{"bare": {"size": 7}}"#)?;
        let configs = all_configurations(&store)?;
        assert_eq!(configs["bare"].name, "bare");
        assert_eq!(configs["bare"].version, "");
        assert_eq!(configs["bare"].size, 7);
        Ok(())
    }

    #[test]
    fn legacy_lowercase_display_name_is_read() -> Result<(), WebSqlError> {
        let store = MemoryStore::new();
        store.set(
            CONFIGS_KEY,
            r#"{"old": {"name": "old", "version": "0.9", "displayname": "Old DB", "size": 10}}"#,
        )?;
        let configs = all_configurations(&store)?;
        assert_eq!(configs["old"].display_name, "Old DB");
        assert!(!configs["old"].locked);
        Ok(())
    }
}
