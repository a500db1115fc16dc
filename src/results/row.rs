use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::types::RowValues;

/// One row of a result set, addressable by column name or position.
///
/// Rows of the same result set share their column names and name lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    column_names: Arc<Vec<String>>,
    values: Vec<RowValues>,
    column_index: Arc<HashMap<String, usize>>,
}

impl Row {
    /// Build a standalone row, computing its own name lookup table.
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<RowValues>) -> Self {
        let column_index = Arc::new(index_columns(&column_names));
        Self {
            column_names,
            values,
            column_index,
        }
    }

    pub(crate) fn with_index(
        column_names: Arc<Vec<String>>,
        column_index: Arc<HashMap<String, usize>>,
        values: Vec<RowValues>,
    ) -> Self {
        Self {
            column_names,
            values,
            column_index,
        }
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn values(&self) -> &[RowValues] {
        &self.values
    }

    /// Get a value by column name.
    ///
    /// When a statement yields the same column name twice, the last one wins, matching the
    /// property semantics of a legacy row object.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.column_index
            .get(column_name)
            .and_then(|&idx| self.values.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Render the row as a JSON object keyed by column name.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .column_names
            .iter()
            .zip(&self.values)
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.column_names.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> HashMap<String, usize> {
    column_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
