use std::ops::Index;
use std::slice;

use super::row::Row;
use crate::types::RowValues;

/// Ordered, index-addressable rows of a result set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowList {
    rows: Vec<Row>,
}

impl RowList {
    pub(crate) fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Row at `index`, the legacy `rows.item(i)`.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, Row> {
        self.rows.iter()
    }
}

impl Index<usize> for RowList {
    type Output = Row;

    fn index(&self, index: usize) -> &Self::Output {
        &self.rows[index]
    }
}

impl<'a> IntoIterator for &'a RowList {
    type Item = &'a Row;
    type IntoIter = slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Read-only view of one statement's outcome.
///
/// `insert_id` is only meaningful after an INSERT and `rows_affected` only after an
/// INSERT/UPDATE/DELETE; both stay at zero otherwise.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub(crate) insert_id: i64,
    pub(crate) rows_affected: u64,
    pub(crate) rows: RowList,
    pub(crate) sql: String,
    pub(crate) args: Vec<RowValues>,
}

impl ResultSet {
    #[must_use]
    pub fn insert_id(&self) -> i64 {
        self.insert_id
    }

    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    #[must_use]
    pub fn rows(&self) -> &RowList {
        &self.rows
    }

    /// The statement text as sent to the backend (after quote normalization).
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn args(&self) -> &[RowValues] {
        &self.args
    }
}
