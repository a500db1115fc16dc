use std::sync::Arc;

use super::result_set::{ResultSet, RowList};
use super::row::{Row, index_columns};
use crate::driver::StatementOutput;
use crate::types::RowValues;

/// Convert raw driver output plus statement metadata into a [`ResultSet`].
///
/// Only the first output that carries columns contributes rows; statements that produce no
/// columns (DDL, plain DML) are skipped. Column order and row order are kept exactly, and every
/// row shares one column-name list and lookup table.
#[must_use]
pub fn adapt(
    outputs: Vec<StatementOutput>,
    insert_id: i64,
    rows_affected: u64,
    sql: &str,
    args: &[RowValues],
) -> ResultSet {
    let rows = outputs
        .into_iter()
        .find(|output| !output.columns.is_empty())
        .map(|output| {
            let column_names = Arc::new(output.columns);
            let column_index = Arc::new(index_columns(&column_names));
            output
                .rows
                .into_iter()
                .map(|values| {
                    Row::with_index(Arc::clone(&column_names), Arc::clone(&column_index), values)
                })
                .collect()
        })
        .unwrap_or_default();

    ResultSet {
        insert_id,
        rows_affected,
        rows: RowList::from_rows(rows),
        sql: sql.to_string(),
        args: args.to_vec(),
    }
}
