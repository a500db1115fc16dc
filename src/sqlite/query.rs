use rusqlite::fallible_iterator::FallibleIterator;
use rusqlite::types::Value;
use rusqlite::{Batch, Connection, ToSql};

use crate::driver::StatementOutput;
use crate::error::WebSqlError;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
///
/// Returns `WebSqlError` if the value cannot be read.
pub fn sqlite_extract_value_sync(row: &rusqlite::Row, idx: usize) -> Result<RowValues, WebSqlError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run every statement in `sql`, collecting one [`StatementOutput`] per statement.
///
/// `params` are bound to each statement that declares placeholders; statements without
/// placeholders run unbound.
///
/// # Errors
/// Returns `WebSqlError` on the first statement that fails to prepare, bind, or step.
pub fn run_statements(
    conn: &Connection,
    sql: &str,
    params: &[Value],
) -> Result<Vec<StatementOutput>, WebSqlError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let mut outputs = Vec::new();
    let mut batch = Batch::new(conn, sql);

    while let Some(mut stmt) = batch.next()? {
        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect();
        let bound: &[&dyn ToSql] = if stmt.parameter_count() == 0 {
            &[]
        } else {
            &param_refs
        };

        let mut rows_iter = stmt.query(bound)?;
        let mut rows = Vec::new();
        while let Some(row) = rows_iter.next()? {
            let mut row_values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                row_values.push(sqlite_extract_value_sync(row, i)?);
            }
            rows.push(row_values);
        }

        outputs.push(StatementOutput { columns, rows });
    }

    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_output_per_statement() -> Result<(), WebSqlError> {
        let conn = Connection::open_in_memory()?;
        let outputs = run_statements(
            &conn,
            "CREATE TABLE t (id INTEGER PRIMARY KEY, text); INSERT INTO t (text) VALUES (?); SELECT id, text FROM t;",
            &[Value::Text("test".into())],
        )?;

        assert_eq!(outputs.len(), 3);
        assert!(outputs[0].columns.is_empty());
        assert_eq!(outputs[2].columns, vec!["id", "text"]);
        assert_eq!(
            outputs[2].rows,
            vec![vec![RowValues::Int(1), RowValues::Text("test".into())]]
        );
        Ok(())
    }

    #[test]
    fn malformed_sql_fails() -> Result<(), WebSqlError> {
        let conn = Connection::open_in_memory()?;
        assert!(run_statements(&conn, "INVALID SQL", &[]).is_err());
        Ok(())
    }
}
