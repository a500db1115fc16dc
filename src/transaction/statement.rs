use tracing::{debug, warn};

use super::callbacks::{ErrorAction, StatementCallbacks, guarded};
use super::{Transaction, TxPhase};
use crate::driver::StatementOutput;
use crate::error::{SqlError, SqlErrorCode, WebSqlError};
use crate::results::{ResultSet, adapt};
use crate::translation::{StatementKind, normalize_quotes};
use crate::types::RowValues;

const CALLBACK_FAILED: &str = "the statement callback raised an exception or statement error callback did not return false";
const LAST_INSERT_ROWID: &str = "SELECT last_insert_rowid()";

/// One `execute_sql` call waiting for its turn on the queue.
pub(super) struct PendingStatement {
    pub(super) sql: String,
    pub(super) args: Vec<RowValues>,
    pub(super) callbacks: StatementCallbacks,
}

impl Transaction {
    pub(super) async fn run_statement(&self, statement: PendingStatement) {
        let PendingStatement {
            sql,
            args,
            callbacks,
        } = statement;

        match self.phase() {
            TxPhase::Begun => {}
            TxPhase::Created | TxPhase::Aborted => {
                debug!(tx = self.id(), %sql, "transaction aborted, statement skipped");
                return;
            }
            TxPhase::Committed | TxPhase::RolledBack => {
                debug!(tx = self.id(), %sql, "transaction finished, statement skipped");
                if let Some(on_error) = callbacks.on_error {
                    let error = SqlError::with_message(
                        SqlErrorCode::Unknown,
                        "transaction is no longer active",
                    );
                    let tx = self.clone();
                    guarded("statement error", move || on_error(&tx, &error));
                }
                return;
            }
        }

        match self.query(&sql, &args).await {
            Ok(result) => {
                let Some(on_result) = callbacks.on_result else {
                    return;
                };
                let tx = self.clone();
                if guarded("statement result", move || on_result(&tx, &result)).is_none() {
                    self.escalate(SqlError::with_message(SqlErrorCode::Unknown, CALLBACK_FAILED));
                }
            }
            Err(err) => {
                warn!(tx = self.id(), %sql, "statement failed: {err}");
                let error = SqlError::with_message(SqlErrorCode::Syntax, err.to_string());
                let Some(on_error) = callbacks.on_error else {
                    self.escalate(error);
                    return;
                };
                let tx = self.clone();
                match guarded("statement error", move || on_error(&tx, &error)) {
                    Some(ErrorAction::Suppress) => {
                        debug!(tx = self.id(), "statement error handled by callback");
                    }
                    Some(ErrorAction::Escalate) | None => {
                        self.escalate(SqlError::with_message(
                            SqlErrorCode::Unknown,
                            CALLBACK_FAILED,
                        ));
                    }
                }
            }
        }
    }

    /// Execute one statement and shape its output the legacy way.
    async fn query(&self, sql: &str, args: &[RowValues]) -> Result<ResultSet, WebSqlError> {
        let sql = normalize_quotes(sql);
        let connection = self.connection();
        debug!(tx = self.id(), sql = %sql, args = args.len(), "executing statement");

        let outputs = connection.execute(&sql, args).await?;

        let kind = StatementKind::detect(&sql);
        let mut rows_affected = 0;
        let mut insert_id = 0;
        if kind.reports_changes() {
            rows_affected = connection.changes_since_last_statement().await?;
            if kind.reports_insert_id() {
                insert_id = last_insert_rowid(connection.execute(LAST_INSERT_ROWID, &[]).await?);
            }
        }

        Ok(adapt(outputs, insert_id, rows_affected, &sql, args))
    }
}

fn last_insert_rowid(outputs: Vec<StatementOutput>) -> i64 {
    outputs
        .into_iter()
        .next()
        .and_then(|output| output.rows.into_iter().next())
        .and_then(|row| row.into_iter().next())
        .and_then(|value| value.as_int().copied())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rowid_is_read_from_first_cell() {
        let outputs = vec![StatementOutput {
            columns: vec!["last_insert_rowid()".into()],
            rows: vec![vec![RowValues::Int(17)]],
        }];
        assert_eq!(last_insert_rowid(outputs), 17);
        assert_eq!(last_insert_rowid(Vec::new()), 0);
    }
}
