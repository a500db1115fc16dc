use rusqlite::types::Value;
use tokio::sync::oneshot;

use crate::driver::StatementOutput;
use crate::error::WebSqlError;

pub(super) enum Command {
    Execute {
        query: String,
        params: Vec<Value>,
        respond_to: oneshot::Sender<Result<Vec<StatementOutput>, WebSqlError>>,
    },
    Changes {
        respond_to: oneshot::Sender<Result<u64, WebSqlError>>,
    },
    Shutdown,
}
