use std::sync::mpsc::{self, Sender};
use std::thread;

use rusqlite::Connection;
use rusqlite::types::Value;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::driver::StatementOutput;
use crate::error::WebSqlError;

use super::channel::Command;
use super::dispatcher::run_sqlite_worker;

pub(super) struct SqliteWorker {
    sender: Sender<Command>,
    label: String,
}

impl SqliteWorker {
    pub(super) fn spawn(conn: Connection, label: String) -> Result<Self, WebSqlError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let handle = Handle::try_current().ok();
        let thread_label = label.clone();
        thread::Builder::new()
            .name(format!("sqlite-worker-{label}"))
            .spawn(move || {
                let runtime_guard = handle.as_ref().map(|h| h.enter());
                run_sqlite_worker(&conn, &thread_label, &receiver);
                drop(runtime_guard);
            })
            .map_err(|err| {
                WebSqlError::ConnectionError(format!("failed to spawn SQLite worker thread: {err}"))
            })?;

        Ok(Self { sender, label })
    }

    pub(super) fn label(&self) -> &str {
        &self.label
    }

    fn send_command(&self, command: Command) -> Result<(), WebSqlError> {
        self.sender
            .send(command)
            .map_err(|_| connection_error("SQLite worker closed"))
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, WebSqlError>>) -> Command,
        drop_message: &'static str,
    ) -> Result<T, WebSqlError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(build(tx))?;
        rx.await.map_err(|_| connection_error(drop_message))?
    }

    pub(super) async fn execute(
        &self,
        query: String,
        params: Vec<Value>,
    ) -> Result<Vec<StatementOutput>, WebSqlError> {
        self.request(
            |respond_to| Command::Execute {
                query,
                params,
                respond_to,
            },
            "SQLite worker dropped while executing statement",
        )
        .await
    }

    pub(super) async fn changes(&self) -> Result<u64, WebSqlError> {
        self.request(
            |respond_to| Command::Changes { respond_to },
            "SQLite worker dropped while reading change count",
        )
        .await
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn connection_error(message: &str) -> WebSqlError {
    WebSqlError::ConnectionError(message.into())
}
