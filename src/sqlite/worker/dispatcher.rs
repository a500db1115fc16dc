use std::sync::mpsc::Receiver;

use rusqlite::Connection;
use tracing::debug;

use crate::sqlite::query::run_statements;

use super::channel::Command;

pub(super) fn run_sqlite_worker(conn: &Connection, label: &str, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Shutdown => break,
            Command::Execute {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(run_statements(conn, &query, &params));
            }
            Command::Changes { respond_to } => {
                let _ = respond_to.send(Ok(conn.changes()));
            }
        }
    }
    debug!(database = label, "sqlite worker stopped");
}
