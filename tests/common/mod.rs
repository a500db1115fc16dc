#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use websql_middleware::prelude::*;

pub type Log = Arc<Mutex<Vec<String>>>;

/// Connection that records every statement it receives and fails any statement containing
/// one of `fail_on`.
pub struct RecordingConnection {
    log: Log,
    fail_on: Vec<&'static str>,
    delay: Duration,
}

#[async_trait]
impl Connection for RecordingConnection {
    async fn execute(
        &self,
        sql: &str,
        _args: &[RowValues],
    ) -> Result<Vec<StatementOutput>, WebSqlError> {
        tokio::time::sleep(self.delay).await;
        self.log.lock().unwrap().push(sql.to_string());
        if self.fail_on.iter().any(|token| sql.contains(token)) {
            return Err(WebSqlError::ExecutionError(format!(
                "near \"{sql}\": syntax error"
            )));
        }
        Ok(Vec::new())
    }

    async fn changes_since_last_statement(&self) -> Result<u64, WebSqlError> {
        Ok(1)
    }
}

pub struct RecordingDriver {
    log: Log,
    fail_on: Vec<&'static str>,
    delay: Duration,
}

impl RecordingDriver {
    pub fn new(log: &Log) -> Self {
        Self {
            log: Arc::clone(log),
            fail_on: vec!["FAIL"],
            delay: Duration::from_millis(1),
        }
    }

    pub fn failing_on(mut self, token: &'static str) -> Self {
        self.fail_on.push(token);
        self
    }
}

#[async_trait]
impl Driver for RecordingDriver {
    async fn open_connection(&self, _name: &str) -> Result<Arc<dyn Connection>, WebSqlError> {
        Ok(Arc::new(RecordingConnection {
            log: Arc::clone(&self.log),
            fail_on: self.fail_on.clone(),
            delay: self.delay,
        }))
    }
}

pub fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Statement callbacks that push every result set into `sink`.
pub fn collect_into(sink: &Arc<Mutex<Vec<ResultSet>>>) -> StatementCallbacks {
    let sink = Arc::clone(sink);
    StatementCallbacks::new().on_result(move |_tx, rs| sink.lock().unwrap().push(rs.clone()))
}

/// Transaction callbacks counting `on_error` and `on_success` calls; errors are kept.
#[derive(Clone, Default)]
pub struct Tally {
    pub errors: Arc<Mutex<Vec<SqlError>>>,
    pub successes: Arc<Mutex<usize>>,
}

impl Tally {
    pub fn callbacks(&self) -> TransactionCallbacks {
        let errors = Arc::clone(&self.errors);
        let successes = Arc::clone(&self.successes);
        TransactionCallbacks::new()
            .on_error(move |err| errors.lock().unwrap().push(err))
            .on_success(move || *successes.lock().unwrap() += 1)
    }

    pub fn errors(&self) -> Vec<SqlError> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> usize {
        *self.successes.lock().unwrap()
    }
}
