use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Error codes of the legacy database API.
///
/// The numeric values are part of the public contract: callers written against the legacy API
/// compare `error.code()` against these integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SqlErrorCode {
    /// The transaction failed for reasons unrelated to the database itself.
    Unknown = 0,
    /// The statement failed for database reasons not covered by any other code.
    Database = 1,
    /// The actual database version was not what it should be.
    Version = 2,
    /// The data returned from the database was too large.
    TooLarge = 3,
    /// Not enough remaining storage space, or the storage quota was reached.
    Quota = 4,
    /// Syntax error, placeholder/argument count mismatch, or a disallowed statement.
    Syntax = 5,
    /// An INSERT, UPDATE, or REPLACE failed due to a constraint failure.
    Constraint = 6,
    /// A lock for the transaction could not be obtained in a reasonable time.
    Timeout = 7,
}

impl SqlErrorCode {
    /// Integer code as exposed by the legacy API.
    #[must_use]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Look up a code by its legacy integer value.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            0 => Some(Self::Unknown),
            1 => Some(Self::Database),
            2 => Some(Self::Version),
            3 => Some(Self::TooLarge),
            4 => Some(Self::Quota),
            5 => Some(Self::Syntax),
            6 => Some(Self::Constraint),
            7 => Some(Self::Timeout),
            _ => None,
        }
    }

    /// Message used when an error is raised without an explicit one.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::Unknown => {
                "The transaction failed for reasons unrelated to the database itself and not covered by any other error code."
            }
            Self::Database => {
                "The statement failed for database reasons not covered by any other error code."
            }
            Self::Version => {
                "The operation failed because the actual database version was not what it should be."
            }
            Self::TooLarge => {
                "The statement failed because the data returned from the database was too large."
            }
            Self::Quota => {
                "The statement failed because there was not enough remaining storage space, or the storage quota was reached and the user declined to give more space to the database."
            }
            Self::Syntax => {
                "The statement failed because of a syntax error, or the number of arguments did not match the number of ? placeholders in the statement, or the statement tried to use a statement that is not allowed"
            }
            Self::Constraint => {
                "An INSERT, UPDATE, or REPLACE statement failed due to a constraint failure."
            }
            Self::Timeout => "A lock for the transaction could not be obtained in a reasonable time.",
        }
    }
}

impl fmt::Display for SqlErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Error delivered to legacy callbacks: a fixed code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (code {code})")]
pub struct SqlError {
    code: SqlErrorCode,
    message: String,
}

impl SqlError {
    /// Error carrying the default message for `code`.
    #[must_use]
    pub fn new(code: SqlErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
        }
    }

    #[must_use]
    pub fn with_message(code: SqlErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> SqlErrorCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<WebSqlError> for SqlError {
    fn from(err: WebSqlError) -> Self {
        SqlError::with_message(SqlErrorCode::Database, err.to_string())
    }
}

/// Errors raised by the crate's own plumbing (driver, queue, configuration).
#[derive(Debug, Error)]
pub enum WebSqlError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Execution queue is closed")]
    QueueClosed,

    #[error("Unit of work was dropped before completing")]
    WorkDropped,

    #[error("Backend was not ready after {0:?}")]
    ReadyTimeout(Duration),

    #[error("No backend driver installed")]
    NoDriver,
}
