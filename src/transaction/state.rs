use crate::error::SqlError;

/// Lifecycle of a transaction.
///
/// `Created → Begun → Committed | RolledBack`. `Aborted` is entered when the body fails or BEGIN
/// fails; an aborted transaction runs no further statements and ends in `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Created,
    Begun,
    Aborted,
    Committed,
    RolledBack,
}

impl TxPhase {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, TxPhase::Committed | TxPhase::RolledBack)
    }
}

#[derive(Debug)]
pub(super) struct TxState {
    pub(super) phase: TxPhase,
    pub(super) error: Option<SqlError>,
    /// BEGIN reached the backend, so a ROLLBACK is owed on failure.
    pub(super) began: bool,
    /// The error was raised by the body itself rather than escalated by a statement.
    pub(super) raised: bool,
}

impl TxState {
    pub(super) fn new() -> Self {
        Self {
            phase: TxPhase::Created,
            error: None,
            began: false,
            raised: false,
        }
    }

    /// Record `error` unless one is already recorded. Returns whether it was recorded.
    pub(super) fn record_error(&mut self, error: SqlError) -> bool {
        if self.error.is_some() {
            return false;
        }
        self.error = Some(error);
        true
    }

    pub(super) fn begin(&mut self) {
        self.phase = TxPhase::Begun;
        self.began = true;
    }

    pub(super) fn abort(&mut self, error: SqlError, raised: bool) {
        if self.record_error(error) {
            self.raised = raised;
        }
        if !self.phase.is_finished() {
            self.phase = TxPhase::Aborted;
        }
    }
}
