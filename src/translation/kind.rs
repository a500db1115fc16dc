use std::sync::LazyLock;

use regex::Regex;

use super::spans::blank_literals;

static INSERT_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\binsert\b").expect("insert pattern is valid"));

static WRITE_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(update|delete)\b").expect("write keyword pattern is valid")
});

/// Coarse statement classification used to decide which follow-up metadata to query.
///
/// This is a keyword heuristic over the statement text (with literal contents blanked out), not a
/// parse. A statement mentioning INSERT anywhere counts as an insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    #[must_use]
    pub fn detect(sql: &str) -> Self {
        let bare = blank_literals(sql);
        if INSERT_KEYWORD.is_match(&bare) {
            return StatementKind::Insert;
        }
        match WRITE_KEYWORD
            .captures(&bare)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .as_deref()
        {
            Some("update") => StatementKind::Update,
            Some("delete") => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    /// Whether the backend's change counter is meaningful after this statement.
    #[must_use]
    pub fn reports_changes(self) -> bool {
        !matches!(self, StatementKind::Other)
    }

    /// Whether a last-insert-id lookup should follow this statement.
    #[must_use]
    pub fn reports_insert_id(self) -> bool {
        matches!(self, StatementKind::Insert)
    }
}
