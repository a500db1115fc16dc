use std::borrow::Cow;

mod kind;
mod spans;

pub use kind::StatementKind;
use spans::quoted_spans;

/// Rewrite every quoted literal in `sql` as a single-quoted SQL string literal.
///
/// Legacy callers freely mix `'...'` and `"..."` literals, each escaping its own delimiter by
/// doubling it. The backend only treats single-quoted text as a string, so each span is decoded
/// and re-encoded with `'` delimiters and `''` escapes:
/// ```rust
/// use websql_middleware::prelude::*;
///
/// let sql = r#"INSERT INTO t (a, b) VALUES ("a""b", 'it''s')"#;
/// assert_eq!(normalize_quotes(sql), r#"INSERT INTO t (a, b) VALUES ('a"b', 'it''s')"#);
/// ```
/// A delimiter of the other kind inside a span passes through literally. An opening delimiter
/// that is never closed starts an unterminated literal, which is left untouched along with the
/// rest of the statement, so no doubled `""` survives outside a span.
///
/// Normalizing twice gives the same text as normalizing once, for any input. Returns a borrowed
/// `Cow` when nothing changes.
#[must_use]
pub fn normalize_quotes(sql: &str) -> Cow<'_, str> {
    if !sql.contains(['\'', '"']) {
        return Cow::Borrowed(sql);
    }

    let mut out = String::with_capacity(sql.len() + 8);
    let mut cursor = 0;
    for span in quoted_spans(sql) {
        out.push_str(&sql[cursor..span.start]);
        out.push('\'');
        out.push_str(&span.content().replace('\'', "''"));
        out.push('\'');
        cursor = span.end;
    }
    out.push_str(&sql[cursor..]);

    if out == sql {
        Cow::Borrowed(sql)
    } else {
        Cow::Owned(out)
    }
}
