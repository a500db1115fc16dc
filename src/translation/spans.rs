use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// A quoted literal: either `'...'` or `"..."`, where a doubled delimiter inside the span is an
/// escaped delimiter character rather than the end of the span. An opening delimiter with no
/// closing one matches through to the end of the text without capturing.
static QUOTED_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)'([^']*(?:''[^']*)*)'|"([^"]*(?:""[^"]*)*)"|['"].*"#)
        .expect("quoted span pattern is valid")
});

/// One top-level quoted span found in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct QuotedSpan<'a> {
    /// Byte offset of the opening delimiter.
    pub(super) start: usize,
    /// Byte offset one past the closing delimiter.
    pub(super) end: usize,
    pub(super) delimiter: char,
    /// Text between the delimiters, still escaped.
    pub(super) raw: &'a str,
}

impl QuotedSpan<'_> {
    /// Literal content with the span's own escaping removed.
    pub(super) fn content(&self) -> Cow<'_, str> {
        let doubled = if self.delimiter == '\'' { "''" } else { "\"\"" };
        if self.raw.contains(doubled) {
            Cow::Owned(self.raw.replace(doubled, &doubled[..1]))
        } else {
            Cow::Borrowed(self.raw)
        }
    }
}

/// Quoted spans of `sql` in source order. An unterminated literal yields no span.
pub(super) fn quoted_spans(sql: &str) -> impl Iterator<Item = QuotedSpan<'_>> {
    QUOTED_SPAN.captures_iter(sql).filter_map(|caps| {
        let whole = caps.get(0)?;
        let (inner, delimiter) = match (caps.get(1), caps.get(2)) {
            (Some(inner), _) => (inner, '\''),
            (None, Some(inner)) => (inner, '"'),
            // Unterminated: the rest of the text is left alone.
            (None, None) => return None,
        };
        Some(QuotedSpan {
            start: whole.start(),
            end: whole.end(),
            delimiter,
            raw: inner.as_str(),
        })
    })
}

/// Replace the content of every quoted span with nothing, keeping `''` in its place.
pub(super) fn blank_literals(sql: &str) -> Cow<'_, str> {
    QUOTED_SPAN.replace_all(sql, "''")
}
