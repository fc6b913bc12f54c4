use std::ops::Range;

use serde::Serialize;

/// The host field's text buffer and caret, as last reported to the engine.
///
/// Offsets are byte offsets. The cursor is kept within `0..=text.len()` and on
/// a char boundary; out-of-range values from the host are pulled back to the
/// nearest valid position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditingSession {
    text: String,
    cursor: usize,
}

impl EditingSession {
    pub fn new(text: impl Into<String>, cursor: usize) -> Self {
        let text = text.into();
        let cursor = clamp_cursor(&text, cursor);
        EditingSession { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

fn clamp_cursor(text: &str, cursor: usize) -> usize {
    let mut c = cursor.min(text.len());
    while !text.is_char_boundary(c) {
        c -= 1;
    }
    c
}

/// An in-progress `@query` immediately before the cursor.
///
/// `start_offset` is the byte offset of the `@`. `query` is the verbatim text
/// between the `@` and the cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionToken {
    pub start_offset: usize,
    pub query: String,
}

impl MentionToken {
    /// Offset just past the query, i.e. the cursor position the token was detected at.
    pub fn end_offset(&self) -> usize {
        self.start_offset + 1 + self.query.len()
    }

    /// Byte range covering the `@` and the query.
    pub fn span(&self) -> Range<usize> {
        self.start_offset..self.end_offset()
    }

    /// Lowercase form used when comparing against candidates.
    pub fn folded_query(&self) -> String {
        self.query.to_lowercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_clamps_cursor() {
        assert_eq!(EditingSession::new("abc", 10).cursor(), 3);
        assert_eq!(EditingSession::new("a🎉", 3).cursor(), 1);
        assert_eq!(EditingSession::new("abc", 2).cursor(), 2);
    }

    #[test]
    fn token_span() {
        let token = MentionToken {
            start_offset: 3,
            query: "Jo".into(),
        };
        assert_eq!(token.end_offset(), 6);
        assert_eq!(token.span(), 3..6);
        assert_eq!(token.folded_query(), "jo");
    }
}
