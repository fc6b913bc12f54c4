use serde::Serialize;
use tracing::debug;

use crate::model::candidate::Candidate;
use crate::model::session::MentionToken;

/// Text and caret after confirming a suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    pub text: String,
    pub cursor: usize,
    /// False when the token no longer matched the text and nothing was replaced.
    pub replaced: bool,
}

/// Whether `token` still describes `text` with the caret at `cursor`.
pub fn token_is_current(text: &str, cursor: usize, token: &MentionToken) -> bool {
    cursor == token.end_offset()
        && text.get(token.start_offset..token.start_offset + 1) == Some("@")
        && text.get(token.start_offset + 1..cursor) == Some(token.query.as_str())
}

/// Replace the `@query` span of `token` with `@<display_name> `.
///
/// Everything before the `@` and everything from `cursor` on is copied as is.
/// The caret lands right after the inserted space. If the token is stale the
/// text comes back unchanged with the caret where it was.
pub fn insert(text: &str, cursor: usize, token: &MentionToken, candidate: &Candidate) -> Insertion {
    if !token_is_current(text, cursor, token) {
        debug!(
            start = token.start_offset,
            cursor, "mention token is stale, skipping insertion"
        );
        return Insertion {
            text: text.to_string(),
            cursor,
            replaced: false,
        };
    }

    let mention = candidate.mention_text();
    let mut new_text = String::with_capacity(text.len() - token.span().len() + mention.len());
    new_text.push_str(&text[..token.start_offset]);
    new_text.push_str(&mention);
    new_text.push_str(&text[cursor..]);

    Insertion {
        text: new_text,
        cursor: token.start_offset + mention.len(),
        replaced: true,
    }
}
