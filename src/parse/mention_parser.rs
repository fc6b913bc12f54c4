use regex::{Regex, RegexBuilder};

use crate::model::session::MentionToken;
use crate::util::unicode::{is_valid_offset, word_char_at, word_run_start};

/// Detect the mention token the cursor is currently completing.
///
/// Scans backward from `cursor` over word graphemes (letters, digits and `_`,
/// with any combining marks attached to them). The run must be
/// immediately preceded by `@`, and that `@` must sit at the start of the text
/// or after whitespace, so `user@domain` never triggers. A cursor outside the
/// text or inside a multi-byte character yields no token.
pub fn detect(text: &str, cursor: usize) -> Option<MentionToken> {
    if !is_valid_offset(text, cursor) {
        return None;
    }
    let before = &text[..cursor];

    let body_start = word_run_start(before, cursor);

    let at = body_start.checked_sub(1)?;
    // A UTF-8 continuation byte is never 0x40, so this is a char boundary
    if before.as_bytes()[at] != b'@' {
        return None;
    }

    let opens_word = before[..at].chars().next_back().is_none_or(char::is_whitespace);
    if !opens_word {
        return None;
    }

    Some(MentionToken {
        start_offset: at,
        query: before[body_start..].to_string(),
    })
}

/// Case-insensitive matcher for an already-inserted `@<name>` mention.
#[derive(Debug, Clone)]
pub struct MentionPattern {
    re: Regex,
}

impl MentionPattern {
    pub fn for_name(display_name: &str) -> Result<Self, regex::Error> {
        let re = RegexBuilder::new(&format!("@{}", regex::escape(display_name)))
            .case_insensitive(true)
            .build()?;
        Ok(MentionPattern { re })
    }

    /// Whether the mention occurs in `text` and is not followed by a further
    /// word character (`@Jo` does not count as a mention inside `@Joan`).
    pub fn occurs_in(&self, text: &str) -> bool {
        let mut from = 0;
        while let Some(m) = self.re.find_at(text, from) {
            if !word_char_at(text, m.end()) {
                return true;
            }
            // '@' is one byte, so the next char boundary is right after it
            from = m.start() + 1;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_slices_back(text: &str, cursor: usize) {
        if let Some(token) = detect(text, cursor) {
            assert_eq!(&text[token.start_offset..token.start_offset + 1], "@");
            assert_eq!(&text[token.start_offset + 1..cursor], token.query);
            assert_eq!(token.end_offset(), cursor);
        }
    }

    #[test]
    fn detects_query_at_cursor() {
        let token = detect("Hi @jo", 6).unwrap();
        assert_eq!(token.start_offset, 3);
        assert_eq!(token.query, "jo");
    }

    #[test]
    fn query_keeps_original_case() {
        let token = detect("@JoHn", 5).unwrap();
        assert_eq!(token.query, "JoHn");
        assert_eq!(token.folded_query(), "john");
    }

    #[test]
    fn empty_query_right_after_at() {
        let token = detect("Hello @", 7).unwrap();
        assert_eq!(token.start_offset, 6);
        assert_eq!(token.query, "");
    }

    #[test]
    fn at_text_start() {
        let token = detect("@a", 2).unwrap();
        assert_eq!(token.start_offset, 0);
        assert_eq!(token.query, "a");
    }

    #[test]
    fn nearest_unterminated_at_wins() {
        let token = detect("@ann @jo", 8).unwrap();
        assert_eq!(token.start_offset, 5);
        assert_eq!(token.query, "jo");
    }

    #[test]
    fn whitespace_terminates_mention() {
        assert_eq!(detect("@ann ", 5), None);
        assert_eq!(detect("@ann\tx", 6), None);
        assert_eq!(detect("@ann\nx", 6), None);
    }

    #[test]
    fn mid_word_at_does_not_trigger() {
        assert_eq!(detect("user@domain", 11), None);
        assert_eq!(detect("a@", 2), None);
        assert_eq!(detect("@@x", 3), None);
    }

    #[test]
    fn punctuation_breaks_the_query() {
        assert_eq!(detect("@jo.hn", 6), None);
        assert_eq!(detect("@jo-", 4), None);
    }

    #[test]
    fn plain_text_has_no_token() {
        assert_eq!(detect("hello world", 5), None);
        assert_eq!(detect("", 0), None);
    }

    #[test]
    fn cursor_in_middle_of_token() {
        // Only the text before the cursor counts
        let token = detect("ping @johnny now", 8).unwrap();
        assert_eq!(token.start_offset, 5);
        assert_eq!(token.query, "jo");
    }

    #[test]
    fn malformed_cursor_is_no_mention() {
        assert_eq!(detect("@jo", 4), None);
        assert_eq!(detect("@jö", 3), None); // inside 'ö'
        assert_eq!(detect("@", usize::MAX), None);
    }

    #[test]
    fn unicode_query() {
        let token = detect("cc @Zoë", "cc @Zoë".len()).unwrap();
        assert_eq!(token.query, "Zoë");
    }

    #[test]
    fn decomposed_accent_stays_in_query() {
        let text = "cc @Jose\u{0301}";
        let token = detect(text, text.len()).unwrap();
        assert_eq!(token.start_offset, 3);
        assert_eq!(token.query, "Jose\u{0301}");
    }

    #[test]
    fn detected_tokens_slice_back_into_text() {
        let texts = ["Hi @jo", "@ann @jo", "a @ b @c_d9", "x@y @Zoë z", "@", "@Jose\u{0301}"];
        for text in texts {
            for cursor in 0..=text.len() {
                assert_slices_back(text, cursor);
            }
        }
    }

    #[test]
    fn pattern_requires_word_boundary() {
        let john = MentionPattern::for_name("John").unwrap();
        assert!(john.occurs_in("hi @John"));
        assert!(john.occurs_in("hi @john, welcome"));
        assert!(!john.occurs_in("hi @Johnny"));
        assert!(!john.occurs_in("hi John"));
        assert!(john.occurs_in("@Johnny and @JOHN."));

        let jose = MentionPattern::for_name("Jose").unwrap();
        assert!(!jose.occurs_in("@Jose\u{0301} "));
        assert!(jose.occurs_in("@Jose "));
    }

    #[test]
    fn pattern_escapes_regex_metacharacters() {
        let p = MentionPattern::for_name("A.B (ops)").unwrap();
        assert!(p.occurs_in("see @a.b (ops) "));
        assert!(!p.occurs_in("see @axb (ops) "));
    }
}
