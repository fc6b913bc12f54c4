use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Characters that may appear in a mention query and that terminate an
/// existing mention's word boundary: letters, digits and underscore.
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when `offset` can be used to slice `s` (in range and on a char boundary).
pub fn is_valid_offset(s: &str, offset: usize) -> bool {
    offset <= s.len() && s.is_char_boundary(offset)
}

/// A grapheme cluster belongs to a word when its base character does, so a
/// decomposed `e` + U+0301 counts as one word grapheme.
pub fn is_word_grapheme(g: &str) -> bool {
    g.chars().next().is_some_and(is_word_char)
}

/// Start of the run of word graphemes that ends at `offset`. Returns `offset`
/// when the run is empty or `offset` cannot slice `s`.
pub fn word_run_start(s: &str, offset: usize) -> usize {
    s.get(..offset).map_or(offset, |prefix| {
        prefix
            .grapheme_indices(true)
            .rev()
            .take_while(|(_, g)| is_word_grapheme(g))
            .last()
            .map_or(offset, |(i, _)| i)
    })
}

/// Whether the text at `offset` continues a word: a word character starts
/// there, or `offset` falls inside a word grapheme (before a combining mark).
pub fn word_char_at(s: &str, offset: usize) -> bool {
    let Some(next) = s.get(offset..).and_then(|rest| rest.chars().next()) else {
        return false;
    };
    if is_word_char(next) {
        return true;
    }
    prev_grapheme_boundary(s, offset).is_some_and(|start| {
        next_grapheme_boundary(s, start).is_some_and(|end| end > offset)
            && is_word_grapheme(&s[start..])
    })
}

/// Display width in terminal cells. Tabs count as 4 cells.
pub fn display_width(s: &str) -> usize {
    s.graphemes(true).map(grapheme_display_width).sum()
}

/// Truncate a string to fit within `max_cells` terminal cells, appending `…` if truncated.
pub fn truncate_to_width(s: &str, max_cells: usize) -> String {
    if max_cells == 0 {
        return String::new();
    }
    if display_width(s) <= max_cells {
        return s.to_string();
    }
    let budget = max_cells - 1;
    let mut width = 0;
    let mut result = String::new();
    for grapheme in s.graphemes(true) {
        let gw = grapheme_display_width(grapheme);
        if width + gw > budget {
            break;
        }
        width += gw;
        result.push_str(grapheme);
    }
    result.push('\u{2026}');
    result
}

/// Next grapheme boundary after `byte_offset`. Returns None if at end.
pub fn next_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    let rest = s.get(byte_offset..).filter(|r| !r.is_empty())?;
    let step = rest.graphemes(true).next().map_or(rest.len(), str::len);
    Some(byte_offset + step)
}

/// Previous grapheme boundary before `byte_offset`. Returns None if at start.
pub fn prev_grapheme_boundary(s: &str, byte_offset: usize) -> Option<usize> {
    let prefix = s.get(..byte_offset).filter(|p| !p.is_empty())?;
    prefix.grapheme_indices(true).last().map(|(i, _)| i)
}

/// Convert byte offset to display column (terminal cells).
pub fn byte_offset_to_display_col(s: &str, byte_offset: usize) -> usize {
    let mut clamped = byte_offset.min(s.len());
    while !s.is_char_boundary(clamped) {
        clamped -= 1;
    }
    display_width(&s[..clamped])
}

fn grapheme_display_width(g: &str) -> usize {
    if g == "\t" {
        return 4;
    }
    UnicodeWidthStr::width(g)
}
