use serde::Serialize;

use crate::model::candidate::Candidate;
use crate::model::session::MentionToken;
use crate::ops::insert::Insertion;
use crate::ops::suggestions::SuggestionState;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TokenJson {
    pub start_offset: usize,
    pub end_offset: usize,
    pub query: String,
}

#[derive(Serialize)]
pub struct CandidateJson {
    pub index: usize,
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub role: String,
    pub selected: bool,
}

#[derive(Serialize)]
pub struct SuggestJson {
    pub token: Option<TokenJson>,
    pub is_open: bool,
    pub candidates: Vec<CandidateJson>,
}

#[derive(Serialize)]
pub struct InsertJson {
    pub text: String,
    pub cursor: usize,
    pub replaced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentioned: Option<String>,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn token_to_json(token: &MentionToken) -> TokenJson {
    TokenJson {
        start_offset: token.start_offset,
        end_offset: token.end_offset(),
        query: token.query.clone(),
    }
}

pub fn suggest_to_json(token: Option<&MentionToken>, state: &SuggestionState) -> SuggestJson {
    SuggestJson {
        token: token.map(token_to_json),
        is_open: state.is_open,
        candidates: state
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| CandidateJson {
                index: i,
                id: c.id.to_string(),
                display_name: c.display_name.clone(),
                email: c.email.clone(),
                role: c.role_label.clone(),
                selected: state.is_open && i == state.selected_index,
            })
            .collect(),
    }
}

pub fn insert_to_json(insertion: &Insertion, candidate: Option<&Candidate>) -> InsertJson {
    InsertJson {
        text: insertion.text.clone(),
        cursor: insertion.cursor,
        replaced: insertion.replaced,
        mentioned: candidate
            .filter(|_| insertion.replaced)
            .map(|c| c.id.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// One suggestion row: marker, index, name, role, and email when known.
pub fn format_candidate_line(index: usize, candidate: &Candidate, selected: bool) -> String {
    let marker = if selected { '>' } else { ' ' };
    let email = if candidate.email.is_empty() {
        String::new()
    } else {
        format!(" <{}>", candidate.email)
    };
    format!(
        "{} {:>2}  {} [{}]{}",
        marker,
        index,
        candidate.display_name,
        candidate.role_label.to_uppercase(),
        email
    )
}

/// The `suggest` report: the token line followed by the list.
pub fn format_suggestions(token: Option<&MentionToken>, state: &SuggestionState) -> Vec<String> {
    let mut lines = Vec::new();
    match token {
        None => {
            lines.push("no active mention".to_string());
            return lines;
        }
        Some(t) => lines.push(format!(
            "mention @{} at {}..{}",
            t.query,
            t.start_offset,
            t.end_offset()
        )),
    }
    if !state.is_open {
        lines.push("  (no suggestions)".to_string());
        return lines;
    }
    for (i, c) in state.candidates.iter().enumerate() {
        lines.push(format_candidate_line(i, c, i == state.selected_index));
    }
    lines
}
