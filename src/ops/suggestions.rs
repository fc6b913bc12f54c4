use serde::Serialize;

use crate::model::candidate::Candidate;
use crate::model::session::MentionToken;
use crate::ops::directory::DirectorySnapshot;

/// Direction for moving the highlighted suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// What the host renders: whether the list is shown, its rows, and the highlight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SuggestionState {
    pub is_open: bool,
    pub candidates: Vec<Candidate>,
    pub selected_index: usize,
}

impl SuggestionState {
    pub fn closed() -> Self {
        SuggestionState::default()
    }

    /// The highlighted candidate, if the list is open.
    pub fn selected(&self) -> Option<&Candidate> {
        if !self.is_open {
            return None;
        }
        self.candidates.get(self.selected_index)
    }
}

/// Candidates for `token`, in directory order.
///
/// A candidate is kept when its name or email contains the query
/// (case-insensitively) and it is not already mentioned in `full_text`.
pub fn filter_candidates(
    token: &MentionToken,
    directory: &DirectorySnapshot,
    full_text: &str,
) -> Vec<Candidate> {
    let query = token.folded_query();
    directory
        .entries()
        .filter(|e| e.candidate.matches_query(&query))
        .filter(|e| !e.is_mentioned_in(full_text))
        .map(|e| e.candidate.clone())
        .collect()
}

/// Owns the suggestion list and the keyboard-navigable highlight.
#[derive(Debug, Clone, Default)]
pub struct SuggestionListController {
    state: SuggestionState,
}

impl SuggestionListController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    /// Recompute the list. The highlight always restarts at the top, so equal
    /// inputs give equal states.
    pub fn update(
        &mut self,
        token: Option<&MentionToken>,
        directory: &DirectorySnapshot,
        full_text: &str,
    ) -> &SuggestionState {
        let candidates = match token {
            Some(t) => filter_candidates(t, directory, full_text),
            None => Vec::new(),
        };
        self.state = SuggestionState {
            is_open: !candidates.is_empty(),
            candidates,
            selected_index: 0,
        };
        &self.state
    }

    /// Move the highlight one row, stopping at either end.
    pub fn move_selection(&mut self, direction: Direction) -> &SuggestionState {
        if self.state.is_open {
            let last = self.state.candidates.len().saturating_sub(1);
            self.state.selected_index = match direction {
                Direction::Up => self.state.selected_index.saturating_sub(1),
                Direction::Down => (self.state.selected_index + 1).min(last),
            };
        }
        &self.state
    }

    /// The candidate at `index`, or None if the list is closed or the index is out of range.
    pub fn confirm(&self, index: usize) -> Option<Candidate> {
        if !self.state.is_open {
            return None;
        }
        self.state.candidates.get(index).cloned()
    }

    pub fn close(&mut self) {
        self.state = SuggestionState::closed();
    }
}
