//! Host-agnostic mention autocomplete state machine.
//!
//! A host text field reports every edit with [`MentionEngine::on_text_changed`],
//! forwards navigation keys and pointer activity, and applies the
//! [`EngineEvent::TextReplaced`] events it drains back to its own buffer.
//! Nothing here blocks: directory fetches run wherever the host likes and are
//! handed back through [`MentionEngine::on_refresh_completed`].

use std::collections::VecDeque;

use tracing::debug;

use crate::io::source::{FetchError, MentionSource};
use crate::model::candidate::{CandidateId, StaffRecord};
use crate::model::config::DirectoryConfig;
use crate::model::session::{EditingSession, MentionToken};
use crate::ops::directory::{CandidateDirectory, RefreshOutcome, RefreshTicket};
use crate::ops::insert::{Insertion, insert};
use crate::ops::suggestions::{Direction, SuggestionListController, SuggestionState};
use crate::parse::detect;

/// Keys the engine reacts to while the suggestion list is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    Enter,
    Tab,
    Escape,
}

/// Whether the host should still run its default action for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The engine used the key; suppress the default (newline, focus change, ...).
    Handled,
    PassThrough,
}

/// Outbound notifications for the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Replace the field's text and move the caret to `cursor`.
    TextReplaced { text: String, cursor: usize },
}

#[derive(Debug)]
pub struct MentionEngine {
    directory: CandidateDirectory,
    session: EditingSession,
    token: Option<MentionToken>,
    suggestions: SuggestionListController,
    /// Set by Escape or blur; cleared by the next edit.
    dismissed: bool,
    /// Pointer is down over a suggestion; a blur now must not close the list.
    pending_click: bool,
    events: VecDeque<EngineEvent>,
}

impl MentionEngine {
    pub fn new(directory: CandidateDirectory) -> Self {
        MentionEngine {
            directory,
            session: EditingSession::default(),
            token: None,
            suggestions: SuggestionListController::new(),
            dismissed: false,
            pending_click: false,
            events: VecDeque::new(),
        }
    }

    pub fn from_config(config: &DirectoryConfig) -> Self {
        let excluded = config.current_user.as_deref().map(CandidateId::from);
        Self::new(CandidateDirectory::new(excluded).with_fallback_role(&config.fallback_role))
    }

    pub fn directory(&self) -> &CandidateDirectory {
        &self.directory
    }

    pub fn session(&self) -> &EditingSession {
        &self.session
    }

    pub fn active_token(&self) -> Option<&MentionToken> {
        self.token.as_ref()
    }

    pub fn current_suggestion_state(&self) -> &SuggestionState {
        self.suggestions.state()
    }

    // -----------------------------------------------------------------------
    // Directory

    /// Start a directory refresh; pass the ticket back with the fetch result.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.directory.begin_refresh()
    }

    /// Apply a finished fetch and re-evaluate against the text as it is now.
    pub fn on_refresh_completed(
        &mut self,
        ticket: &RefreshTicket,
        result: Result<Vec<StaffRecord>, FetchError>,
    ) -> RefreshOutcome {
        let outcome = self.directory.complete_refresh(ticket, result);
        if matches!(outcome, RefreshOutcome::Applied { .. }) {
            self.reevaluate();
        }
        outcome
    }

    /// Fetch from `source` on the calling thread and apply the result.
    pub fn refresh_from(&mut self, source: &dyn MentionSource) -> RefreshOutcome {
        let ticket = self.begin_refresh();
        let result = source.fetch_mentionable_users();
        self.on_refresh_completed(&ticket, result)
    }

    // -----------------------------------------------------------------------
    // Inbound events

    /// Every keystroke or paste. Offsets outside the text, or inside a
    /// character, leave no active mention.
    pub fn on_text_changed(&mut self, text: &str, cursor: usize) -> &SuggestionState {
        self.token = detect(text, cursor);
        self.session = EditingSession::new(text, cursor);
        self.dismissed = false;
        self.pending_click = false;
        self.reevaluate();
        self.suggestions.state()
    }

    pub fn on_key_pressed(&mut self, key: Key) -> KeyOutcome {
        if !self.suggestions.state().is_open {
            return KeyOutcome::PassThrough;
        }
        match key {
            Key::ArrowUp => {
                self.suggestions.move_selection(Direction::Up);
            }
            Key::ArrowDown => {
                self.suggestions.move_selection(Direction::Down);
            }
            Key::Enter | Key::Tab => {
                let index = self.suggestions.state().selected_index;
                self.confirm(index);
            }
            Key::Escape => {
                self.dismiss();
            }
        }
        KeyOutcome::Handled
    }

    /// Pointer went down over suggestion `index`. Must be reported before the
    /// blur the same gesture causes.
    pub fn on_candidate_pressed(&mut self, index: usize) {
        if index < self.suggestions.state().candidates.len() && self.suggestions.state().is_open {
            self.pending_click = true;
        }
    }

    /// Pointer went up outside the list after a press.
    pub fn on_pointer_cancelled(&mut self) {
        self.pending_click = false;
    }

    pub fn on_candidate_clicked(&mut self, index: usize) -> Option<Insertion> {
        self.pending_click = false;
        self.confirm(index)
    }

    pub fn on_blur(&mut self) {
        if self.pending_click {
            debug!("blur while a suggestion is pressed, keeping list open");
            return;
        }
        self.dismiss();
    }

    /// The field is gone. Late directory data will be discarded.
    pub fn unmount(&mut self) {
        self.directory.unmount();
        self.suggestions.close();
        self.token = None;
        self.events.clear();
    }

    // -----------------------------------------------------------------------
    // Outbound

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        self.events.drain(..).collect()
    }

    // -----------------------------------------------------------------------

    fn confirm(&mut self, index: usize) -> Option<Insertion> {
        let candidate = self.suggestions.confirm(index)?;
        let token = self.token.as_ref()?;
        let insertion = insert(self.session.text(), self.session.cursor(), token, &candidate);
        if insertion.replaced {
            debug!(id = %candidate.id, "mention inserted");
            self.events.push_back(EngineEvent::TextReplaced {
                text: insertion.text.clone(),
                cursor: insertion.cursor,
            });
            self.on_text_changed(&insertion.text, insertion.cursor);
        }
        Some(insertion)
    }

    fn dismiss(&mut self) {
        self.dismissed = true;
        self.pending_click = false;
        self.suggestions.close();
    }

    fn reevaluate(&mut self) {
        if self.dismissed || !self.directory.is_alive() {
            self.suggestions.close();
            return;
        }
        let snapshot = self.directory.snapshot();
        self.suggestions
            .update(self.token.as_ref(), &snapshot, self.session.text());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::source::StaticSource;
    use pretty_assertions::assert_eq;

    fn record(id: &str, name: &str) -> StaffRecord {
        StaffRecord::new(id, name)
    }

    fn staff() -> StaticSource {
        StaticSource::new(vec![
            record("me", "Morgan"),
            record("u2", "Ann"),
            record("u3", "John"),
            record("u4", "Joan"),
        ])
    }

    fn engine() -> MentionEngine {
        let mut engine = MentionEngine::new(CandidateDirectory::new(Some("me".into())));
        engine.refresh_from(&staff());
        engine
    }

    fn names(engine: &MentionEngine) -> Vec<String> {
        engine
            .current_suggestion_state()
            .candidates
            .iter()
            .map(|c| c.display_name.clone())
            .collect()
    }

    #[test]
    fn typing_opens_filtered_list_without_self() {
        let mut engine = engine();
        engine.on_text_changed("@", 1);
        assert_eq!(names(&engine), vec!["Ann", "John", "Joan"]);
        engine.on_text_changed("@jo", 3);
        assert_eq!(names(&engine), vec!["John", "Joan"]);
    }

    #[test]
    fn keys_pass_through_when_closed() {
        let mut engine = engine();
        engine.on_text_changed("hello", 5);
        assert_eq!(engine.on_key_pressed(Key::Enter), KeyOutcome::PassThrough);
        assert_eq!(engine.on_key_pressed(Key::ArrowDown), KeyOutcome::PassThrough);
    }

    #[test]
    fn enter_inserts_selected_candidate() {
        let mut engine = engine();
        engine.on_text_changed("Hi @jo", 6);
        assert_eq!(engine.on_key_pressed(Key::ArrowDown), KeyOutcome::Handled);
        assert_eq!(engine.on_key_pressed(Key::Enter), KeyOutcome::Handled);

        assert_eq!(
            engine.drain_events(),
            vec![EngineEvent::TextReplaced {
                text: "Hi @Joan ".into(),
                cursor: 9,
            }]
        );
        assert!(!engine.current_suggestion_state().is_open);
        assert_eq!(engine.session().text(), "Hi @Joan ");
    }

    #[test]
    fn tab_confirms_like_enter() {
        let mut engine = engine();
        engine.on_text_changed("@an", 3);
        engine.on_key_pressed(Key::Tab);
        assert_eq!(engine.session().text(), "@Ann ");
        assert_eq!(engine.session().cursor(), 5);
    }

    #[test]
    fn inserted_mention_is_not_suggested_again() {
        let mut engine = engine();
        engine.on_text_changed("@jo", 3);
        engine.on_key_pressed(Key::Enter);
        engine.on_text_changed("@John @", 7);
        assert_eq!(names(&engine), vec!["Ann", "Joan"]);
    }

    #[test]
    fn escape_dismisses_until_next_edit() {
        let mut engine = engine();
        engine.on_text_changed("@j", 2);
        assert_eq!(engine.on_key_pressed(Key::Escape), KeyOutcome::Handled);
        assert!(!engine.current_suggestion_state().is_open);

        engine.on_text_changed("@jo", 3);
        assert!(engine.current_suggestion_state().is_open);
    }

    #[test]
    fn refresh_after_dismiss_does_not_reopen() {
        let mut engine = MentionEngine::new(CandidateDirectory::new(None));
        let ticket = engine.begin_refresh();
        engine.on_text_changed("@", 1);
        engine.on_blur();

        engine.on_refresh_completed(&ticket, staff().fetch_mentionable_users());
        assert!(!engine.current_suggestion_state().is_open);
    }

    #[test]
    fn refresh_resolving_mid_mention_opens_list() {
        let mut engine = MentionEngine::new(CandidateDirectory::new(Some("me".into())));
        let ticket = engine.begin_refresh();
        engine.on_text_changed("Hello @", 7);
        assert!(engine.active_token().is_some());
        assert!(!engine.current_suggestion_state().is_open);

        engine.on_refresh_completed(&ticket, staff().fetch_mentionable_users());
        assert_eq!(names(&engine), vec!["Ann", "John", "Joan"]);
    }

    #[test]
    fn refresh_after_cursor_left_mention_stays_closed() {
        let mut engine = MentionEngine::new(CandidateDirectory::new(None));
        let ticket = engine.begin_refresh();
        engine.on_text_changed("@jo", 3);
        engine.on_text_changed("@jo ", 4);

        engine.on_refresh_completed(&ticket, staff().fetch_mentionable_users());
        assert!(!engine.current_suggestion_state().is_open);
    }

    #[test]
    fn refresh_after_unmount_is_ignored() {
        let mut engine = MentionEngine::new(CandidateDirectory::new(None));
        let ticket = engine.begin_refresh();
        engine.on_text_changed("@", 1);
        engine.unmount();

        let outcome = engine.on_refresh_completed(&ticket, staff().fetch_mentionable_users());
        assert!(matches!(outcome, RefreshOutcome::Discarded(_)));
        assert!(engine.directory().snapshot().is_empty());
        assert!(!engine.current_suggestion_state().is_open);
    }

    #[test]
    fn press_then_blur_then_click_inserts() {
        let mut engine = engine();
        engine.on_text_changed("cc @", 4);
        engine.on_candidate_pressed(2);
        engine.on_blur();
        assert!(engine.current_suggestion_state().is_open);

        let insertion = engine.on_candidate_clicked(2).unwrap();
        assert_eq!(insertion.text, "cc @Joan ");
        assert_eq!(engine.drain_events().len(), 1);
    }

    #[test]
    fn blur_without_press_closes() {
        let mut engine = engine();
        engine.on_text_changed("@", 1);
        engine.on_blur();
        assert!(!engine.current_suggestion_state().is_open);
        assert_eq!(engine.on_candidate_clicked(0), None);
    }

    #[test]
    fn cancelled_press_lets_blur_close() {
        let mut engine = engine();
        engine.on_text_changed("@", 1);
        engine.on_candidate_pressed(0);
        engine.on_pointer_cancelled();
        engine.on_blur();
        assert!(!engine.current_suggestion_state().is_open);
    }

    #[test]
    fn out_of_range_click_is_ignored() {
        let mut engine = engine();
        engine.on_text_changed("@", 1);
        engine.on_candidate_pressed(7);
        assert_eq!(engine.on_candidate_clicked(7), None);
        assert!(engine.drain_events().is_empty());
        assert!(engine.current_suggestion_state().is_open);
    }

    #[test]
    fn malformed_cursor_means_no_mention() {
        let mut engine = engine();
        let state = engine.on_text_changed("@jo", 42);
        assert!(!state.is_open);
        assert_eq!(engine.active_token(), None);
    }

    #[test]
    fn from_config_excludes_current_user() {
        let config = DirectoryConfig {
            current_user: Some("u2".into()),
            ..Default::default()
        };
        let mut engine = MentionEngine::from_config(&config);
        engine.refresh_from(&staff());
        engine.on_text_changed("@", 1);
        assert_eq!(names(&engine), vec!["Morgan", "John", "Joan"]);
    }
}
