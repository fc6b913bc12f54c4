use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::{Position, Rect};

use crate::engine::{Key, KeyOutcome};
use crate::util::unicode::{next_grapheme_boundary, prev_grapheme_boundary};

use super::app::App;
use super::render::scroll_start;

/// Ctrl-R re-fetches the staff directory.
pub fn is_refresh(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r')
}

fn engine_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::Up => Some(Key::ArrowUp),
        KeyCode::Down => Some(Key::ArrowDown),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Esc => Some(Key::Escape),
        _ => None,
    }
}

/// Handle a key event: the engine gets first refusal, then normal editing.
pub fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q')) {
        app.should_quit = true;
        return;
    }

    if let Some(k) = engine_key(key.code)
        && app.engine.on_key_pressed(k) == KeyOutcome::Handled
    {
        app.apply_engine_events();
        return;
    }

    match key.code {
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Enter => insert_str(app, "\n"),
        KeyCode::Char(c) if !ctrl => {
            let mut buf = [0u8; 4];
            insert_str(app, c.encode_utf8(&mut buf));
        }
        KeyCode::Backspace => {
            if let Some(prev) = prev_grapheme_boundary(&app.text, app.cursor) {
                app.text.replace_range(prev..app.cursor, "");
                app.cursor = prev;
            }
        }
        KeyCode::Delete => {
            if let Some(next) = next_grapheme_boundary(&app.text, app.cursor) {
                app.text.replace_range(app.cursor..next, "");
            }
        }
        KeyCode::Left => {
            if let Some(prev) = prev_grapheme_boundary(&app.text, app.cursor) {
                app.cursor = prev;
            }
        }
        KeyCode::Right => {
            if let Some(next) = next_grapheme_boundary(&app.text, app.cursor) {
                app.cursor = next;
            }
        }
        KeyCode::Home => {
            app.cursor = app.text[..app.cursor].rfind('\n').map_or(0, |i| i + 1);
        }
        KeyCode::End => {
            app.cursor = app.text[app.cursor..]
                .find('\n')
                .map_or(app.text.len(), |i| app.cursor + i);
        }
        _ => return,
    }
    app.sync_engine();
}

fn insert_str(app: &mut App, s: &str) {
    app.text.insert_str(app.cursor, s);
    app.cursor += s.len();
}

/// Map a screen position to a suggestion index, if it hits a row of the list.
fn popup_row(app: &App, column: u16, row: u16) -> Option<usize> {
    let area = app.popup_area?;
    let inner = Rect::new(
        area.x + 1,
        area.y + 1,
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    );
    if !inner.contains(Position::new(column, row)) {
        return None;
    }
    let state = app.engine.current_suggestion_state();
    let index = scroll_start(state.selected_index, app.max_visible) + (row - inner.y) as usize;
    (index < state.candidates.len()).then_some(index)
}

/// Pointer handling. Pressing a suggestion is reported before the blur the
/// same press causes, so the list survives until the release confirms it.
pub fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if let Some(index) = popup_row(app, mouse.column, mouse.row) {
                app.engine.on_candidate_pressed(index);
            }
            let in_field = app
                .field_area
                .is_some_and(|a| a.contains(Position::new(mouse.column, mouse.row)));
            if !in_field {
                app.engine.on_blur();
            }
        }
        MouseEventKind::Up(MouseButton::Left) => match popup_row(app, mouse.column, mouse.row) {
            Some(index) => {
                app.engine.on_candidate_clicked(index);
                app.apply_engine_events();
            }
            None => app.engine.on_pointer_cancelled(),
        },
        _ => {}
    }
}
