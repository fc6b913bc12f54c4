use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Position, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::util::unicode::{byte_offset_to_display_col, display_width, truncate_to_width};

use super::app::App;

const HELP: &str = " ^R refresh  Esc close/quit";

/// First visible row when the list is scrolled to keep `selected` in view.
pub fn scroll_start(selected: usize, max_visible: usize) -> usize {
    if selected >= max_visible {
        selected + 1 - max_visible
    } else {
        0
    }
}

/// `base` moved `by` cells, saturating at the edge of the coordinate space.
fn offset_cell(base: u16, by: usize) -> u16 {
    base.saturating_add(u16::try_from(by).unwrap_or(u16::MAX))
}

/// Draw the status line, the text field, the help line, and the suggestion
/// list on top.
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let [status_area, field_area, help_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    let bg = Style::default().bg(app.theme.background);
    let dim = bg.fg(app.theme.status);

    let status_style = if app.status_error {
        bg.fg(app.theme.status_error)
    } else {
        dim
    };
    frame.render_widget(
        Paragraph::new(format!("mention \u{00B7} {}", app.status)).style(status_style),
        status_area,
    );
    frame.render_widget(Paragraph::new(HELP).style(dim), help_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Description ")
        .border_style(bg.fg(app.theme.field_border));
    let inner = block.inner(field_area);
    frame.render_widget(
        Paragraph::new(app.text.as_str())
            .style(bg.fg(app.theme.field_text))
            .block(block),
        field_area,
    );

    // Caret position within the field
    let before = &app.text[..app.cursor];
    let line_idx = before.matches('\n').count();
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let col = byte_offset_to_display_col(&app.text[line_start..], app.cursor - line_start);
    let caret = Position::new(
        offset_cell(inner.x, col).min(inner.right().saturating_sub(1)),
        offset_cell(inner.y, line_idx).min(inner.bottom().saturating_sub(1)),
    );
    frame.set_cursor_position(caret);

    app.field_area = Some(field_area);
    app.popup_area = render_suggestions(frame, app, caret, area);
}

/// Render the suggestion list just below `anchor` (or above it when there is
/// no room). Returns the area drawn, or None when the list is closed.
pub fn render_suggestions(frame: &mut Frame, app: &App, anchor: Position, bounds: Rect) -> Option<Rect> {
    let state = app.engine.current_suggestion_state();
    if !state.is_open || state.candidates.is_empty() {
        return None;
    }

    let max_visible = app.max_visible.max(1);
    let count = state.candidates.len().min(max_visible);
    let start = scroll_start(state.selected_index, max_visible);
    let visible = &state.candidates[start..(start + count).min(state.candidates.len())];

    let widest = visible
        .iter()
        .map(|c| display_width(&c.display_name) + 2 + display_width(&c.role_label))
        .max()
        .unwrap_or(10);
    // prefix + right pad + borders
    let popup_w = offset_cell(6, widest).min(bounds.width).max(12.min(bounds.width));
    let popup_h = offset_cell(2, count);

    let x = anchor.x.min(bounds.right().saturating_sub(popup_w));
    let y = if anchor.y.saturating_add(1).saturating_add(popup_h) <= bounds.bottom() {
        anchor.y.saturating_add(1)
    } else {
        anchor.y.saturating_sub(popup_h)
    };
    let popup_area = Rect::new(x, y, popup_w, popup_h).intersection(bounds);

    let bg = app.theme.background;
    let avail = (popup_area.width as usize).saturating_sub(2 + 3);

    let mut lines: Vec<Line> = Vec::new();
    for (i, candidate) in visible.iter().enumerate() {
        let is_selected = start + i == state.selected_index;
        let style = if is_selected {
            Style::default()
                .fg(app.theme.selected_suggestion)
                .bg(app.theme.selected_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.suggestion).bg(bg)
        };
        let role_style = style.fg(app.theme.role_label);

        let role = candidate.role_label.to_uppercase();
        let role_w = display_width(&role);
        let name = truncate_to_width(&candidate.display_name, avail.saturating_sub(role_w + 1));
        let gap = avail.saturating_sub(display_width(&name) + role_w);

        let prefix = if is_selected { " \u{25B8} " } else { "   " };
        lines.push(Line::from(vec![
            Span::styled(prefix, style),
            Span::styled(name, style),
            Span::styled(" ".repeat(gap), style),
            Span::styled(role, role_style),
        ]));
    }

    frame.render_widget(Clear, popup_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.popup_border).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(
        Paragraph::new(lines).block(block).style(Style::default().bg(bg)),
        popup_area,
    );
    Some(popup_area)
}
