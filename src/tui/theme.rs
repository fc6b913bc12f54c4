use ratatui::style::Color;
use tracing::warn;

use crate::model::UiConfig;

/// Colors for each part of the mention editor. Keys in `[ui.colors]` use the
/// field names.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub field_text: Color,
    pub field_border: Color,
    pub status: Color,
    pub status_error: Color,
    pub popup_border: Color,
    pub suggestion: Color,
    pub selected_suggestion: Color,
    pub selected_bg: Color,
    pub role_label: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            field_text: Color::Rgb(0xB0, 0xAA, 0xFF),
            field_border: Color::Rgb(0xFB, 0x41, 0x96),
            status: Color::Rgb(0x7D, 0x78, 0xBF),
            status_error: Color::Rgb(0xFF, 0x44, 0x44),
            popup_border: Color::Rgb(0x7D, 0x78, 0xBF),
            suggestion: Color::Rgb(0xB0, 0xAA, 0xFF),
            selected_suggestion: Color::Rgb(0xFF, 0xFF, 0xFF),
            selected_bg: Color::Rgb(0x3D, 0x14, 0x38),
            role_label: Color::Rgb(0x7D, 0x78, 0xBF),
        }
    }
}

/// `#RRGGBB` to an RGB color.
fn parse_hex_color(hex: &str) -> Option<Color> {
    let digits = hex.strip_prefix('#').filter(|d| d.len() == 6)?;
    let channel = |at: usize| u8::from_str_radix(digits.get(at..at + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

impl Theme {
    /// Defaults with `[ui.colors]` overrides applied. Unknown keys and bad
    /// values are logged and skipped.
    pub fn from_config(ui: &UiConfig) -> Self {
        let mut theme = Theme::default();
        for (key, value) in &ui.colors {
            let Some(color) = parse_hex_color(value) else {
                warn!(key = %key, value = %value, "ignoring color that is not #RRGGBB");
                continue;
            };
            if let Some(slot) = theme.slot_mut(key) {
                *slot = color;
            } else {
                warn!(key = %key, "unknown color key");
            }
        }
        theme
    }

    fn slot_mut(&mut self, key: &str) -> Option<&mut Color> {
        Some(match key {
            "background" => &mut self.background,
            "field_text" => &mut self.field_text,
            "field_border" => &mut self.field_border,
            "status" => &mut self.status,
            "status_error" => &mut self.status_error,
            "popup_border" => &mut self.popup_border,
            "suggestion" => &mut self.suggestion,
            "selected_suggestion" => &mut self.selected_suggestion,
            "selected_bg" => &mut self.selected_bg,
            "role_label" => &mut self.role_label,
            _ => return None,
        })
    }
}
