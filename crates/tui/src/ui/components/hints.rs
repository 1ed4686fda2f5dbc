use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: &'static str,
    pub action: &'static str,
}

impl KeyHint {
    pub const fn new(key: &'static str, action: &'static str) -> Self {
        Self { key, action }
    }
}

/// Converts a list of key hints into styled spans for rendering.
pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(hint.key, Style::default().fg(theme.accent)));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

/// Creates a separator span for dividing hint groups.
pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

/// Common hint groups for reuse across screens.
pub mod common {
    use super::KeyHint;

    pub fn entry(queue_mode: bool) -> Vec<KeyHint> {
        vec![
            KeyHint::new("Tab", "次"),
            KeyHint::new("←→", "部類"),
            KeyHint::new("Enter", "送信"),
            KeyHint::new("^R", if queue_mode { "破棄" } else { "クリア" }),
        ]
    }

    pub fn commands() -> Vec<KeyHint> {
        vec![
            KeyHint::new("^O", "写真"),
            KeyHint::new("^B", "月額"),
            KeyHint::new("^L", "履歴"),
            KeyHint::new("^D", "ダウンロード"),
            KeyHint::new("^C", "終了"),
        ]
    }
}
