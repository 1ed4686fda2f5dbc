use engine::Yen;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
};

use crate::ui::theme::Theme;

fn color_for(amount: Yen, theme: &Theme) -> ratatui::style::Color {
    if amount.value() > 0 {
        theme.positive
    } else if amount.value() < 0 {
        theme.negative
    } else {
        theme.text
    }
}

/// Creates a styled span for a yen amount with semantic coloring.
///
/// - Positive amounts: green with `+` prefix
/// - Negative amounts: red with `-` prefix
/// - Zero: neutral text color, no sign
#[must_use]
pub fn styled_amount(amount: Yen, theme: &Theme) -> Span<'static> {
    Span::styled(
        amount.format_signed(),
        Style::default().fg(color_for(amount, theme)),
    )
}

/// Bold variant, for the amount being typed.
#[must_use]
pub fn styled_amount_bold(amount: Yen, theme: &Theme) -> Span<'static> {
    Span::styled(
        amount.format_signed(),
        Style::default()
            .fg(color_for(amount, theme))
            .add_modifier(Modifier::BOLD),
    )
}
