use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::Span,
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::AppState,
    ui::{components::popup::centered_box, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let card_area = centered_box(44, 7, area);
    frame.render_widget(Clear, card_area);

    let block = Block::default()
        .title(" kakeibo ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.border));

    let inner = block.inner(card_area);
    frame.render_widget(block, card_area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Prompt
            Constraint::Length(1), // Spacer
            Constraint::Length(1), // Credentials
        ])
        .margin(1)
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "user:key を入力してください",
            Style::default().fg(theme.text_muted),
        )),
        rows[0],
    );

    let display = format!("{}│", mask_credentials(&state.login.input));
    frame.render_widget(
        Paragraph::new(Span::styled(display, Style::default().fg(theme.accent))),
        rows[2],
    );

    // Server and error message below the box
    let below = |offset: u16| Rect {
        x: card_area.x,
        y: card_area.y.saturating_add(card_area.height + offset),
        width: card_area.width,
        height: 1,
    };
    if below(2).bottom() <= area.bottom() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                state.base_url.as_str(),
                Style::default().fg(theme.text_muted),
            ))
            .alignment(Alignment::Center),
            below(0),
        );
        if let Some(message) = &state.login.message {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    message.as_str(),
                    Style::default().fg(theme.error),
                ))
                .alignment(Alignment::Center),
                below(1),
            );
        }
    }
}

/// Shows the user name and hides the key, one bullet per character.
fn mask_credentials(input: &str) -> String {
    match input.split_once(':') {
        Some((user, key)) => format!("{user}:{}", "•".repeat(key.chars().count())),
        None => input.to_string(),
    }
}
