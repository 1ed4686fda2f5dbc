use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::{
    app::AppState,
    ui::{
        components::{
            hints::{KeyHint, hints_to_spans},
            popup::centered_box,
        },
        theme::Theme,
    },
};

/// Prompt for the path of a receipt picture to upload.
pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();
    let popup = centered_box(64, 6, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" 写真 ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(
        Paragraph::new(Span::styled(
            "レシート画像のパス",
            Style::default().fg(theme.text_muted),
        )),
        rows[0],
    );
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("{}│", state.picture_path),
            Style::default().fg(theme.accent),
        )),
        rows[1],
    );
    let hints = [
        KeyHint::new("Enter", "アップロード"),
        KeyHint::new("Esc", "閉じる"),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(hints_to_spans(&hints, &theme))),
        rows[3],
    );
}
