pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Overlay, Screen};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let area = frame.area();
    match state.screen {
        Screen::Login => screens::login::render(frame, area, state),
        Screen::Entry => render_shell(frame, area, state),
    }
    components::toast::render(frame, area, state.toast.as_ref());
}

fn render_shell(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let theme = Theme::default();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Info bar
            Constraint::Min(0),    // Entry form
            Constraint::Length(1), // Bottom bar
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    screens::entry::render(frame, layout[1], state);
    render_bottom_bar(frame, layout[2], state, &theme);

    match state.overlay {
        Some(Overlay::Picture) => screens::picture::render(frame, area, state),
        Some(Overlay::Bills) => screens::bills::render(frame, area, state),
        Some(Overlay::History) => screens::history::render(frame, area, state),
        None => {}
    }
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let Some(session) = state.session.as_ref() else {
        return;
    };

    let mut spans = vec![
        Span::styled("User", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", session.me().display_name())),
        Span::styled("Server", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("履歴", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", session.history().len())),
    ];

    let busy = [
        (session.is_uploading(), "アップロード中…"),
        (session.is_sending(), "送信中…"),
        (state.downloading, "ダウンロード中…"),
    ];
    for (_, label) in busy.iter().filter(|(active, _)| *active) {
        spans.push(Span::styled(*label, Style::default().fg(theme.accent)));
        spans.push(Span::raw("  "));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let queue_mode = state
        .session
        .as_ref()
        .is_some_and(|session| session.mode() == engine::EntryMode::Queue);

    let mut parts =
        components::hints::hints_to_spans(&components::hints::common::entry(queue_mode), theme);
    parts.push(components::hints::hint_separator(theme));
    parts.extend(components::hints::hints_to_spans(
        &components::hints::common::commands(),
        theme,
    ));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
