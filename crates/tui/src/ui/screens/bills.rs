use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState},
};

use crate::{
    app::AppState,
    ui::{components::popup::centered_box, theme::Theme},
};

/// Bill dialog: picking a bill writes its name into the remark.
pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let Some(session) = state.session.as_ref() else {
        return;
    };
    let theme = Theme::default();
    let bills = session.bills().bills();

    let height = (bills.len() as u16).saturating_add(2);
    let popup = centered_box(30, height, area);
    frame.render_widget(Clear, popup);

    let items: Vec<ListItem<'_>> = bills
        .iter()
        .enumerate()
        .map(|(i, bill)| ListItem::new(Line::from(format!("{}. {bill}", i + 1))))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" 月額 ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(theme.accent)),
        )
        .style(Style::default().fg(theme.text))
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut list_state = ListState::default().with_selected(Some(state.bill_selected));
    frame.render_stateful_widget(list, popup, &mut list_state);
}
