use engine::{HistoryRow, Member, RowStatus};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::{
    app::{AppState, history_row_index},
    ui::{
        components::{
            hints::{KeyHint, hints_to_spans},
            money::styled_amount,
            popup::centered_box,
        },
        theme::Theme,
    },
};

/// Entries sent during this session, newest first.
pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let Some(session) = state.session.as_ref() else {
        return;
    };
    let theme = Theme::default();
    let history = session.history();

    let height = (history.len() as u16).clamp(1, 12).saturating_add(4);
    let popup = centered_box(64, height, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .title(" 履歴 ")
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(theme.accent));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    if history.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "まだ送信していません",
                Style::default().fg(theme.text_muted),
            )),
            rows[0],
        );
    } else {
        let items: Vec<ListItem<'_>> = (0..history.len())
            .filter_map(|line| history_row_index(history.len(), line))
            .filter_map(|index| history.get(index))
            .map(|row| ListItem::new(row_line(row, session.me(), &theme)))
            .collect();

        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut list_state = ListState::default().with_selected(Some(state.history_selected));
        frame.render_stateful_widget(list, rows[0], &mut list_state);
    }

    let hints = [
        KeyHint::new("↑↓", "選択"),
        KeyHint::new("Enter", "取消"),
        KeyHint::new("d", "ダウンロード"),
        KeyHint::new("Esc", "閉じる"),
    ];
    frame.render_widget(
        Paragraph::new(Line::from(hints_to_spans(&hints, &theme))),
        rows[1],
    );
}

fn row_line(row: &HistoryRow, me: Member, theme: &Theme) -> Line<'static> {
    let muted = Style::default().fg(theme.text_muted);
    let mut spans = vec![
        Span::raw(format!("{:<7}", row.date_label())),
        Span::raw(format!("{}  ", row.entry.category)),
        styled_amount(row.amount(me), theme),
        Span::raw("  "),
        Span::styled(row.entry.remark.clone(), muted),
    ];
    match row.status {
        RowStatus::Sent => {}
        RowStatus::Withdrawing => spans.push(Span::styled("  取消中…", muted)),
        RowStatus::Withdrawn => {
            for span in &mut spans {
                span.style = span.style.add_modifier(Modifier::CROSSED_OUT);
            }
            spans.push(Span::styled("  取消済", muted));
        }
    }
    Line::from(spans)
}
