use engine::{EntryForm, EntryMode, FormField, Member, Session, Yen, split};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

use crate::{
    app::AppState,
    ui::{components::money::styled_amount_bold, theme::Theme},
};

const LABEL_WIDTH: usize = 10;

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState) {
    let Some(session) = state.session.as_ref() else {
        return;
    };
    let theme = Theme::default();

    let title = match session.queue_counter() {
        Some(counter) => format!(" レシート  {counter} "),
        None => " 記入 ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(match session.mode() {
            EntryMode::Queue => theme.accent,
            EntryMode::Manual => theme.border,
        }));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            FormField::ORDER
                .iter()
                .map(|_| Constraint::Length(2))
                .chain(std::iter::once(Constraint::Min(0))),
        )
        .margin(1)
        .split(inner);

    let form = session.form();
    for (field, row) in FormField::ORDER.iter().zip(rows.iter()) {
        frame.render_widget(
            Paragraph::new(field_line(*field, form, session, &theme)),
            *row,
        );
    }
}

fn field_line(field: FormField, form: &EntryForm, session: &Session, theme: &Theme) -> Line<'static> {
    let focused = form.focus == field;
    let label_style = if focused {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text_muted)
    };
    let value_style = if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.text)
    };
    let cursor = if focused { "│" } else { "" };

    let mut spans = vec![Span::styled(
        format!("{:<width$}", field.label(), width = LABEL_WIDTH),
        label_style,
    )];

    match field {
        FormField::Date => spans.push(Span::styled(format!("{}{cursor}", form.date), value_style)),
        FormField::Amount => {
            spans.push(Span::styled(format!("{}{cursor}", form.amount), value_style));
            spans.extend(preview(form, session, theme));
        }
        FormField::Category => {
            let class = session
                .catalog()
                .get(&form.category)
                .map(|c| c.class.label())
                .unwrap_or("?");
            let arrows = if focused { ("‹ ", " ›") } else { ("", "") };
            spans.push(Span::styled(
                format!("{}{}{}", arrows.0, form.category, arrows.1),
                value_style,
            ));
            spans.push(Span::styled(
                format!("  {class}"),
                Style::default().fg(theme.text_muted),
            ));
        }
        FormField::Remark => {
            spans.push(Span::styled(format!("{}{cursor}", form.remark), value_style));
        }
        FormField::Registration => {
            spans.push(Span::styled(
                format!("{}{cursor}", form.registration),
                value_style,
            ));
        }
    }

    Line::from(spans)
}

/// What each member's column will receive, shown next to the amount.
fn preview(form: &EntryForm, session: &Session, theme: &Theme) -> Vec<Span<'static>> {
    let Some(amount) = form.amount.parse::<Yen>().ok().filter(|a| a.is_positive()) else {
        return Vec::new();
    };
    let Ok(class) = session.catalog().class_of(&form.category) else {
        return Vec::new();
    };

    let amounts = split(class, amount, session.me());
    let mut spans = vec![Span::raw("   →")];
    for member in Member::ALL {
        if let Some(value) = amounts.get(member) {
            spans.push(Span::raw(format!(" {} ", member.display_name())));
            spans.push(styled_amount_bold(value, theme));
        }
    }
    spans
}
