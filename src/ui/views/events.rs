//! Events page: the listing table plus the detail panel.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, EventDetailView, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_event_list(frame, app, chunks[0]);
    render_event_detail(frame, app, chunks[1]);
}

fn render_event_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Date"),
        Cell::from("Address"),
    ])
    .style(styles::title_style())
    .height(1);

    let sorted_events = app.get_sorted_events();

    let rows: Vec<Row> = sorted_events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let style = if i == app.event_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };

            Row::new(vec![
                Cell::from(event.name.as_str()),
                Cell::from(event.formatted_date()),
                Cell::from(event.address.as_str()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Length(14),
        Constraint::Fill(1),
    ];

    let title = if app.events_loading {
        " Events (loading...) ".to_string()
    } else if app.filter.is_empty() {
        format!(" Events ({}) - sort: [n]ame [t]ime [a]ddress ", app.events.len())
    } else {
        format!(" Events ({}) - filtered, [/] to change ", app.events.len())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.event_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_event_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    match app.event_detail_view {
        EventDetailView::Details => render_details_view(frame, app, area, focused),
        EventDetailView::Participants => render_participants_view(frame, app, area, focused),
    }
}

fn render_details_view(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let content = match &app.selected_event {
        Some(event) => {
            let mut lines = vec![
                Line::from(Span::styled(event.title.clone(), styles::title_style())),
                Line::from(""),
                Line::from(vec![
                    Span::styled("When:     ", styles::muted_style()),
                    Span::raw(event.formatted_datetime()),
                ]),
                Line::from(vec![
                    Span::styled("Where:    ", styles::muted_style()),
                    Span::raw(event.event_address.clone()),
                ]),
            ];

            if !event.vk_link.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled("VK:       ", styles::muted_style()),
                    Span::raw(event.vk_link.clone()),
                ]));
            }
            if !event.tg_link.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled("Telegram: ", styles::muted_style()),
                    Span::raw(event.tg_link.clone()),
                ]));
            }

            lines.push(Line::from(""));

            let description = event.description.trim();
            if !description.is_empty() {
                lines.push(Line::from(Span::styled(
                    "Description",
                    styles::highlight_style(),
                )));
                for line in wrap_text(description, (area.width as usize).saturating_sub(4)) {
                    lines.push(Line::from(line));
                }
                lines.push(Line::from(""));
            }

            if event.is_owned_by(app.signed_in_user_id()) {
                lines.push(Line::from(Span::styled(
                    "Your event - [e]dit | [x] delete",
                    styles::muted_style(),
                )));
            } else {
                lines.push(Line::from(Span::styled(
                    "[r] register for this event",
                    styles::muted_style(),
                )));
            }

            lines
        }
        None => vec![Line::from(Span::styled(
            "Press Enter on an event to load its details",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(content).block(block), area);
}

fn render_participants_view(frame: &mut Frame, app: &App, area: Rect, focused: bool) {
    let mut lines = vec![];

    if let Some(event) = &app.selected_event {
        lines.push(Line::from(Span::styled(
            event.title.clone(),
            styles::title_style(),
        )));
    }
    lines.push(Line::from(Span::styled(
        "Press Esc or 'd' to go back",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    if app.participants.is_empty() {
        lines.push(Line::from(Span::styled(
            "No one has registered yet",
            styles::muted_style(),
        )));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Registered ({})", app.participants.len()),
            styles::highlight_style(),
        )));
        for user in &app.participants {
            lines.push(Line::from(vec![
                Span::styled("  - ", styles::muted_style()),
                Span::raw(user.full_name()),
                Span::styled(format!("  <{}>", user.email), styles::muted_style()),
            ]));
        }
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

pub(super) fn wrap_text(s: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in s.split_whitespace() {
        if current_line.is_empty() {
            current_line = word.to_string();
        } else if current_line.len() + 1 + word.len() <= max_width {
            current_line.push(' ');
            current_line.push_str(word);
        } else {
            lines.push(current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_at_word_boundaries() {
        let wrapped = wrap_text("one two three four", 9);
        assert_eq!(wrapped, vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_of_empty_text_is_empty() {
        assert!(wrap_text("   ", 10).is_empty());
    }
}
