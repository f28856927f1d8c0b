//! Profile page: the signed-in user's info and the events they joined.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.is_authenticated() {
        let message = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  You are not signed in.",
                styles::muted_style(),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("  [l] ", styles::help_key_style()),
                Span::styled("sign in    ", styles::help_desc_style()),
                Span::styled("[s] ", styles::help_key_style()),
                Span::styled("create an account", styles::help_desc_style()),
            ]),
        ])
        .block(Block::default().borders(Borders::ALL).border_style(styles::border_style(false)));
        frame.render_widget(message, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(area);

    render_user_info(frame, app, chunks[0]);
    render_my_events(frame, app, chunks[1]);
}

fn render_user_info(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match &app.profile {
        Some(profile) => vec![
            Line::from(vec![
                Span::styled("Name:  ", styles::muted_style()),
                Span::styled(profile.user.full_name(), styles::title_style()),
            ]),
            Line::from(vec![
                Span::styled("Email: ", styles::muted_style()),
                Span::raw(profile.user.email.clone()),
            ]),
            Line::from(""),
            Line::from(Span::styled("[o] sign out", styles::muted_style())),
        ],
        None if app.profile_loading => {
            vec![Line::from(Span::styled("Loading profile...", styles::muted_style()))]
        }
        None => vec![Line::from(Span::styled(
            "Profile unavailable",
            styles::error_style(),
        ))],
    };

    let block = Block::default()
        .title(" Profile ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_my_events(frame: &mut Frame, app: &App, area: Rect) {
    let events = app
        .profile
        .as_ref()
        .map(|p| p.events.as_slice())
        .unwrap_or_default();

    if events.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            "You have not registered for any events yet",
            styles::muted_style(),
        )))
        .block(
            Block::default()
                .title(" My events ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(false)),
        );
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Date"),
        Cell::from("Address"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = events
        .iter()
        .map(|event| {
            Row::new(vec![
                Cell::from(event.name.as_str()),
                Cell::from(event.formatted_date()),
                Cell::from(event.address.as_str()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Percentage(45),
        Constraint::Length(14),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(format!(" My events ({}) ", events.len()))
            .title_style(styles::muted_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(false)),
    );

    frame.render_widget(table, area);
}
