//! Top-level frame layout and modal overlays.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{
    App, AppState, EventDetailView, EventForm, EventFormFocus, EventFormMode, Focus, LoginFocus,
    RegisterFocus, SearchFocus, Tab,
};

use super::styles;
use super::views::{events, profile};

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Length(2), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::Registering => render_register_overlay(frame, app),
        AppState::EditingEvent => {
            if let Some(form) = &app.event_form {
                render_event_form_overlay(frame, form);
            }
        }
        AppState::Searching => render_search_overlay(frame, app),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Eventdeck";
    let signed_in = match app.session.state().user_id {
        Some(_) => app
            .config
            .last_email
            .clone()
            .unwrap_or_else(|| "signed in".to_string()),
        None => "anonymous - [l] sign in".to_string(),
    };
    let right = format!("{signed_in}  [?] Help ");

    let padding = (area.width as usize).saturating_sub(title.len() + right.len());
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let main_tabs = [
        ("[1] Events", app.current_tab == Tab::Events),
        ("[2] Profile", app.current_tab == Tab::Profile),
    ];

    let mut spans = vec![Span::raw(" ")];
    for (i, (label, selected)) in main_tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(*label, styles::tab_style(*selected)));
    }

    // Detail sub-view toggle, right-aligned, on the events tab only
    if app.current_tab == Tab::Events {
        let detail_tabs = [
            ("[d]etails", app.event_detail_view == EventDetailView::Details),
            (
                "[p]articipants",
                app.event_detail_view == EventDetailView::Participants,
            ),
        ];

        let main_width: usize = spans.iter().map(|s| s.content.len()).sum();
        let detail_width: usize =
            detail_tabs.iter().map(|(l, _)| l.len()).sum::<usize>() + 3; // " | "
        let padding = (area.width as usize).saturating_sub(main_width + detail_width + 2);
        spans.push(Span::raw(" ".repeat(padding)));

        for (i, (label, selected)) in detail_tabs.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            if *selected {
                spans.push(Span::styled(*label, styles::tab_style(true)));
            } else {
                spans.push(Span::styled(*label, styles::muted_style()));
            }
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Events => events::render(frame, app, area),
        Tab::Profile => profile::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match &app.status_message {
        Some(msg) => format!(" {msg} "),
        None if app.events_loading => " Loading events... ".to_string(),
        None => String::from(" Ready "),
    };
    let right_text = " [/] search | [c]reate | [u]pdate | [q]uit ";

    let padding = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);

    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

// ============================================================================
// Overlays
// ============================================================================

fn field_line<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    Line::from(vec![
        Span::styled(marker, styles::highlight_style()),
        Span::styled(format!("{label:<10}"), styles::muted_style()),
        Span::styled(value, styles::field_style(focused)),
    ])
}

fn masked(value: &str) -> String {
    "*".repeat(value.chars().count())
}

fn button_line(label: &str, focused: bool) -> Line<'static> {
    let text = format!("[ {label} ]");
    Line::from(Span::styled(
        format!("  {text}"),
        if focused {
            styles::selected_style()
        } else {
            styles::muted_style()
        },
    ))
}

fn error_line(error: &Option<String>) -> Option<Line<'static>> {
    error
        .as_ref()
        .map(|msg| Line::from(Span::styled(format!("  {msg}"), styles::error_style())))
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let form = &app.login_form;
    let height = if form.error.is_some() { 11 } else { 9 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Sign in", styles::title_style())),
        Line::from(""),
    ];
    lines.push(field_line(
        "Email",
        form.email.clone(),
        form.focus() == LoginFocus::Email,
    ));
    lines.push(field_line(
        "Password",
        masked(&form.password),
        form.focus() == LoginFocus::Password,
    ));
    lines.push(Line::from(""));
    lines.push(button_line("Sign in", form.focus() == LoginFocus::Button));
    if let Some(line) = error_line(&form.error) {
        lines.push(Line::from(""));
        lines.push(line);
    }

    let block = Block::default()
        .title(" Login - Tab to move, Enter to submit, Esc to close ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_register_overlay(frame: &mut Frame, app: &App) {
    let form = &app.register_form;
    let height = if form.error.is_some() { 15 } else { 13 };
    let area = centered_rect_fixed(58, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("  Create an account", styles::title_style())),
        Line::from(""),
        field_line(
            "First",
            form.first_name.clone(),
            form.focus() == RegisterFocus::FirstName,
        ),
        field_line(
            "Last",
            form.last_name.clone(),
            form.focus() == RegisterFocus::LastName,
        ),
        field_line(
            "Email",
            form.email.clone(),
            form.focus() == RegisterFocus::Email,
        ),
        field_line(
            "Password",
            masked(&form.password),
            form.focus() == RegisterFocus::Password,
        ),
        field_line(
            "Confirm",
            masked(&form.confirm),
            form.focus() == RegisterFocus::Confirm,
        ),
        field_line(
            "Avatar",
            form.avatar_path.clone(),
            form.focus() == RegisterFocus::Avatar,
        ),
        Line::from(""),
        button_line("Register", form.focus() == RegisterFocus::Button),
    ];
    if let Some(line) = error_line(&form.error) {
        lines.push(Line::from(""));
        lines.push(line);
    }

    let block = Block::default()
        .title(" Register - Tab to move, Enter to submit, Esc to close ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_event_form_overlay(frame: &mut Frame, form: &EventForm) {
    let height = if form.error.is_some() { 16 } else { 14 };
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let (title, button) = match form.mode {
        EventFormMode::Create => (" New event ", "Create"),
        EventFormMode::Edit(_) => (" Edit event ", "Save"),
    };

    let mut lines = vec![
        Line::from(""),
        field_line("Title", form.title.clone(), form.focus == EventFormFocus::Title),
        field_line(
            "About",
            form.description.clone(),
            form.focus == EventFormFocus::Description,
        ),
        field_line("Date", form.date.clone(), form.focus == EventFormFocus::Date),
        field_line(
            "Address",
            form.address.clone(),
            form.focus == EventFormFocus::Address,
        ),
        field_line("VK", form.vk_link.clone(), form.focus == EventFormFocus::VkLink),
        field_line("Telegram", form.tg_link.clone(), form.focus == EventFormFocus::TgLink),
        field_line(
            "Image",
            form.image_path.clone(),
            form.focus == EventFormFocus::Image,
        ),
        Line::from(Span::styled(
            "    Date format: YYYY-MM-DD or YYYY-MM-DD HH:MM",
            styles::muted_style(),
        )),
        Line::from(""),
        button_line(button, form.focus == EventFormFocus::Button),
    ];
    if let Some(line) = error_line(&form.error) {
        lines.push(Line::from(""));
        lines.push(line);
    }

    let block = Block::default()
        .title(format!("{title}- Tab to move, Enter to submit, Esc to close "))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_search_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(54, 9, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        field_line(
            "Name",
            app.filter.search.clone(),
            app.search_focus == SearchFocus::Search,
        ),
        field_line(
            "Date",
            app.filter.date.clone(),
            app.search_focus == SearchFocus::Date,
        ),
        field_line(
            "Address",
            app.filter.address.clone(),
            app.search_focus == SearchFocus::Address,
        ),
        Line::from(""),
        Line::from(Span::styled(
            "  Enter: apply | Ctrl+U: clear | Esc: close",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(" Filter events ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(48, 7, frame.area());
    frame.render_widget(Clear, area);

    let name = app
        .selected_event
        .as_ref()
        .map(|e| e.title.clone())
        .unwrap_or_default();

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Delete \"{}\"?", name),
            styles::error_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  [y] ", styles::help_key_style()),
            Span::styled("delete    ", styles::help_desc_style()),
            Span::styled("[n] ", styles::help_key_style()),
            Span::styled("keep", styles::help_desc_style()),
        ]),
    ];

    let block = Block::default()
        .title(" Confirm ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::error_style());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(36, 5, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Quit?  ", styles::title_style()),
            Span::styled("[y]es ", styles::help_key_style()),
            Span::styled("/ ", styles::muted_style()),
            Span::styled("[n]o", styles::help_key_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let keys: &[(&str, &str)] = &[
        ("1 / 2", "switch between Events and Profile"),
        ("j / k", "move selection"),
        ("Enter", "load the selected event's details"),
        ("Tab", "switch focus between list and detail"),
        ("d / p", "detail panel: details / participants"),
        ("n t a", "sort by name / time / address"),
        ("/", "filter events (name, date, address)"),
        ("u", "refresh the event list"),
        ("r", "register for the selected event"),
        ("c", "create a new event"),
        ("e / x", "edit / delete your own event"),
        ("l / s", "sign in / sign up"),
        ("o", "sign out"),
        ("q", "quit"),
    ];

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  Eventdeck v{version}"),
            styles::title_style(),
        )),
        Line::from(""),
    ];
    for (key, desc) in keys {
        lines.push(Line::from(vec![
            Span::styled(format!("  {key:<7}"), styles::help_key_style()),
            Span::styled(*desc, styles::help_desc_style()),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press Esc to close",
        styles::muted_style(),
    )));

    let block = Block::default()
        .title(" Help ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Fixed-size centered rectangle, clamped to the frame.
fn centered_rect_fixed(width: u16, height: u16, frame_area: Rect) -> Rect {
    let width = width.min(frame_area.width);
    let height = height.min(frame_area.height);
    let x = frame_area.x + (frame_area.width.saturating_sub(width)) / 2;
    let y = frame_area.y + (frame_area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
