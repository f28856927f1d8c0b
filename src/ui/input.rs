//! Keyboard input handling for the TUI.
//!
//! Translates key events into application state changes. Form overlays
//! capture all typing; the normal mode exposes single-key actions listed in
//! the help overlay.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{
    App, AppState, EventDetailView, EventFormFocus, Focus, LoginFocus, RegisterFocus, SearchFocus,
    Tab, MAX_FIELD_LENGTH, MAX_TEXT_LENGTH, PAGE_SCROLL_SIZE,
};
use crate::models::EventSortColumn;

fn push_char(field: &mut String, c: char, max_len: usize) {
    if field.chars().count() < max_len && !c.is_control() {
        field.push(c);
    }
}

/// Handle keyboard input. Returns true if the app should quit.
pub async fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key).await,
        AppState::Registering => return handle_register_input(app, key).await,
        AppState::EditingEvent => return handle_event_form_input(app, key).await,
        AppState::Searching => return handle_search_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    app.state = AppState::Normal;
                    app.delete_selected_event().await;
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return Ok(false);
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return Ok(false);
        }
        KeyCode::Char('1') => {
            app.current_tab = Tab::Events;
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Char('2') => {
            app.current_tab = Tab::Profile;
            app.focus = Focus::List;
            return Ok(false);
        }
        KeyCode::Char('/') => {
            app.search_focus = SearchFocus::Search;
            app.state = AppState::Searching;
            return Ok(false);
        }
        KeyCode::Char('u') => {
            app.refresh_events_background();
            app.refresh_profile();
            app.status_message = None;
            return Ok(false);
        }
        KeyCode::Char('l') => {
            if app.is_authenticated() {
                app.status_message = Some("Already signed in - [o] to sign out".to_string());
            } else {
                app.start_login();
            }
            return Ok(false);
        }
        KeyCode::Char('s') => {
            if app.is_authenticated() {
                app.status_message = Some("Already signed in".to_string());
            } else {
                app.start_register();
            }
            return Ok(false);
        }
        KeyCode::Char('o') => {
            if app.is_authenticated() {
                app.logout();
            }
            return Ok(false);
        }
        KeyCode::Char('c') => {
            app.start_create_event();
            return Ok(false);
        }
        _ => {}
    }

    // Events tab keys
    if app.current_tab == Tab::Events {
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
            KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
            KeyCode::PageDown => app.move_selection(PAGE_SCROLL_SIZE as isize),
            KeyCode::PageUp => app.move_selection(-(PAGE_SCROLL_SIZE as isize)),
            KeyCode::Enter => {
                app.load_selected_event().await;
                app.focus = Focus::Detail;
            }
            KeyCode::Tab => {
                app.focus = match app.focus {
                    Focus::List => Focus::Detail,
                    Focus::Detail => Focus::List,
                };
            }
            KeyCode::Char('d') => {
                app.event_detail_view = EventDetailView::Details;
            }
            KeyCode::Char('p') => {
                app.event_detail_view = EventDetailView::Participants;
                app.load_participants().await;
            }
            KeyCode::Char('n') if app.focus == Focus::List => {
                app.set_sort(EventSortColumn::Name);
            }
            KeyCode::Char('t') if app.focus == Focus::List => {
                app.set_sort(EventSortColumn::Date);
            }
            KeyCode::Char('a') if app.focus == Focus::List => {
                app.set_sort(EventSortColumn::Address);
            }
            KeyCode::Char('r') => {
                app.join_selected_event().await;
            }
            KeyCode::Char('e') => {
                if app.selected_event.is_none() {
                    app.load_selected_event().await;
                }
                app.start_edit_event();
            }
            KeyCode::Char('x') => {
                if app.selected_event.is_none() {
                    app.load_selected_event().await;
                }
                match &app.selected_event {
                    Some(event) if event.is_owned_by(app.signed_in_user_id()) => {
                        app.state = AppState::ConfirmingDelete;
                    }
                    Some(_) => {
                        app.status_message =
                            Some("Only the creator can delete this event".to_string());
                    }
                    None => {}
                }
            }
            KeyCode::Esc => {
                if app.focus == Focus::Detail {
                    app.focus = Focus::List;
                    app.event_detail_view = EventDetailView::Details;
                } else {
                    app.status_message = None;
                }
            }
            _ => {}
        }
    } else if key.code == KeyCode::Esc {
        app.status_message = None;
    }

    Ok(false)
}

async fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => app.login_form.next_focus(),
        KeyCode::BackTab | KeyCode::Up => app.login_form.prev_focus(),
        KeyCode::Enter => match app.login_form.focus() {
            LoginFocus::Email => app.login_form.next_focus(),
            LoginFocus::Password | LoginFocus::Button => app.submit_login().await,
        },
        KeyCode::Backspace => {
            match app.login_form.focus() {
                LoginFocus::Email => {
                    app.login_form.email.pop();
                }
                LoginFocus::Password => {
                    app.login_form.password.pop();
                }
                LoginFocus::Button => {}
            }
            app.login_form.error = None;
        }
        KeyCode::Char(c) => {
            match app.login_form.focus() {
                LoginFocus::Email => push_char(&mut app.login_form.email, c, MAX_FIELD_LENGTH),
                LoginFocus::Password => {
                    push_char(&mut app.login_form.password, c, MAX_FIELD_LENGTH);
                }
                LoginFocus::Button => {}
            }
            app.login_form.error = None;
        }
        _ => {}
    }
    Ok(false)
}

async fn handle_register_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => app.register_form.next_focus(),
        KeyCode::BackTab | KeyCode::Up => app.register_form.prev_focus(),
        KeyCode::Enter => match app.register_form.focus() {
            RegisterFocus::Button => app.submit_register().await,
            _ => app.register_form.next_focus(),
        },
        KeyCode::Backspace => {
            if let Some(field) = register_field_mut(app) {
                field.pop();
            }
            app.register_form.error = None;
        }
        KeyCode::Char(c) => {
            let max = match app.register_form.focus() {
                RegisterFocus::Avatar => MAX_TEXT_LENGTH,
                _ => MAX_FIELD_LENGTH,
            };
            if let Some(field) = register_field_mut(app) {
                push_char(field, c, max);
            }
            app.register_form.error = None;
        }
        _ => {}
    }
    Ok(false)
}

fn register_field_mut(app: &mut App) -> Option<&mut String> {
    let form = &mut app.register_form;
    match form.focus() {
        RegisterFocus::FirstName => Some(&mut form.first_name),
        RegisterFocus::LastName => Some(&mut form.last_name),
        RegisterFocus::Email => Some(&mut form.email),
        RegisterFocus::Password => Some(&mut form.password),
        RegisterFocus::Confirm => Some(&mut form.confirm),
        RegisterFocus::Avatar => Some(&mut form.avatar_path),
        RegisterFocus::Button => None,
    }
}

async fn handle_event_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    let Some(form) = app.event_form.as_mut() else {
        app.state = AppState::Normal;
        return Ok(false);
    };

    match key.code {
        KeyCode::Esc => {
            app.event_form = None;
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => form.next_focus(),
        KeyCode::BackTab | KeyCode::Up => form.prev_focus(),
        KeyCode::Enter => {
            if form.focus == EventFormFocus::Button {
                app.submit_event_form().await;
            } else {
                form.next_focus();
            }
        }
        KeyCode::Backspace => {
            if let Some(field) = event_form_field(form) {
                field.pop();
            }
            form.error = None;
        }
        KeyCode::Char(c) => {
            let max = match form.focus {
                EventFormFocus::Title | EventFormFocus::Address => MAX_FIELD_LENGTH,
                _ => MAX_TEXT_LENGTH,
            };
            if let Some(field) = event_form_field(form) {
                push_char(field, c, max);
            }
            form.error = None;
        }
        _ => {}
    }
    Ok(false)
}

fn event_form_field(form: &mut crate::app::EventForm) -> Option<&mut String> {
    match form.focus {
        EventFormFocus::Title => Some(&mut form.title),
        EventFormFocus::Description => Some(&mut form.description),
        EventFormFocus::Date => Some(&mut form.date),
        EventFormFocus::Address => Some(&mut form.address),
        EventFormFocus::VkLink => Some(&mut form.vk_link),
        EventFormFocus::TgLink => Some(&mut form.tg_link),
        EventFormFocus::Image => Some(&mut form.image_path),
        EventFormFocus::Button => None,
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
        }
        KeyCode::Tab | KeyCode::Down => {
            app.search_focus = match app.search_focus {
                SearchFocus::Search => SearchFocus::Date,
                SearchFocus::Date => SearchFocus::Address,
                SearchFocus::Address => SearchFocus::Search,
            };
        }
        KeyCode::BackTab | KeyCode::Up => {
            app.search_focus = match app.search_focus {
                SearchFocus::Search => SearchFocus::Address,
                SearchFocus::Date => SearchFocus::Search,
                SearchFocus::Address => SearchFocus::Date,
            };
        }
        KeyCode::Enter => {
            app.state = AppState::Normal;
            app.event_selection = 0;
            app.selected_event = None;
            app.refresh_events_background();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.filter.search.clear();
            app.filter.date.clear();
            app.filter.address.clear();
        }
        KeyCode::Backspace => {
            search_field_mut(app).pop();
        }
        KeyCode::Char(c) => {
            push_char(search_field_mut(app), c, MAX_FIELD_LENGTH);
        }
        _ => {}
    }
    Ok(false)
}

fn search_field_mut(app: &mut App) -> &mut String {
    match app.search_focus {
        SearchFocus::Search => &mut app.filter.search,
        SearchFocus::Date => &mut app.filter.date,
        SearchFocus::Address => &mut app.filter.address,
    }
}
