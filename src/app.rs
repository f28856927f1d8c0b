//! Application state management for eventdeck.
//!
//! The `App` struct is the context object constructed once in `main` and
//! passed by handle everywhere: it owns the configuration, the session
//! store, the API client, and all view state. Views never reach for globals;
//! they read the session through `App`.

use std::sync::mpsc as std_mpsc;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{ApiClient, ApiError, RegisterRequest};
use crate::auth::CredentialStore;
use crate::config::Config;
use crate::models::{
    Event, EventDraft, EventFilter, EventSortColumn, EventSummary, Profile, UserInfo,
};
use crate::session::{FileStorage, SessionState, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// Maximum length for text form fields, matching the backend's validation.
pub const MAX_FIELD_LENGTH: usize = 64;

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longer cap for free-text fields (description, links, file paths).
pub const MAX_TEXT_LENGTH: usize = 512;

/// Number of rows to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Events,
    Profile,
}

/// Sub-view for the event detail panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDetailView {
    Details,
    Participants,
}

/// Current UI focus area (list panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    Registering,
    EditingEvent,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// Registration form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterFocus {
    FirstName,
    LastName,
    Email,
    Password,
    Confirm,
    Avatar,
    Button,
}

/// Event form focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormFocus {
    Title,
    Description,
    Date,
    Address,
    VkLink,
    TgLink,
    Image,
    Button,
}

/// Search overlay focus state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFocus {
    Search,
    Date,
    Address,
}

// ============================================================================
// Forms
// ============================================================================

#[derive(Debug, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
    pub focus: Option<LoginFocus>,
}

impl LoginForm {
    pub fn focus(&self) -> LoginFocus {
        self.focus.unwrap_or(LoginFocus::Email)
    }

    pub fn next_focus(&mut self) {
        self.focus = Some(match self.focus() {
            LoginFocus::Email => LoginFocus::Password,
            LoginFocus::Password => LoginFocus::Button,
            LoginFocus::Button => LoginFocus::Email,
        });
    }

    pub fn prev_focus(&mut self) {
        self.focus = Some(match self.focus() {
            LoginFocus::Email => LoginFocus::Button,
            LoginFocus::Password => LoginFocus::Email,
            LoginFocus::Button => LoginFocus::Password,
        });
    }
}

#[derive(Debug, Default)]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub avatar_path: String,
    pub error: Option<String>,
    pub focus: Option<RegisterFocus>,
}

impl RegisterForm {
    pub fn focus(&self) -> RegisterFocus {
        self.focus.unwrap_or(RegisterFocus::FirstName)
    }

    pub fn next_focus(&mut self) {
        self.focus = Some(match self.focus() {
            RegisterFocus::FirstName => RegisterFocus::LastName,
            RegisterFocus::LastName => RegisterFocus::Email,
            RegisterFocus::Email => RegisterFocus::Password,
            RegisterFocus::Password => RegisterFocus::Confirm,
            RegisterFocus::Confirm => RegisterFocus::Avatar,
            RegisterFocus::Avatar => RegisterFocus::Button,
            RegisterFocus::Button => RegisterFocus::FirstName,
        });
    }

    pub fn prev_focus(&mut self) {
        self.focus = Some(match self.focus() {
            RegisterFocus::FirstName => RegisterFocus::Button,
            RegisterFocus::LastName => RegisterFocus::FirstName,
            RegisterFocus::Email => RegisterFocus::LastName,
            RegisterFocus::Password => RegisterFocus::Email,
            RegisterFocus::Confirm => RegisterFocus::Password,
            RegisterFocus::Avatar => RegisterFocus::Confirm,
            RegisterFocus::Button => RegisterFocus::Avatar,
        });
    }

    /// Client-side checks before the request goes out.
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("First and last name are required".to_string());
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err("A valid email is required".to_string());
        }
        if self.first_name.len() > MAX_FIELD_LENGTH
            || self.last_name.len() > MAX_FIELD_LENGTH
            || self.password.len() > MAX_FIELD_LENGTH
        {
            return Err(format!(
                "Text fields may hold at most {MAX_FIELD_LENGTH} characters"
            ));
        }
        if self.password.len() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters"
            ));
        }
        if self.password != self.confirm {
            return Err("Passwords do not match".to_string());
        }
        Ok(())
    }
}

/// Whether the event form creates a new event or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFormMode {
    Create,
    Edit(i64),
}

#[derive(Debug)]
pub struct EventForm {
    pub mode: EventFormMode,
    pub title: String,
    pub description: String,
    pub date: String,
    pub address: String,
    pub vk_link: String,
    pub tg_link: String,
    pub image_path: String,
    pub error: Option<String>,
    pub focus: EventFormFocus,
}

impl EventForm {
    pub fn create() -> Self {
        Self {
            mode: EventFormMode::Create,
            title: String::new(),
            description: String::new(),
            date: String::new(),
            address: String::new(),
            vk_link: String::new(),
            tg_link: String::new(),
            image_path: String::new(),
            error: None,
            focus: EventFormFocus::Title,
        }
    }

    pub fn edit(event: &Event) -> Self {
        Self {
            mode: EventFormMode::Edit(event.event_id),
            title: event.title.clone(),
            description: event.description.clone(),
            date: humanize_wire_date(&event.event_date),
            address: event.event_address.clone(),
            vk_link: event.vk_link.clone(),
            tg_link: event.tg_link.clone(),
            image_path: String::new(),
            error: None,
            focus: EventFormFocus::Title,
        }
    }

    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            EventFormFocus::Title => EventFormFocus::Description,
            EventFormFocus::Description => EventFormFocus::Date,
            EventFormFocus::Date => EventFormFocus::Address,
            EventFormFocus::Address => EventFormFocus::VkLink,
            EventFormFocus::VkLink => EventFormFocus::TgLink,
            EventFormFocus::TgLink => EventFormFocus::Image,
            EventFormFocus::Image => EventFormFocus::Button,
            EventFormFocus::Button => EventFormFocus::Title,
        };
    }

    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            EventFormFocus::Title => EventFormFocus::Button,
            EventFormFocus::Description => EventFormFocus::Title,
            EventFormFocus::Date => EventFormFocus::Description,
            EventFormFocus::Address => EventFormFocus::Date,
            EventFormFocus::VkLink => EventFormFocus::Address,
            EventFormFocus::TgLink => EventFormFocus::VkLink,
            EventFormFocus::Image => EventFormFocus::TgLink,
            EventFormFocus::Button => EventFormFocus::Image,
        };
    }

    /// Required-field validation, then date normalization.
    pub fn to_draft(&self, creator_user_id: i64) -> Result<EventDraft, String> {
        if self.title.trim().is_empty() {
            return Err("Event title is required".to_string());
        }
        if self.description.trim().is_empty() {
            return Err("Event description is required".to_string());
        }
        if self.date.trim().is_empty() {
            return Err("Event date is required".to_string());
        }
        if self.address.trim().is_empty() {
            return Err("Event address is required".to_string());
        }

        let event_date = normalize_date_input(self.date.trim())
            .ok_or_else(|| "Date must be YYYY-MM-DD or YYYY-MM-DD HH:MM".to_string())?;

        Ok(EventDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            event_date,
            event_address: self.address.trim().to_string(),
            creator_user_id,
            vk_link: self.vk_link.trim().to_string(),
            tg_link: self.tg_link.trim().to_string(),
            image_url: String::new(),
        })
    }
}

/// "2026-02-06 19:00" or "2026-02-06" to the backend's RFC 3339.
fn normalize_date_input(input: &str) -> Option<String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M") {
        return Some(dt.format("%Y-%m-%dT%H:%M:00Z").to_string());
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%dT00:00:00Z").to_string());
    }
    None
}

/// Wire RFC 3339 back to the form's "YYYY-MM-DD HH:MM".
fn humanize_wire_date(wire: &str) -> String {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(wire) {
        dt.format("%Y-%m-%d %H:%M").to_string()
    } else {
        wire.to_string()
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from background fetch tasks back to the main loop.
enum TaskResult {
    Events(Vec<EventSummary>),
    Profile(Profile),
    Failed(String),
}

// ============================================================================
// App
// ============================================================================

pub struct App {
    pub config: Config,
    pub session: SessionStore<FileStorage>,
    api: ApiClient,

    // Session transitions observed through the store's subscribe contract
    session_changes: std_mpsc::Receiver<SessionState>,

    // Background task plumbing
    task_tx: mpsc::Sender<TaskResult>,
    task_rx: mpsc::Receiver<TaskResult>,

    // UI state
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub event_detail_view: EventDetailView,
    pub status_message: Option<String>,

    // Events view
    pub events: Vec<EventSummary>,
    pub events_loading: bool,
    pub event_selection: usize,
    pub event_sort: EventSortColumn,
    pub filter: EventFilter,
    pub search_focus: SearchFocus,
    pub selected_event: Option<Event>,
    pub participants: Vec<UserInfo>,

    // Profile view
    pub profile: Option<Profile>,
    pub profile_loading: bool,

    // Overlay forms
    pub login_form: LoginForm,
    pub register_form: RegisterForm,
    pub event_form: Option<EventForm>,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = Config::load()?;

        let storage = FileStorage::new(Config::session_dir()?);
        let mut session = SessionStore::open(storage)?;

        let mut api = ApiClient::new(&config.backend_url(), &config.auth_url())?;
        api.set_token(session.state().token.clone());

        // Every later login/logout flows through this observer; the loop
        // drains it in check_background_tasks.
        let (session_tx, session_changes) = std_mpsc::channel();
        session.subscribe(move |state: &SessionState| {
            let _ = session_tx.send(state.clone());
        });

        let (task_tx, task_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            session,
            api,
            session_changes,
            task_tx,
            task_rx,
            state: AppState::Normal,
            current_tab: Tab::Events,
            focus: Focus::List,
            event_detail_view: EventDetailView::Details,
            status_message: None,
            events: Vec::new(),
            events_loading: false,
            event_selection: 0,
            event_sort: EventSortColumn::default(),
            filter: EventFilter::default(),
            search_focus: SearchFocus::Search,
            selected_event: None,
            participants: Vec::new(),
            profile: None,
            profile_loading: false,
            login_form: LoginForm::default(),
            register_form: RegisterForm::default(),
            event_form: None,
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.state().is_authenticated()
    }

    pub fn signed_in_user_id(&self) -> Option<i64> {
        self.session.state().user_id
    }

    // =========================================================================
    // Event list
    // =========================================================================

    /// Events sorted by the active column.
    pub fn get_sorted_events(&self) -> Vec<&EventSummary> {
        let mut events: Vec<&EventSummary> = self.events.iter().collect();
        match self.event_sort {
            EventSortColumn::Name => {
                events.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
            }
            EventSortColumn::Date => events.sort_by(|a, b| a.date.cmp(&b.date)),
            EventSortColumn::Address => {
                events.sort_by(|a, b| a.address.to_lowercase().cmp(&b.address.to_lowercase()));
            }
        }
        events
    }

    pub fn selected_summary(&self) -> Option<&EventSummary> {
        self.get_sorted_events().get(self.event_selection).copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.events.is_empty() {
            self.event_selection = 0;
            return;
        }
        let last = self.events.len() - 1;
        let next = self.event_selection as isize + delta;
        self.event_selection = next.clamp(0, last as isize) as usize;
        // Selection moved; the old detail no longer matches.
        self.selected_event = None;
        self.participants.clear();
        self.event_detail_view = EventDetailView::Details;
    }

    pub fn set_sort(&mut self, column: EventSortColumn) {
        self.event_sort = column;
        self.event_selection = 0;
        self.selected_event = None;
        self.participants.clear();
    }

    /// Refresh the event listing in the background.
    pub fn refresh_events_background(&mut self) {
        self.events_loading = true;
        let api = self.api.clone();
        let filter = self.filter.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match api.fetch_events(&filter).await {
                Ok(events) => TaskResult::Events(events),
                Err(e) => {
                    warn!(error = %e, "event refresh failed");
                    TaskResult::Failed(format!("Failed to load events: {e}"))
                }
            };
            let _ = tx.send(result).await;
        });
    }

    /// Fetch the selected event's detail panel data.
    pub async fn load_selected_event(&mut self) {
        let Some(id) = self.selected_summary().map(|s| s.id) else {
            return;
        };
        match self.api.fetch_event(id).await {
            Ok(event) => self.selected_event = Some(event),
            Err(e) => self.report_error("load event", e),
        }
    }

    /// Fetch the registered-user list for the selected event.
    pub async fn load_participants(&mut self) {
        let Some(id) = self.selected_summary().map(|s| s.id) else {
            return;
        };
        match self.api.fetch_participants(id).await {
            Ok(users) => self.participants = users,
            Err(e) => self.report_error("load participants", e),
        }
    }

    // =========================================================================
    // Session flows
    // =========================================================================

    pub fn start_login(&mut self) {
        self.login_form = LoginForm {
            email: self.config.last_email.clone().unwrap_or_default(),
            ..LoginForm::default()
        };
        if !self.login_form.email.is_empty() {
            self.login_form.focus = Some(LoginFocus::Password);
            if let Ok(password) = CredentialStore::get_password(&self.login_form.email) {
                self.login_form.password = password;
            }
        }
        self.state = AppState::LoggingIn;
    }

    pub fn start_register(&mut self) {
        self.register_form = RegisterForm::default();
        self.state = AppState::Registering;
    }

    /// Submit the login overlay.
    pub async fn submit_login(&mut self) {
        let email = self.login_form.email.trim().to_string();
        let password = self.login_form.password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_form.error = Some("Email and password are required".to_string());
            return;
        }

        match self.api.login(&email, &password).await {
            Ok(login) => {
                if let Err(e) = self.session.login(login.user.id, &login.token) {
                    error!(error = %e, "session update failed after login");
                    self.login_form.error = Some(e.to_string());
                    return;
                }

                // The auth service reports the canonical account email.
                let account_email = if login.user.email.is_empty() {
                    email.clone()
                } else {
                    login.user.email.clone()
                };
                self.config.last_email = Some(account_email.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "failed to save config");
                }
                if let Err(e) = CredentialStore::store(&account_email, &password) {
                    debug!(error = %e, "keychain store failed");
                }

                info!(user_id = login.user.id, "signed in");
                self.state = AppState::Normal;
                self.status_message = Some(format!("Signed in as {account_email}"));
            }
            Err(e) => {
                self.login_form.error = Some(user_facing_error(&e));
            }
        }
    }

    /// Submit the registration overlay.
    pub async fn submit_register(&mut self) {
        if let Err(msg) = self.register_form.validate() {
            self.register_form.error = Some(msg);
            return;
        }

        let request = RegisterRequest {
            first_name: self.register_form.first_name.trim().to_string(),
            last_name: self.register_form.last_name.trim().to_string(),
            email: self.register_form.email.trim().to_string(),
            password: self.register_form.password.clone(),
        };
        let avatar = (!self.register_form.avatar_path.trim().is_empty())
            .then(|| std::path::PathBuf::from(self.register_form.avatar_path.trim()));

        match self.api.register(&request, avatar.as_deref()).await {
            Ok(registered) => {
                if let Err(e) = self.session.login(registered.user_id, &registered.token) {
                    error!(error = %e, "session update failed after registration");
                    self.register_form.error = Some(e.to_string());
                    return;
                }

                self.config.last_email = Some(request.email.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "failed to save config");
                }

                info!(user_id = registered.user_id, "account created");
                self.state = AppState::Normal;
                self.status_message = Some(format!("Welcome, {}!", request.first_name));
            }
            Err(e) => {
                self.register_form.error = Some(user_facing_error(&e));
            }
        }
    }

    /// Sign out. The session observer clears the API token and profile.
    pub fn logout(&mut self) {
        match self.session.logout() {
            Ok(()) => self.status_message = Some("Signed out".to_string()),
            Err(e) => {
                error!(error = %e, "logout failed");
                self.status_message = Some(format!("Logout failed: {e}"));
            }
        }
    }

    // =========================================================================
    // Event actions
    // =========================================================================

    /// Register the signed-in user for the selected event. Anonymous users
    /// are sent to the login overlay instead.
    pub async fn join_selected_event(&mut self) {
        let Some(event_id) = self.selected_summary().map(|s| s.id) else {
            return;
        };
        let Some(user_id) = self.signed_in_user_id() else {
            self.start_login();
            return;
        };

        match self.api.join_event(event_id, user_id).await {
            Ok(()) => {
                self.status_message = Some("Registered for event".to_string());
                self.profile_loading = true;
                self.refresh_profile_background(user_id);
            }
            Err(e) => self.report_error("join event", e),
        }
    }

    pub fn start_create_event(&mut self) {
        if !self.is_authenticated() {
            self.start_login();
            return;
        }
        self.event_form = Some(EventForm::create());
        self.state = AppState::EditingEvent;
    }

    /// Open the edit form for the selected event (creator only).
    pub fn start_edit_event(&mut self) {
        let Some(event) = self.selected_event.clone() else {
            self.status_message = Some("Open an event first".to_string());
            return;
        };
        if !event.is_owned_by(self.signed_in_user_id()) {
            self.status_message = Some("Only the creator can edit this event".to_string());
            return;
        }
        self.event_form = Some(EventForm::edit(&event));
        self.state = AppState::EditingEvent;
    }

    /// Submit the create/edit form.
    pub async fn submit_event_form(&mut self) {
        let Some(user_id) = self.signed_in_user_id() else {
            self.state = AppState::Normal;
            self.start_login();
            return;
        };
        let Some(form) = self.event_form.as_mut() else {
            return;
        };

        let draft = match form.to_draft(user_id) {
            Ok(draft) => draft,
            Err(msg) => {
                form.error = Some(msg);
                return;
            }
        };

        let result = match form.mode {
            EventFormMode::Create => self.api.create_event(&draft).await.map(|id| {
                info!(event_id = id, "event created");
                "Event created".to_string()
            }),
            EventFormMode::Edit(event_id) => {
                self.api.update_event(event_id, &draft).await.map(|()| {
                    info!(event_id, "event updated");
                    "Event updated".to_string()
                })
            }
        };

        match result {
            Ok(message) => {
                self.event_form = None;
                self.state = AppState::Normal;
                self.status_message = Some(message);
                self.selected_event = None;
                self.refresh_events_background();
            }
            Err(e) => {
                if let Some(form) = self.event_form.as_mut() {
                    form.error = Some(user_facing_error(&e));
                }
            }
        }
    }

    /// Delete the selected event after confirmation (creator only).
    pub async fn delete_selected_event(&mut self) {
        let Some(event) = self.selected_event.clone() else {
            return;
        };
        match self.api.delete_event(event.event_id).await {
            Ok(()) => {
                self.status_message = Some("Event deleted".to_string());
                self.selected_event = None;
                self.refresh_events_background();
            }
            Err(e) => self.report_error("delete event", e),
        }
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Re-fetch the signed-in user's profile. A no-op when anonymous.
    pub fn refresh_profile(&mut self) {
        if let Some(user_id) = self.signed_in_user_id() {
            self.profile_loading = true;
            self.refresh_profile_background(user_id);
        }
    }

    fn refresh_profile_background(&self, user_id: i64) {
        let api = self.api.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let result = match api.fetch_profile(user_id).await {
                Ok(profile) => TaskResult::Profile(profile),
                Err(e) => {
                    warn!(error = %e, "profile refresh failed");
                    TaskResult::Failed(format!("Failed to load profile: {e}"))
                }
            };
            let _ = tx.send(result).await;
        });
    }

    /// Kick off the initial fetches after construction. The event listing
    /// and the profile are independent, so they go out together.
    pub fn load_initial_data(&mut self) {
        let Some(user_id) = self.signed_in_user_id() else {
            self.refresh_events_background();
            return;
        };

        self.events_loading = true;
        self.profile_loading = true;
        let api = self.api.clone();
        let filter = self.filter.clone();
        let tx = self.task_tx.clone();

        tokio::spawn(async move {
            let (events, profile) =
                futures::join!(api.fetch_events(&filter), api.fetch_profile(user_id));

            let events = match events {
                Ok(events) => TaskResult::Events(events),
                Err(e) => {
                    warn!(error = %e, "initial event fetch failed");
                    TaskResult::Failed(format!("Failed to load events: {e}"))
                }
            };
            let _ = tx.send(events).await;

            let profile = match profile {
                Ok(profile) => TaskResult::Profile(profile),
                Err(e) => {
                    warn!(error = %e, "initial profile fetch failed");
                    TaskResult::Failed(format!("Failed to load profile: {e}"))
                }
            };
            let _ = tx.send(profile).await;
        });
    }

    // =========================================================================
    // Main-loop plumbing
    // =========================================================================

    /// Drain completed background tasks and session transitions.
    pub fn check_background_tasks(&mut self) {
        while let Ok(result) = self.task_rx.try_recv() {
            match result {
                TaskResult::Events(events) => {
                    self.events_loading = false;
                    self.events = events;
                    if self.event_selection >= self.events.len() {
                        self.event_selection = self.events.len().saturating_sub(1);
                    }
                }
                TaskResult::Profile(profile) => {
                    self.profile_loading = false;
                    self.profile = Some(profile);
                }
                TaskResult::Failed(message) => {
                    self.events_loading = false;
                    self.profile_loading = false;
                    self.status_message = Some(message);
                }
            }
        }

        while let Ok(state) = self.session_changes.try_recv() {
            self.api.set_token(state.token.clone());
            match state.user_id {
                Some(user_id) => {
                    self.profile_loading = true;
                    self.refresh_profile_background(user_id);
                }
                None => {
                    self.profile = None;
                    self.profile_loading = false;
                    if self.current_tab == Tab::Profile {
                        self.current_tab = Tab::Events;
                    }
                }
            }
        }
    }

    fn report_error(&mut self, action: &str, e: anyhow::Error) {
        warn!(action, error = %e, "request failed");
        if matches!(e.downcast_ref::<ApiError>(), Some(ApiError::Unauthorized)) {
            // Token no longer valid; drop the session and ask to sign in.
            if let Err(logout_err) = self.session.logout() {
                error!(error = %logout_err, "failed to clear rejected session");
            }
            self.start_login();
            return;
        }
        self.status_message = Some(format!("Failed to {action}: {e}"));
    }
}

fn user_facing_error(e: &anyhow::Error) -> String {
    match e.downcast_ref::<ApiError>() {
        Some(api_error) => api_error.to_string(),
        None => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_form_dates() {
        assert_eq!(
            normalize_date_input("2026-02-06 19:00").as_deref(),
            Some("2026-02-06T19:00:00Z")
        );
        assert_eq!(
            normalize_date_input("2026-02-06").as_deref(),
            Some("2026-02-06T00:00:00Z")
        );
        assert!(normalize_date_input("06/02/2026").is_none());
        assert!(normalize_date_input("soon").is_none());
    }

    #[test]
    fn wire_dates_round_trip_into_the_form() {
        assert_eq!(humanize_wire_date("2026-02-06T19:00:00Z"), "2026-02-06 19:00");
        assert_eq!(humanize_wire_date("garbage"), "garbage");
    }

    #[test]
    fn register_form_enforces_length_and_confirmation_rules() {
        let mut form = RegisterForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password: "longenough".to_string(),
            confirm: "longenough".to_string(),
            ..RegisterForm::default()
        };
        assert!(form.validate().is_ok());

        form.confirm = "different".to_string();
        assert!(form.validate().is_err());

        form.confirm = form.password.clone();
        form.password = "short".to_string();
        form.confirm = "short".to_string();
        assert!(form.validate().is_err());

        form.password = "x".repeat(MAX_FIELD_LENGTH + 1);
        form.confirm = form.password.clone();
        assert!(form.validate().is_err());
    }

    #[test]
    fn event_form_requires_the_mandatory_fields() {
        let mut form = EventForm::create();
        assert!(form.to_draft(1).is_err());

        form.title = "Party".to_string();
        form.description = "A party".to_string();
        form.date = "2026-03-01".to_string();
        form.address = "Main St".to_string();
        let draft = form.to_draft(7).expect("valid draft");
        assert_eq!(draft.creator_user_id, 7);
        assert_eq!(draft.event_date, "2026-03-01T00:00:00Z");

        form.date = "whenever".to_string();
        assert!(form.to_draft(7).is_err());
    }

    #[test]
    fn edit_form_prefills_from_the_event() {
        let event = Event {
            event_id: 3,
            title: "T".to_string(),
            description: "D".to_string(),
            event_date: "2026-02-06T19:00:00Z".to_string(),
            event_address: "A".to_string(),
            creator_user_id: 1,
            vk_link: "vk".to_string(),
            tg_link: "tg".to_string(),
            image_url: String::new(),
        };
        let form = EventForm::edit(&event);
        assert_eq!(form.mode, EventFormMode::Edit(3));
        assert_eq!(form.date, "2026-02-06 19:00");
        assert_eq!(form.title, "T");
    }
}
