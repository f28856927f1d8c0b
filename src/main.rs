//! Eventdeck - a terminal client for the event-organization service.
//!
//! Browse and search events, sign in or create an account, register for
//! events, and manage the events you created, all from the keyboard.

mod api;
mod app;
mod auth;
mod config;
mod models;
mod session;
mod ui;

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, AppState};
use config::Config;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Route logs to a file; the terminal belongs to the TUI.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = Config::log_dir()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, "eventdeck.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    // RUST_LOG controls the level (e.g. RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    // CLI commands that bypass the TUI
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--login" {
        return login_cli().await;
    }
    if args.len() > 1 && args[1] == "--logout" {
        return logout_cli();
    }

    let _guard = init_tracing()?;
    info!("eventdeck starting");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and kick off the initial fetches
    let mut app = App::new()?;
    app.load_initial_data();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("eventdeck shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
                {
                    return Ok(());
                }

                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background tasks and session transitions
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

/// Interactive terminal login without entering the TUI.
async fn login_cli() -> Result<()> {
    let mut config = Config::load()?;

    print!("Email");
    if let Some(ref last) = config.last_email {
        print!(" [{}]", last);
    }
    print!(": ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let email = match input.trim() {
        "" => config
            .last_email
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No email given"))?,
        typed => typed.to_string(),
    };

    let password = if auth::CredentialStore::has_credentials(&email) {
        print!("Use stored password? [Y/n]: ");
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer)?;

        if answer.trim().eq_ignore_ascii_case("n") {
            rpassword::prompt_password("Password: ")?
        } else {
            auth::CredentialStore::get_password(&email)?
        }
    } else {
        rpassword::prompt_password("Password: ")?
    };

    println!("Authenticating...");
    let client = api::ApiClient::new(&config.backend_url(), &config.auth_url())?;
    let login = client.login(&email, &password).await?;

    let storage = session::FileStorage::new(Config::session_dir()?);
    let mut store = session::SessionStore::open(storage)?;
    store.login(login.user.id, &login.token)?;

    config.last_email = Some(email.clone());
    config.save()?;
    if let Err(e) = auth::CredentialStore::store(&email, &password) {
        eprintln!("Warning: could not store password in keychain: {e}");
    }

    println!("Signed in as {email} (user id {}).", login.user.id);
    Ok(())
}

/// Clear the stored session without entering the TUI.
fn logout_cli() -> Result<()> {
    let storage = session::FileStorage::new(Config::session_dir()?);
    let mut store = session::SessionStore::open(storage)?;

    if store.state().is_authenticated() {
        store.logout()?;
        println!("Signed out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}
