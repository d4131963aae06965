//! healthdash - a terminal dashboard for member health data.
//!
//! Shows a member's profile, care-team chats, biomarkers, wearables, test
//! reports, diagnostic plan and internal metrics in tabs, and forwards
//! free-text questions to the backend's AI endpoint.

mod app;
mod ui;
mod utils;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use healthdash_core::api::ApiClient;
use healthdash_core::config::Config;
use healthdash_core::models::MemberId;

use app::{App, AppState};
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "healthdash.log";

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct Args {
    member: Option<MemberId>,
    check: bool,
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--check" => parsed.check = true,
                "--member" => {
                    let member = args
                        .next()
                        .filter(|m| !m.trim().is_empty())
                        .context("--member requires a member id")?;
                    parsed.member = Some(MemberId::new(member));
                }
                other => anyhow::bail!("Unknown argument: {}", other),
            }
        }
        Ok(parsed)
    }
}

/// Initialize the tracing subscriber for the dashboard.
///
/// Logs go to a file in the cache directory so they never draw over the
/// terminal UI. The returned guard flushes the writer on drop.
fn init_file_tracing() -> Result<WorkerGuard> {
    let log_dir = Config::cache_dir()?;
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();
    Ok(guard)
}

fn init_stderr_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: {:#}. Using defaults.", e);
            let mut config = Config::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse(std::env::args().skip(1))?;
    let config = load_config();

    if args.check {
        init_stderr_tracing();
        return check_backend(&config).await;
    }

    let _log_guard = init_file_tracing()?;
    info!("healthdash starting");

    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.start(args.member);

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

    info!("healthdash shutting down");
    Ok(())
}

/// Probe the backend's health endpoint and report on stdout.
async fn check_backend(config: &Config) -> Result<()> {
    let api = ApiClient::from_config(config)?;
    eprintln!("Checking {} ...", api.base_url());

    match api.health_check().await {
        Ok(()) => {
            println!("Backend reachable at {}", api.base_url());
            Ok(())
        }
        Err(e) => {
            println!("Backend check failed: {}", e.user_message());
            Err(e.into())
        }
    }
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
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                if handle_input(app, key)? {
                    return Ok(());
                }
            }
        }

        // Apply controller events and background results
        app.check_background_tasks();

        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args> {
        Args::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_args_empty() {
        assert_eq!(args(&[]).unwrap(), Args::default());
    }

    #[test]
    fn test_args_member_and_check() {
        let parsed = args(&["--member", "Rohan Patel", "--check"]).unwrap();
        assert_eq!(parsed.member, Some(MemberId::new("Rohan Patel")));
        assert!(parsed.check);
    }

    #[test]
    fn test_args_errors() {
        assert!(args(&["--member"]).is_err());
        assert!(args(&["--member", " "]).is_err());
        assert!(args(&["--verbose"]).is_err());
    }
}
