//! Terminal UI for smartbin that monitors waste bins and simulates collection trips.

mod app;
mod config;
mod input;
mod ui;

use std::{
    fs::File,
    io,
    sync::{Arc, Mutex},
    time::{Duration as StdDuration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use reqwest::Client;
use smartbin_core::{
    ports::BackendPort,
    scheduler::AppEvent,
    service::{Dashboard, UserAction},
};
use smartbin_gateway::HttpGateway;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::config::Config;
use crate::input::Action;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    // Logs go to a file; the terminal belongs to the UI
    let log_file = File::create(&config.log_file)
        .with_context(|| format!("cannot open log file {}", config.log_file.display()))?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "smartbin=info".into()))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    // HTTP + dashboard setup
    let client = Client::builder()
        .user_agent(concat!("smartbin/", env!("CARGO_PKG_VERSION")))
        .timeout(config.request_timeout())
        .build()?;
    let gateway = HttpGateway::new(client, config.backend_url.clone());
    info!(backend = gateway.base_url(), "starting smartbin");
    let port: Arc<dyn BackendPort> = Arc::new(gateway);

    let (events, receiver) = mpsc::unbounded_channel();
    let mut dashboard = Dashboard::new(port, events, config.dashboard());
    // Connects in the background; a failure becomes a notification and r retries it
    dashboard.dispatch(UserAction::Refresh);

    // App state
    let app = App::new(dashboard);

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app, receiver).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut app: App,
    mut events: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    let res = event_loop(terminal, &mut app, &mut events).await;
    app.dashboard.shutdown();
    res
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut UnboundedReceiver<AppEvent>,
) -> Result<()> {
    loop {
        // Timer events and finished requests first, in arrival order
        while let Ok(event) = events.try_recv() {
            app.dashboard.handle_event(event);
        }
        app.dashboard.expire_notifications(Instant::now());
        app.clamp_cursor();

        // Draw current UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, app) {
                Action::None => {}
                Action::Quit => break,
                Action::Backend(action) => app.dashboard.dispatch(action),
            }
        }
    }

    Ok(())
}
