// services/metrics-dash/src/main.rs
//
// Terminal dashboard for engineering metrics.
//
// Run with: cargo run --bin metrics-dash -- --demo

use std::fs::OpenOptions;
use std::io::stdout;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use crossterm::{
    event::{Event, EventStream},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures::StreamExt;
use ratatui::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use metrics_dash::{
    load_config, ui, App, DashConfig, DateRangeController, HttpMetricsSource, MetricsSource, MockMetricsSource, View,
};

#[derive(Parser, Debug)]
#[command(name = "metrics-dash")]
#[command(about = "Terminal dashboard for PR, contributor, CI/CD and QE metrics")]
#[command(version = "0.1.0")]
struct Args {
    #[arg(short, long, default_value = "config/metrics-dash.yaml")]
    config: String,

    /// Serve built-in fixtures instead of calling the backend
    #[arg(long, short)]
    demo: bool,

    /// Backend base URL, overrides the config file
    #[arg(long, env = "METRICS_DASH_API_URL")]
    api_url: Option<String>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of the range (YYYY-MM-DD), defaults to today
    #[arg(long)]
    end: Option<NaiveDate>,

    /// View shown on startup
    #[arg(long, value_enum, default_value_t = View::Dashboard)]
    view: View,

    /// Log file; the terminal belongs to the UI
    #[arg(long)]
    log_file: Option<String>,

    /// Redraw interval in milliseconds
    #[arg(long, default_value = "250")]
    tick_ms: u64,
}

fn init_tracing(config: &DashConfig, log_file: &str) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening log file {}", log_file))?;

    // Non-production profiles log the dashboard itself at debug.
    let base = config.observability.log_level.as_str();
    let dash = if config.environment.debug_logs() { "debug" } else { base };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("metrics_dash={dash},svckit={base}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .init();
    Ok(())
}

fn initial_range(args: &Args, today: NaiveDate) -> Result<DateRangeController> {
    let mut controller = DateRangeController::new(today);
    match (args.start, args.end) {
        (None, None) => {}
        (start, end) => {
            let end = end.unwrap_or(today);
            let start = start.unwrap_or_else(|| controller.range().start().min(end));
            controller.set_range(start, end)?;
        }
    }
    Ok(controller)
}

fn build_source(config: &DashConfig) -> Result<Arc<dyn MetricsSource>> {
    if config.mock_responses {
        return Ok(Arc::new(MockMetricsSource::new(config.mock_delay())));
    }
    Ok(Arc::new(HttpMetricsSource::new(config)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(&args.config)?;
    if args.demo {
        config.mock_responses = true;
    }
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }

    let log_file = args.log_file.clone().unwrap_or_else(|| config.observability.log_file.clone());
    init_tracing(&config, &log_file)?;
    info!(
        "Starting metrics-dash ({}, {:?})",
        if config.mock_responses { "demo" } else { config.api.base_url.as_str() },
        config.environment
    );

    let today = Local::now().date_naive();
    let controller = initial_range(&args, today)?;
    let source = build_source(&config)?;
    let tick_rate = Duration::from_millis(args.tick_ms.max(16));
    let mut app = App::new(config, source, controller, args.view, today);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_app(&mut terminal, &mut app, tick_rate).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if let Err(err) = &result {
        error!("metrics-dash exited with error: {:#}", err);
    }
    info!("metrics-dash stopped");
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, tick_rate: Duration) -> Result<()> {
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(tick_rate);

    loop {
        app.on_tick();
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            _ = ticker.tick() => {}
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) => app.handle_key(key),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
                None => break,
            },
        }

        if app.should_quit() {
            break;
        }
    }
    Ok(())
}
