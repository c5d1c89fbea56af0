use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use uptime_board::app::export_json;
use uptime_board::source::fetch_status;
use uptime_board::{
    events, ui, App, DashboardState, DataSource, FileSource, HttpSource, Settings,
    StatusSnapshot, Timing,
};

/// How often the screen is redrawn and input is polled.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "uptime-board", version)]
#[command(about = "Terminal dashboard for server uptime")]
struct Args {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL (e.g., http://localhost:9898)
    #[arg(short, long, conflicts_with = "file")]
    endpoint: Option<String>,

    /// Read snapshots from a JSON file instead of the backend
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Poll interval (e.g., "5s", "500ms")
    #[arg(short, long)]
    interval: Option<String>,

    /// Log file path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch once, export the dashboard state to a JSON file and exit
    #[arg(long)]
    export: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Set up file-based tracing. Logging to stdout/stderr would corrupt the
/// TUI. The returned guard must live until exit so logs get flushed.
fn setup_tracing(log_file: &Path, verbose: u8) -> WorkerGuard {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("uptime_board={log_level}")));

    let log_dir = log_file.parent().unwrap_or(Path::new("/tmp"));
    let log_filename = log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("uptime-board.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref endpoint) = args.endpoint {
        settings.endpoint = endpoint.clone();
    }
    if let Some(ref interval) = args.interval {
        settings.poll_interval = interval.clone();
    }
    if let Some(ref log_file) = args.log_file {
        settings.log_file = log_file.clone();
    }
    let timing = settings.timing()?;

    let _log_guard = setup_tracing(&settings.log_file, args.verbose);
    info!(?settings, "starting uptime-board");

    // Fetches run on this runtime while the UI loop owns the main thread
    let rt = tokio::runtime::Runtime::new()?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_to_file(&rt, args.file.as_deref(), &settings, timing, export_path);
    }

    let source: Box<dyn DataSource> = match args.file {
        Some(ref path) => Box::new(FileSource::new(path)),
        None => Box::new(
            HttpSource::builder()
                .endpoint(&settings.endpoint)
                .timeout(timing.request_timeout)
                .runtime(rt.handle().clone())
                .build()?,
        ),
    };

    run_tui(source, timing)
}

/// Run the TUI with the given data source
fn run_tui(source: Box<dyn DataSource>, timing: Timing) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    // Create app and request the first snapshot right away
    let mut app = App::new(source);
    app.request_refresh();

    let result = run_app(&mut terminal, &mut app, timing);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    timing: Timing,
) -> Result<()> {
    let mut last_poll = Instant::now();
    let mut last_tick = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(event) = events::poll_event(FRAME_INTERVAL)? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        if last_poll.elapsed() >= timing.poll_interval {
            app.request_refresh();
            last_poll = Instant::now();
        }
        if last_tick.elapsed() >= timing.clock_interval {
            app.tick_clock();
            last_tick = Instant::now();
        }

        // Pick up completed fetches
        app.reload_data();
    }

    Ok(())
}

/// Fetch one snapshot and export the resulting dashboard state
fn export_to_file(
    rt: &tokio::runtime::Runtime,
    file: Option<&Path>,
    settings: &Settings,
    timing: Timing,
    export_path: &Path,
) -> Result<()> {
    let snapshot: StatusSnapshot = match file {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => {
            let source = HttpSource::builder()
                .endpoint(&settings.endpoint)
                .timeout(timing.request_timeout)
                .runtime(rt.handle().clone())
                .build()?;
            rt.block_on(fetch_status(source.client(), source.endpoint()))
                .with_context(|| format!("Failed to fetch status from {}", settings.endpoint))?
        }
    };

    let mut dashboard = DashboardState::new();
    dashboard.apply(1, &snapshot, Utc::now());

    let json = serde_json::to_string_pretty(&export_json(&dashboard))?;
    std::fs::write(export_path, json)?;

    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}
