use clap::{Parser, ValueEnum};
use color_eyre::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use riskboard::config::Config;
use riskboard::core::{EvaluationPolicy, PredictResponse};
use riskboard::tui::App;
use std::io;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

/// Terminal dashboard for student risk prediction reports
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// Show a saved prediction response (JSON) on startup
    #[arg(long = "report", value_name = "PATH")]
    report: Option<PathBuf>,
    /// Upload a CSV with the default policy on startup
    #[arg(long = "upload", value_name = "CSV")]
    upload: Option<PathBuf>,
    /// Backend base URL (overrides the config file)
    #[arg(long = "api", value_name = "URL")]
    api: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    riskboard::logging::init_with(None, args.logging.map(Into::into))?;

    let mut config = match Config::from_path(args.config.as_ref()) {
        Ok(cfg) => cfg,
        Err(e) if args.config.is_some() => return Err(e.into()),
        Err(e) => {
            warn!("falling back to built-in config: {e}");
            Config::default()
        }
    };
    if let Some(api) = &args.api {
        config.api_base_url = api.trim().trim_end_matches('/').to_string();
    }
    info!("backend at '{}'", config.api_base_url);

    let mut app = App::new(&config);
    if let Some(path) = &args.report {
        app.load_report(PredictResponse::load_from_file(path)?);
    }
    if let Some(csv) = args.upload {
        app.start_upload(csv, EvaluationPolicy::default());
    }

    // Restore the terminal before the panic report is printed
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        default_hook(info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app, &config);

    restore_terminal()?;
    if let Err(e) = &res {
        error!("Error: {e}");
    }
    res
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    config: &Config,
) -> Result<()> {
    let tick_rate = config.tick_rate();
    let frame_rate = config.frame_rate();
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| app.render(f))?;
        // Layout is current now; run the measurements queued since the last frame
        app.on_frame();

        let timeout = frame_rate.min(tick_rate.saturating_sub(last_tick.elapsed()));
        if event::poll(timeout)? {
            app.handle_event(event::read()?)?;
        }
        // Timers are checked every frame; the tick rate only bounds the idle wait
        let now = Instant::now();
        app.tick(now)?;
        if now.duration_since(last_tick) >= tick_rate {
            last_tick = now;
        }
        if app.should_quit() {
            break;
        }
    }
    Ok(())
}
