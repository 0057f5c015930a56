use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod aggregate;
mod controller;
mod domain;
mod export;
mod filter;
mod model;
mod source;
mod table;
mod ui;

#[cfg(test)]
mod fixtures;

use controller::Controller;
use domain::{DEFAULT_TITLE, DashboardConfig, SurveyError};
use model::{Model, Status};
use source::JsonDocumentSource;
use ui::DashboardUI;

/// Terminal dashboard for political survey records
#[derive(Parser, Debug)]
#[command(name = "sdash", version, about)]
struct Args {
    /// Survey document export, a JSON array or one document per line
    #[arg(env = "SURVEY_SOURCE")]
    source: String,

    /// Directory the CSV downloads are written to
    #[arg(short, long, default_value = ".", env = "SURVEY_EXPORT_DIR")]
    export_dir: String,

    /// Dashboard title
    #[arg(short, long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Log file, the terminal itself is used by the dashboard
    #[arg(long, default_value = "sdash.log", env = "SURVEY_LOG_FILE")]
    log_file: String,

    /// Key event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    event_poll_time: u64,

    /// Widest a table column is rendered
    #[arg(long, default_value_t = 30)]
    max_column_width: usize,
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn expand(path: &str) -> Result<PathBuf, SurveyError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| SurveyError::LoadingFailed(e.to_string()))
}

fn init_logging(path: &Path) -> Result<(), SurveyError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "sdash=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();
    Ok(())
}

fn run() -> Result<(), SurveyError> {
    let args = Args::parse();
    init_logging(&expand(&args.log_file)?)?;

    let cfg = DashboardConfig::default()
        .with_title(args.title)
        .with_source(expand(&args.source)?)
        .with_export_dir(expand(&args.export_dir)?)
        .with_event_poll_time(args.event_poll_time)
        .with_max_column_width(args.max_column_width);
    info!("Starting sdash with {:?}", cfg);

    // Fetch before the terminal is taken over so a broken source exits cleanly.
    let source = JsonDocumentSource::open(cfg.source.clone())?;
    let (width, height) = ratatui::crossterm::terminal::size()?;
    let mut model = Model::init(&cfg, Box::new(source), width as usize, height as usize)?;

    let mut terminal = ratatui::init();
    let result = event_loop(&cfg, &mut model, &mut terminal);
    ratatui::restore();
    result
}

fn event_loop(
    cfg: &DashboardConfig,
    model: &mut Model,
    terminal: &mut DefaultTerminal,
) -> Result<(), SurveyError> {
    let ui = DashboardUI::new(cfg);
    let controller = Controller::new(cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(model)? {
            model.update(Some(message))?;
        };
    }
    info!("Quitting sdash");
    Ok(())
}
