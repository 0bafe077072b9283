use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod filter;
mod model;
mod search;
mod ui;

#[cfg(test)]
mod tests;

use controller::Controller;
use domain::{SiftConfig, SiftError};
use model::{Model, Status};
use ui::TableUI;

/// A tui based tabular data viewer with a per-column filter row.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Data file to view (csv, parquet, arrow/ipc)
    path: String,

    /// Append logs to this file (controlled by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_file.as_deref()) {
        eprintln!("Error: could not set up logging: {:?}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Err(e) => {
            ratatui::restore();
            eprintln!("Error: {:?}", e);
            ExitCode::FAILURE
        }
        Ok(_) => {
            ratatui::restore();
            ExitCode::SUCCESS
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<(), SiftError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    match log_file {
        Some(path) => {
            // Logs never go to stdout, that would garble the UI
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::sync::Mutex::new(file))
                        .with_ansi(false),
                )
                .with(ErrorLayer::default())
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(ErrorLayer::default())
                .init();
        }
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), SiftError> {
    let path = shellexpand::full(&cli.path)
        .map_err(|e| SiftError::LoadingFailed(e.to_string()))?
        .into_owned();
    info!("Starting colsift on {path} ...");

    let cfg = SiftConfig {
        event_poll_time: cli.poll_ms,
        ..SiftConfig::default()
    };

    let mut terminal = ratatui::init();
    let size = terminal.size()?;

    let mut model = Model::init(&cfg, size.width as usize, size.height as usize);
    model.load_data_file(path.into())?;

    let ui = TableUI::new();
    let controller = Controller::new(&cfg);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }

    Ok(())
}
