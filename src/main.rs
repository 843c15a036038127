use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing_subscriber::EnvFilter;

use workout_grid::storage::{shared_store, Config, InMemoryWorkoutStore};
use workout_grid::store::WorkoutStore;

mod cli;
use cli::{parse_cli_mode, CliMode, USAGE};
mod tui;
use tui::{run_tui, sample_workouts};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = match parse_cli_mode(std::env::args().skip(1)) {
        Ok(CliMode::Run(options)) => options,
        Ok(CliMode::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            println!("{}", USAGE);
            return Ok(());
        }
    };

    setup_logging();

    let mut config = Config::load_or_create().context("Failed to load configuration")?;
    if let Some(path) = options.db {
        config.storage.database_path = path;
    }

    let store: Arc<dyn WorkoutStore> = if options.sample {
        tracing::info!("Using in-memory sample store");
        Arc::new(InMemoryWorkoutStore::with_workouts(sample_workouts(Local::now().date_naive())))
    } else {
        let path = &config.storage.database_path;
        match shared_store(path).await {
            Ok(store) => store as Arc<dyn WorkoutStore>,
            Err(e) => {
                tracing::error!("Failed to open {}: {}", path.display(), e);
                eprintln!("Failed to open workout database {}: {}", path.display(), e);
                return Ok(());
            }
        }
    };

    run_tui(store, &config).await
}

fn setup_logging() {
    let log_dir = dirs::config_dir()
        .map(|d| d.join("workout-grid"))
        .unwrap_or_else(|| std::path::PathBuf::from("."));

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "workout-grid.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .init();

    std::mem::forget(_guard);

    tracing::info!("workout-grid started");
}
