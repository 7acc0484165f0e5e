//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - resolves the run layout
//! - dispatches to prediction or training

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Command, ROOT_ENV, RunArgs};
use crate::error::AppError;
use crate::monitor::ResourceTracker;

pub mod pipeline;
pub mod train;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "ts_forecast=info";

/// Entry point for the `ts-forecast` binary.
pub fn run() -> Result<(), AppError> {
    // Optional `.env` next to the working directory.
    dotenvy::dotenv().ok();
    init_logging();

    // `ts-forecast` alone behaves like `ts-forecast predict`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Predict(args) => handle_predict(&args),
        Command::Train(args) => handle_train(&args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    // Ignore a second init (e.g. when embedded in a process that already set one).
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

fn handle_predict(args: &RunArgs) -> Result<(), AppError> {
    let paths = args.paths(env_root());
    let mut tracker = ResourceTracker::new(args.monitor_interval());
    let run = pipeline::run_batch_predictions_with(&paths, None, &mut tracker)?;

    println!(
        "Wrote {} predictions for {} to {}",
        run.predictions.len(),
        run.schema.title.as_deref().unwrap_or("dataset"),
        paths.predictions_file.display()
    );
    Ok(())
}

fn handle_train(args: &RunArgs) -> Result<(), AppError> {
    let paths = args.paths(env_root());
    let mut tracker = ResourceTracker::new(args.monitor_interval());
    let marker = train::run_training(&paths, &mut tracker)?;
    info!(marker = %marker.display(), "artifacts ready");
    Ok(())
}

fn env_root() -> Option<PathBuf> {
    std::env::var_os(ROOT_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Rewrite argv so `ts-forecast` defaults to `ts-forecast predict`.
///
/// Rules:
/// - `ts-forecast`                      -> `ts-forecast predict`
/// - `ts-forecast --root DIR ...`       -> `ts-forecast predict --root DIR ...`
/// - `ts-forecast --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("predict".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "predict".to_string());
    }
    argv
}
