//! Command-line parsing for the batch forecaster.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline. Paths default to the standard layout under `--root`; each one can
//! be overridden individually.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::domain::Paths;

/// Environment variable consulted when `--root` is not given.
pub const ROOT_ENV: &str = "TS_FORECAST_ROOT";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "ts-forecast",
    version,
    about = "Batch time-series forecasting with a pretrained sampling model"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Forecast every series in the history data and write the predictions CSV.
    Predict(RunArgs),
    /// Prepare model artifacts. The pretrained model needs no fitting, so this
    /// only writes a marker file.
    Train(RunArgs),
}

/// Options shared by both subcommands.
#[derive(Debug, Args, Clone, Default)]
pub struct RunArgs {
    /// Root of the standard directory layout (falls back to $TS_FORECAST_ROOT, then `.`).
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Directory holding exactly one schema JSON file.
    #[arg(long)]
    pub schema_dir: Option<PathBuf>,

    /// Model configuration JSON file.
    #[arg(long)]
    pub model_config: Option<PathBuf>,

    /// Directory of historical (training) CSV files.
    #[arg(long)]
    pub history_dir: Option<PathBuf>,

    /// Directory of future (testing) CSV files.
    #[arg(long)]
    pub future_dir: Option<PathBuf>,

    /// Where to write the predictions CSV.
    #[arg(long)]
    pub predictions: Option<PathBuf>,

    /// Error log for this subcommand.
    #[arg(long)]
    pub error_log: Option<PathBuf>,

    /// Directory for model artifacts.
    #[arg(long)]
    pub artifacts_dir: Option<PathBuf>,

    /// Resource monitor polling interval, in seconds.
    #[arg(long, default_value_t = 5)]
    pub monitor_interval: u64,
}

impl RunArgs {
    pub fn monitor_interval(&self) -> Duration {
        Duration::from_secs(self.monitor_interval.max(1))
    }

    /// Resolve the run layout. `env_root` is the value of [`ROOT_ENV`], if set.
    ///
    /// `--error-log` overrides the error file of whichever task runs, so it is
    /// applied to both.
    pub fn paths(&self, env_root: Option<PathBuf>) -> Paths {
        let root = self
            .root
            .clone()
            .or(env_root)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut paths = Paths::under(&root);

        override_with(&mut paths.input_schema_dir, &self.schema_dir);
        override_with(&mut paths.model_config_file, &self.model_config);
        override_with(&mut paths.history_dir, &self.history_dir);
        override_with(&mut paths.future_dir, &self.future_dir);
        override_with(&mut paths.predictions_file, &self.predictions);
        override_with(&mut paths.predict_error_file, &self.error_log);
        override_with(&mut paths.train_error_file, &self.error_log);
        override_with(&mut paths.model_artifacts_dir, &self.artifacts_dir);
        paths
    }
}

fn override_with(slot: &mut PathBuf, value: &Option<PathBuf>) {
    if let Some(path) = value.as_deref().filter(|p| !p.as_os_str().is_empty()) {
        *slot = path.to_path_buf();
    }
}
