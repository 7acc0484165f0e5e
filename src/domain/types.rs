//! Shared domain types.
//!
//! These are plain data: the schema describing the dataset, the model
//! configuration, and the resolved filesystem layout for a run. Loading and
//! validating them lives in `crate::io`.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// How the time column is cast before validation and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeDtype {
    /// Calendar date (`YYYY-MM-DD`).
    Date,
    /// Date and time (`YYYY-MM-DD HH:MM:SS`, optional fraction, or `T` separator).
    Datetime,
    /// Integer time index.
    Int,
}

/// A cast time-column value.
///
/// Values of one run always share the same variant, so the derived ordering
/// (variant first, then value) is only ever used within one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimeValue {
    Int(i64),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

impl TimeDtype {
    /// Cast a raw cell to this dtype.
    pub fn parse(self, raw: &str) -> Result<TimeValue, String> {
        let s = raw.trim();
        match self {
            TimeDtype::Int => s
                .parse::<i64>()
                .map(TimeValue::Int)
                .map_err(|_| format!("Invalid INT time value '{s}'.")),
            TimeDtype::Date => {
                const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
                for fmt in FMTS {
                    if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                        return Ok(TimeValue::Date(d));
                    }
                }
                // Date columns exported with a time component keep only the date.
                parse_datetime(s)
                    .map(|dt| TimeValue::Date(dt.date()))
                    .ok_or_else(|| format!("Invalid DATE time value '{s}'. Expected YYYY-MM-DD."))
            }
            TimeDtype::Datetime => {
                if let Some(dt) = parse_datetime(s) {
                    return Ok(TimeValue::Datetime(dt));
                }
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(TimeValue::Datetime)
                    .ok_or_else(|| {
                        format!("Invalid DATETIME time value '{s}'. Expected YYYY-MM-DD HH:MM:SS.")
                    })
            }
        }
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    const FMTS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FMTS.iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Column roles and horizon for one dataset. Immutable for the run.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub title: Option<String>,
    pub id_col: String,
    pub time_col: String,
    pub time_col_dtype: TimeDtype,
    pub target: String,
    pub forecast_length: usize,
    pub frequency: Option<String>,
    pub past_covariates: Vec<String>,
    pub future_covariates: Vec<String>,
    pub static_covariates: Vec<String>,
}

/// Sampling controls handed to the forecasting capability untouched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f64,
    pub top_k: Option<usize>,
    pub top_p: Option<f64>,
}

/// Temperature used when the model configuration does not set one.
pub const DEFAULT_TEMPERATURE: f64 = 1e-4;

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            top_k: None,
            top_p: None,
        }
    }
}

/// Model configuration document (`model_config.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_name: String,
    pub num_samples: usize,
    pub prediction_field_name: String,
    pub seed_value: u64,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub top_p: Option<f64>,
}

impl ModelConfig {
    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            top_k: self.top_k,
            top_p: self.top_p,
        }
    }
}

/// Filesystem layout of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub input_schema_dir: PathBuf,
    pub model_config_file: PathBuf,
    pub history_dir: PathBuf,
    pub future_dir: PathBuf,
    pub predictions_file: PathBuf,
    pub predict_error_file: PathBuf,
    pub train_error_file: PathBuf,
    pub model_artifacts_dir: PathBuf,
}

impl Paths {
    /// Default layout under `root`.
    pub fn under(root: &Path) -> Self {
        Self {
            input_schema_dir: root.join("inputs").join("schema"),
            model_config_file: root.join("model").join("config").join("model_config.json"),
            history_dir: root.join("inputs").join("data").join("training"),
            future_dir: root.join("inputs").join("data").join("testing"),
            predictions_file: root.join("outputs").join("predictions").join("predictions.csv"),
            predict_error_file: root.join("outputs").join("errors").join("predict_error.txt"),
            train_error_file: root.join("outputs").join("errors").join("train_error.txt"),
            model_artifacts_dir: root.join("model").join("artifacts"),
        }
    }
}
