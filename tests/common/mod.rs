//! Shared fixtures for the integration tests: an on-disk run layout, a
//! deterministic stub engine and a recording monitor.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use tempfile::TempDir;
use ts_forecast::domain::Paths;
use ts_forecast::error::AppError;
use ts_forecast::forecast::{ContextBatch, ForecastEngine, ForecastRequest, RawSamples};
use ts_forecast::monitor::ResourceMonitor;

/// A temporary root with the standard layout.
pub struct Workspace {
    pub dir: TempDir,
    pub paths: Paths,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::under(dir.path());
        Self { dir, paths }
    }

    pub fn write_schema(&self, forecast_length: usize) {
        let body = format!(
            r#"{{
                "title": "Daily sales",
                "frequency": "DAILY",
                "forecastLength": {forecast_length},
                "idField": {{"name": "store"}},
                "timeField": {{"name": "date", "dataType": "DATE"}},
                "forecastTarget": {{"name": "sales"}}
            }}"#
        );
        write(&self.paths.input_schema_dir.join("schema.json"), &body);
    }

    pub fn write_model_config(&self, model_name: &str, num_samples: usize) {
        self.write_model_config_with_field(model_name, num_samples, "prediction");
    }

    pub fn write_model_config_with_field(&self, model_name: &str, num_samples: usize, field: &str) {
        let body = format!(
            r#"{{
                "model_name": "{model_name}",
                "num_samples": {num_samples},
                "prediction_field_name": "{field}",
                "seed_value": 7
            }}"#
        );
        write(&self.paths.model_config_file, &body);
    }

    pub fn write_history(&self, csv: &str) {
        write(&self.paths.history_dir.join("train.csv"), csv);
    }

    pub fn write_future(&self, csv: &str) {
        write(&self.paths.future_dir.join("test.csv"), csv);
    }

    pub fn error_log_lines(&self) -> Vec<String> {
        fs::read_to_string(&self.paths.predict_error_file)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// History CSV: one row per (series, day) for days 1..=days, series
/// interleaved; values are `base + day` where base is 0 for the first series,
/// 100 for the second, and so on.
pub fn history_csv(series: &[&str], days: u32) -> String {
    let mut out = String::from("store,date,sales\n");
    for day in 1..=days {
        for (i, id) in series.iter().enumerate() {
            let value = (i as f64) * 100.0 + f64::from(day);
            out.push_str(&format!("{id},2024-01-{day:02},{value}\n"));
        }
    }
    out
}

/// Future CSV with `days` dates after `start_day` for each series.
pub fn future_csv(series: &[(&str, u32)], start_day: u32) -> String {
    let mut out = String::from("store,date\n");
    for (id, days) in series {
        for offset in 0..*days {
            out.push_str(&format!("{id},2024-01-{:02}\n", start_day + offset));
        }
    }
    out
}

/// Returns `last + sample_index + step` for every trajectory.
///
/// The mean over `n` samples is therefore `last + (n - 1) / 2 + step`.
pub struct StepEngine;

impl ForecastEngine for StepEngine {
    fn name(&self) -> &str {
        "step"
    }

    fn sample(&self, batch: &ContextBatch<'_>, request: &ForecastRequest) -> Result<RawSamples, AppError> {
        Ok(batch
            .sequences()
            .iter()
            .map(|seq| {
                let last = seq.last().copied().unwrap_or(0.0);
                (0..request.num_samples)
                    .map(|k| {
                        (0..request.horizon)
                            .map(|h| last + k as f64 + h as f64)
                            .collect()
                    })
                    .collect()
            })
            .collect())
    }
}

/// Two samples per series at `f64::MAX` and `-f64::MAX`; their mean is 0.
pub struct ExtremeEngine;

impl ForecastEngine for ExtremeEngine {
    fn name(&self) -> &str {
        "extreme"
    }

    fn sample(&self, batch: &ContextBatch<'_>, request: &ForecastRequest) -> Result<RawSamples, AppError> {
        Ok(batch
            .sequences()
            .iter()
            .map(|_| vec![vec![f64::MAX; request.horizon], vec![-f64::MAX; request.horizon]])
            .collect())
    }
}

/// Always fails.
pub struct FailingEngine;

impl ForecastEngine for FailingEngine {
    fn name(&self) -> &str {
        "failing"
    }

    fn sample(&self, _batch: &ContextBatch<'_>, _request: &ForecastRequest) -> Result<RawSamples, AppError> {
        Err(AppError::engine("device out of memory"))
    }
}

/// Returns one sample too few per series.
pub struct ShortEngine;

impl ForecastEngine for ShortEngine {
    fn name(&self) -> &str {
        "short"
    }

    fn sample(&self, batch: &ContextBatch<'_>, request: &ForecastRequest) -> Result<RawSamples, AppError> {
        Ok(batch
            .sequences()
            .iter()
            .map(|_| vec![vec![0.0; request.horizon]; request.num_samples.saturating_sub(1)])
            .collect())
    }
}

/// Counts start/stop calls.
#[derive(Debug, Default)]
pub struct RecordingMonitor {
    pub starts: usize,
    pub stops: usize,
}

impl ResourceMonitor for RecordingMonitor {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}
