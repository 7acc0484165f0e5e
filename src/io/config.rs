//! Schema and model-configuration loading.
//!
//! Both documents are JSON and read once at the start of a run.

use std::fs::{self, File};
use std::path::Path;

use serde::Deserialize;

use crate::domain::{ModelConfig, Schema, TimeDtype};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSchema {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    frequency: Option<String>,
    forecast_length: i64,
    id_field: NamedField,
    time_field: TimeField,
    forecast_target: NamedField,
    #[serde(default)]
    past_covariates: Vec<NamedField>,
    #[serde(default)]
    future_covariates: Vec<NamedField>,
    #[serde(default)]
    static_covariates: Vec<NamedField>,
}

#[derive(Debug, Deserialize)]
struct NamedField {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimeField {
    name: String,
    data_type: TimeDtype,
}

/// Load the schema from the single `*.json` file in `dir`.
pub fn load_schema(dir: &Path) -> Result<Schema, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::schema(format!("Failed to read schema directory '{}': {e}", dir.display()))
    })?;

    let mut json_files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| AppError::schema(format!("Failed to list schema directory: {e}")))?
            .path();
        if path.extension().and_then(|e| e.to_str()) == Some("json") {
            json_files.push(path);
        }
    }

    let path = match json_files.as_slice() {
        [one] => one,
        [] => {
            return Err(AppError::schema(format!(
                "No schema JSON file found in '{}'.",
                dir.display()
            )));
        }
        _ => {
            return Err(AppError::schema(format!(
                "Expected exactly one schema JSON file in '{}', found {}.",
                dir.display(),
                json_files.len()
            )));
        }
    };

    let file = File::open(path)
        .map_err(|e| AppError::schema(format!("Failed to open schema '{}': {e}", path.display())))?;
    let raw: RawSchema = serde_json::from_reader(file)
        .map_err(|e| AppError::schema(format!("Invalid schema JSON '{}': {e}", path.display())))?;

    schema_from_raw(raw)
}

fn schema_from_raw(raw: RawSchema) -> Result<Schema, AppError> {
    if raw.forecast_length <= 0 {
        return Err(AppError::schema(format!(
            "`forecastLength` must be a positive integer, got {}.",
            raw.forecast_length
        )));
    }

    let id_col = non_empty(raw.id_field.name, "idField.name")?;
    let time_col = non_empty(raw.time_field.name, "timeField.name")?;
    let target = non_empty(raw.forecast_target.name, "forecastTarget.name")?;

    if id_col == time_col || id_col == target || time_col == target {
        return Err(AppError::schema(
            "Schema id, time, and target columns must be distinct.",
        ));
    }

    let names = |fields: Vec<NamedField>| fields.into_iter().map(|f| f.name).collect::<Vec<_>>();

    Ok(Schema {
        title: raw.title,
        id_col,
        time_col,
        time_col_dtype: raw.time_field.data_type,
        target,
        forecast_length: raw.forecast_length as usize,
        frequency: raw.frequency,
        past_covariates: names(raw.past_covariates),
        future_covariates: names(raw.future_covariates),
        static_covariates: names(raw.static_covariates),
    })
}

fn non_empty(value: String, field: &str) -> Result<String, AppError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(AppError::schema(format!("Schema field `{field}` is empty.")));
    }
    Ok(value)
}

/// Read and check the model configuration.
pub fn read_model_config(path: &Path) -> Result<ModelConfig, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!("Failed to open model config '{}': {e}", path.display()))
    })?;
    let config: ModelConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::config(format!("Invalid model config JSON: {e}")))?;
    check_model_config(&config)?;
    Ok(config)
}

fn check_model_config(config: &ModelConfig) -> Result<(), AppError> {
    if config.model_name.trim().is_empty() {
        return Err(AppError::config("`model_name` must not be empty."));
    }
    if config.num_samples == 0 {
        return Err(AppError::config("`num_samples` must be > 0."));
    }
    if config.prediction_field_name.trim().is_empty() {
        return Err(AppError::config("`prediction_field_name` must not be empty."));
    }
    if let Some(t) = config.temperature {
        if !(t.is_finite() && t > 0.0) {
            return Err(AppError::config("`temperature` must be finite and > 0."));
        }
    }
    if config.top_k == Some(0) {
        return Err(AppError::config("`top_k` must be > 0."));
    }
    if let Some(p) = config.top_p {
        if !(p > 0.0 && p <= 1.0) {
            return Err(AppError::config("`top_p` must be in (0, 1]."));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SCHEMA: &str = r#"{
        "title": "Demo",
        "modelCategory": "forecasting",
        "frequency": "DAILY",
        "forecastLength": 3,
        "idField": {"name": "series_id", "description": "id"},
        "timeField": {"name": "date", "dataType": "DATE", "example": "2024-01-01"},
        "forecastTarget": {"name": "sales", "example": 1.0},
        "pastCovariates": [{"name": "price"}]
    }"#;

    #[test]
    fn loads_single_schema_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("schema.json"), SCHEMA).unwrap();

        let schema = load_schema(dir.path()).unwrap();
        assert_eq!(schema.id_col, "series_id");
        assert_eq!(schema.time_col, "date");
        assert_eq!(schema.time_col_dtype, TimeDtype::Date);
        assert_eq!(schema.target, "sales");
        assert_eq!(schema.forecast_length, 3);
        assert_eq!(schema.past_covariates, vec!["price".to_string()]);
    }

    #[test]
    fn rejects_non_positive_horizon() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("schema.json"),
            SCHEMA.replace("\"forecastLength\": 3", "\"forecastLength\": 0"),
        )
        .unwrap();

        let err = load_schema(dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
    }

    #[test]
    fn missing_schema_is_schema_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_schema(dir.path()).unwrap_err().kind(), ErrorKind::Schema);
    }

    #[test]
    fn model_config_rejects_zero_samples() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_config.json");
        fs::write(
            &path,
            r#"{"model_name": "naive", "num_samples": 0, "prediction_field_name": "prediction", "seed_value": 1}"#,
        )
        .unwrap();

        assert_eq!(read_model_config(&path).unwrap_err().kind(), ErrorKind::Config);
    }

    #[test]
    fn model_config_optional_sampling_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_config.json");
        fs::write(
            &path,
            r#"{"model_name": "random-walk", "num_samples": 20, "prediction_field_name": "prediction",
                "seed_value": 7, "temperature": 0.5, "top_p": 0.9}"#,
        )
        .unwrap();

        let cfg = read_model_config(&path).unwrap();
        assert_eq!(cfg.temperature, Some(0.5));
        assert_eq!(cfg.top_p, Some(0.9));
        assert_eq!(cfg.top_k, None);
    }
}
