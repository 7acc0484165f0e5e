//! Shared batch-prediction workflow.
//!
//! Keeping this in one place lets the CLI and the integration tests drive the
//! same code path:
//! schema -> model config -> history -> future -> context -> forecast ->
//! aggregate -> assemble -> validate output -> persist
//!
//! The whole run happens while a resource monitor is active. Any failure is
//! logged, appended to the error log, and returned wrapped with the stage that
//! failed.

use std::path::Path;

use tracing::{error, info, warn};

use crate::domain::{ModelConfig, Paths, Schema};
use crate::engines::engine_for_model;
use crate::error::{AppError, Stage, StageContext};
use crate::forecast::{
    ForecastAdapter, ForecastEngine, ForecastRequest, PredictionTable, aggregate, assemble,
    build_context, future_timesteps_by_series,
};
use crate::io::{
    ErrorRecord, append_error_record, load_schema, read_csv_dir, read_model_config, validate_data,
    validate_predictions, write_predictions_csv,
};
use crate::monitor::{MonitorGuard, ResourceMonitor, ResourceTracker};

const PREDICT_TASK: &str = "prediction";

/// All computed outputs of a single `predict` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub schema: Schema,
    pub model_config: ModelConfig,
    pub predictions: PredictionTable,
}

/// Run batch prediction with the engine named in the model config and the
/// default resource tracker.
pub fn run_batch_predictions(paths: &Paths) -> Result<RunOutput, AppError> {
    let mut tracker = ResourceTracker::default();
    run_batch_predictions_with(paths, None, &mut tracker)
}

/// Run batch prediction with an explicit monitor and, optionally, an explicit
/// engine. When `engine` is `None` it is resolved from `model_name`.
pub fn run_batch_predictions_with(
    paths: &Paths,
    engine: Option<&dyn ForecastEngine>,
    monitor: &mut dyn ResourceMonitor,
) -> Result<RunOutput, AppError> {
    let result = {
        let _guard = MonitorGuard::start(monitor);
        predict(paths, engine)
    };
    result.map_err(|err| report_failure(PREDICT_TASK, &paths.predict_error_file, err))
}

fn predict(paths: &Paths, engine: Option<&dyn ForecastEngine>) -> Result<RunOutput, AppError> {
    info!("making batch predictions");

    let schema = load_schema(&paths.input_schema_dir).stage(Stage::LoadSchema)?;
    let model_config = read_model_config(&paths.model_config_file).stage(Stage::LoadModelConfig)?;
    info!(
        model = %model_config.model_name,
        seed = model_config.seed_value,
        num_samples = model_config.num_samples,
        horizon = schema.forecast_length,
        "loaded schema and model config"
    );

    let history = read_csv_dir(&paths.history_dir).stage(Stage::LoadHistory)?;
    let history = validate_data(&history, &schema, true).stage(Stage::ValidateHistory)?;
    let future = read_csv_dir(&paths.future_dir).stage(Stage::LoadFuture)?;
    let future = validate_data(&future, &schema, false).stage(Stage::ValidateFuture)?;
    info!(history_rows = history.len(), future_rows = future.len(), "validated inputs");

    let (context, series_ids) =
        build_context(&history, &schema.id_col, &schema.target).stage(Stage::BuildContext)?;

    let resolved: Box<dyn ForecastEngine>;
    let engine = match engine {
        Some(engine) => engine,
        None => {
            resolved = engine_for_model(&model_config.model_name).stage(Stage::Forecast)?;
            resolved.as_ref()
        }
    };
    let request = ForecastRequest {
        horizon: schema.forecast_length,
        num_samples: model_config.num_samples,
        sampling: model_config.sampling_params(),
        seed: model_config.seed_value,
    };
    let samples = ForecastAdapter::new(engine)
        .forecast(&context, &request)
        .stage(Stage::Forecast)?;
    let points = aggregate(&samples);

    let future_timesteps =
        future_timesteps_by_series(&future, &schema.id_col, &schema.time_col).stage(Stage::Assemble)?;
    let predictions = assemble(
        &series_ids,
        &future_timesteps,
        &points,
        &schema.id_col,
        &schema.time_col,
        &model_config.prediction_field_name,
    )
    .stage(Stage::Assemble)?;

    validate_predictions(&predictions, &schema, &model_config.prediction_field_name)
        .stage(Stage::ValidateOutput)?;
    write_predictions_csv(&paths.predictions_file, &predictions).stage(Stage::Persist)?;

    info!(
        series = series_ids.len(),
        rows = predictions.len(),
        "batch predictions completed successfully"
    );
    Ok(RunOutput {
        schema,
        model_config,
        predictions,
    })
}

/// Log a failed run, record it in the error log and wrap it for the caller.
///
/// A failure to write the error log is only warned about; the run error
/// is what the caller sees.
pub(crate) fn report_failure(task: &str, error_file: &Path, err: AppError) -> AppError {
    let message = format!("Error occurred during {task}.");
    error!(
        stage = err.stage().map(|s| s.name()).unwrap_or("unknown"),
        kind = %err.kind(),
        cause = %err,
        "{message}"
    );
    if let Err(log_err) = append_error_record(error_file, &ErrorRecord::new(task, &message, &err)) {
        warn!(path = %error_file.display(), error = %log_err, "failed to write error log");
    }
    err.wrap(task)
}
