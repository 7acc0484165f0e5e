//! Training stage.
//!
//! The pretrained model needs no fitting, so training only leaves a marker in
//! the artifacts directory. Failures go through the same envelope as
//! prediction, with the training error log.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::app::pipeline::report_failure;
use crate::domain::Paths;
use crate::error::{AppError, Stage, StageContext};
use crate::monitor::{MonitorGuard, ResourceMonitor};

const TRAIN_TASK: &str = "training";

pub const MARKER_FILE: &str = "dummy.txt";
pub const MARKER_CONTENTS: &str = "model artifacts";

/// Write the artifacts marker and return its path.
pub fn run_training(paths: &Paths, monitor: &mut dyn ResourceMonitor) -> Result<PathBuf, AppError> {
    let result = {
        let _guard = MonitorGuard::start(monitor);
        write_marker(paths).stage(Stage::Train)
    };
    result.map_err(|err| report_failure(TRAIN_TASK, &paths.train_error_file, err))
}

fn write_marker(paths: &Paths) -> Result<PathBuf, AppError> {
    let dir = &paths.model_artifacts_dir;
    fs::create_dir_all(dir).map_err(|e| {
        AppError::persistence(format!("Failed to create artifacts directory '{}': {e}", dir.display()))
    })?;

    let path = dir.join(MARKER_FILE);
    fs::write(&path, MARKER_CONTENTS)
        .map_err(|e| AppError::persistence(format!("Failed to write '{}': {e}", path.display())))?;

    info!(path = %path.display(), "training complete; no fitting required");
    Ok(path)
}
