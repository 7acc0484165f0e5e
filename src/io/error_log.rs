//! Append-only error log, separate from the run log.
//!
//! One JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: String,
    pub task: String,
    pub stage: Option<String>,
    pub kind: String,
    pub message: String,
    pub error: String,
}

impl ErrorRecord {
    pub fn new(task: &str, message: &str, error: &AppError) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            task: task.to_string(),
            stage: error.stage().map(|s| s.name().to_string()),
            kind: error.kind().label().to_string(),
            message: message.to_string(),
            error: error.message().to_string(),
        }
    }
}

/// Append `record` to the error log at `path`, creating it if needed.
pub fn append_error_record(path: &Path, record: &ErrorRecord) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::persistence(format!("Failed to create error log directory '{}': {e}", parent.display()))
        })?;
    }

    let mut line = serde_json::to_string(record)
        .map_err(|e| AppError::persistence(format!("Failed to encode error record: {e}")))?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| AppError::persistence(format!("Failed to open error log '{}': {e}", path.display())))?;
    file.write_all(line.as_bytes())
        .map_err(|e| AppError::persistence(format!("Failed to write error log: {e}")))?;
    Ok(())
}
