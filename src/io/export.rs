//! Write the prediction table to CSV.
//!
//! The file is first written next to the destination and renamed into place
//! once complete, so a failed write never leaves a partial predictions file.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::AppError;
use crate::forecast::assemble::PredictionTable;

pub fn write_predictions_csv(path: &Path, table: &PredictionTable) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::persistence(format!(
                "Failed to create output directory '{}': {e}",
                parent.display()
            ))
        })?;
    }

    let tmp = staging_path(path);
    if let Err(e) = write_csv(&tmp, table) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        AppError::persistence(format!("Failed to move predictions into '{}': {e}", path.display()))
    })?;

    info!(path = %path.display(), rows = table.len(), "saved predictions");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "predictions.csv".into());
    name.push(".partial");
    path.with_file_name(name)
}

fn write_csv(path: &Path, table: &PredictionTable) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::persistence(format!("Failed to create predictions CSV '{}': {e}", path.display()))
    })?;
    let mut writer = csv::Writer::from_writer(file);

    writer
        .write_record(table.columns())
        .map_err(|e| AppError::persistence(format!("Failed to write predictions CSV header: {e}")))?;

    for row in table.rows() {
        let value = row.value.to_string();
        writer
            .write_record([row.series_id.as_str(), row.timestamp.as_str(), value.as_str()])
            .map_err(|e| AppError::persistence(format!("Failed to write predictions CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::persistence(format!("Failed to flush predictions CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::forecast::assemble::assemble;
    use indexmap::IndexMap;

    fn table() -> PredictionTable {
        let mut fut = IndexMap::new();
        fut.insert("A".to_string(), vec!["2024-01-04".to_string(), "2024-01-05".to_string()]);
        assemble(
            &["A".to_string()],
            &fut,
            &vec![vec![1.5, 2.25]],
            "id",
            "date",
            "prediction",
        )
        .unwrap()
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("predictions.csv");

        write_predictions_csv(&path, &table()).unwrap();

        let body = fs::read_to_string(&path).unwrap();
        assert_eq!(body, "id,date,prediction\nA,2024-01-04,1.5\nA,2024-01-05,2.25\n");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn unwritable_destination_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // The destination is an existing directory, so the final rename fails.
        let path = dir.path().join("predictions.csv");
        fs::create_dir(&path).unwrap();

        let err = write_predictions_csv(&path, &table()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert!(!staging_path(&path).exists());
    }
}
