//! Schema-driven validation of input and output tables.
//!
//! Validation is strict: the first problem found fails the run with a
//! `ValidationError` naming the column, series, and line where possible.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::domain::{Schema, TimeValue};
use crate::error::AppError;
use crate::forecast::assemble::PredictionTable;
use crate::io::ingest::Table;

/// Validate a historical (`is_train = true`) or future table against `schema`.
///
/// Returns a new table whose rows are grouped by series in first-seen order,
/// each series sorted by its cast time value. Historical tables must carry a
/// finite numeric target on every row; future tables need not carry the target
/// column at all.
pub fn validate_data(table: &Table, schema: &Schema, is_train: bool) -> Result<Table, AppError> {
    let kind = if is_train { "historical" } else { "future" };

    let id_idx = require_column(table, &schema.id_col, kind)?;
    let time_idx = require_column(table, &schema.time_col, kind)?;
    let target_idx = if is_train {
        Some(require_column(table, &schema.target, kind)?)
    } else {
        None
    };

    if table.is_empty() {
        return Err(AppError::validation(format!("The {kind} data has no rows.")));
    }

    let mut groups: IndexMap<&str, Vec<(TimeValue, usize)>> = IndexMap::new();
    let mut seen = HashSet::new();

    for (idx, row) in table.rows().iter().enumerate() {
        // +2: 1-based lines, plus the header line.
        let line = idx + 2;

        let id = row[id_idx].as_str();
        if id.is_empty() {
            return Err(AppError::validation(format!(
                "Missing `{}` value in {kind} data (row {line}).",
                schema.id_col
            )));
        }

        let raw_time = row[time_idx].as_str();
        if raw_time.is_empty() {
            return Err(AppError::validation(format!(
                "Missing `{}` value in {kind} data (row {line}, series `{id}`).",
                schema.time_col
            )));
        }
        let time = schema.time_col_dtype.parse(raw_time).map_err(|e| {
            AppError::validation(format!("Column `{}` (row {line}): {e}", schema.time_col))
        })?;

        if let Some(t_idx) = target_idx {
            check_target(&row[t_idx], &schema.target, id, line)?;
        }

        if !seen.insert((id, time)) {
            return Err(AppError::validation(format!(
                "Duplicate ({}, {}) pair in {kind} data: (`{id}`, `{raw_time}`) (row {line}).",
                schema.id_col, schema.time_col
            )));
        }

        groups.entry(id).or_default().push((time, idx));
    }

    let mut rows = Vec::with_capacity(table.len());
    for entries in groups.values_mut() {
        entries.sort_by_key(|(time, _)| *time);
        rows.extend(entries.iter().map(|(_, idx)| table.rows()[*idx].clone()));
    }

    debug!(kind, series = groups.len(), rows = rows.len(), "validated data");
    Table::new(table.headers().to_vec(), rows)
}

fn require_column(table: &Table, name: &str, kind: &str) -> Result<usize, AppError> {
    table.column_index(name).ok_or_else(|| {
        AppError::validation(format!(
            "Missing required column `{name}` in {kind} data (found: {}).",
            table.headers().join(", ")
        ))
    })
}

fn check_target(raw: &str, target: &str, id: &str, line: usize) -> Result<(), AppError> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(()),
        _ if raw.is_empty() => Err(AppError::validation(format!(
            "Missing `{target}` value (row {line}, series `{id}`)."
        ))),
        _ => Err(AppError::validation(format!(
            "Invalid `{target}` value '{raw}' (row {line}, series `{id}`): expected a finite number."
        ))),
    }
}

/// Check an assembled prediction table before it is persisted.
pub fn validate_predictions(
    table: &PredictionTable,
    schema: &Schema,
    prediction_field: &str,
) -> Result<(), AppError> {
    let expected = [schema.id_col.as_str(), schema.time_col.as_str(), prediction_field];
    if table.columns() != expected {
        return Err(AppError::validation(format!(
            "Prediction columns [{}] do not match expected [{}].",
            table.columns().join(", "),
            expected.join(", ")
        )));
    }

    if prediction_field == schema.id_col || prediction_field == schema.time_col {
        return Err(AppError::validation(format!(
            "Prediction field `{prediction_field}` collides with an id or time column."
        )));
    }

    if table.is_empty() {
        return Err(AppError::validation("Prediction table is empty."));
    }

    for (idx, row) in table.rows().iter().enumerate() {
        if row.series_id.is_empty() || row.timestamp.is_empty() {
            return Err(AppError::validation(format!(
                "Prediction row {idx} has an empty id or timestamp."
            )));
        }
        if !row.value.is_finite() {
            return Err(AppError::validation(format!(
                "Prediction row {idx} (series `{}`, `{}`) has non-finite value {}.",
                row.series_id, row.timestamp, row.value
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeDtype;
    use crate::error::ErrorKind;

    fn schema() -> Schema {
        Schema {
            title: None,
            id_col: "id".to_string(),
            time_col: "t".to_string(),
            time_col_dtype: TimeDtype::Int,
            target: "y".to_string(),
            forecast_length: 2,
            frequency: None,
            past_covariates: Vec::new(),
            future_covariates: Vec::new(),
            static_covariates: Vec::new(),
        }
    }

    fn table(rows: &[[&str; 3]]) -> Table {
        Table::new(
            vec!["id".to_string(), "t".to_string(), "y".to_string()],
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn sorts_within_series_keeping_first_seen_series_order() {
        let t = table(&[
            ["B", "2", "20"],
            ["A", "10", "1"],
            ["B", "1", "10"],
            ["A", "9", "0"],
        ]);

        let v = validate_data(&t, &schema(), true).unwrap();
        let ids: Vec<&str> = v.column("id").unwrap().collect();
        let ys: Vec<&str> = v.column("y").unwrap().collect();
        assert_eq!(ids, ["B", "B", "A", "A"]);
        assert_eq!(ys, ["10", "20", "0", "1"]);
    }

    #[test]
    fn duplicate_id_time_pair_is_rejected() {
        let t = table(&[["A", "1", "1"], ["A", "01", "2"]]);
        let err = validate_data(&t, &schema(), true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("Duplicate"));
    }

    #[test]
    fn non_numeric_target_only_checked_for_history() {
        let t = table(&[["A", "1", ""], ["A", "2", "n/a"]]);
        assert!(validate_data(&t, &schema(), true).is_err());
        assert!(validate_data(&t, &schema(), false).is_ok());
    }

    fn predictions(value_col: &str, values: &[f64]) -> PredictionTable {
        let mut future = IndexMap::new();
        future.insert("A".to_string(), vec!["1".to_string(), "2".to_string()]);
        crate::forecast::assemble::assemble(
            &["A".to_string()],
            &future,
            &vec![values.to_vec()],
            "id",
            "t",
            value_col,
        )
        .unwrap()
    }

    #[test]
    fn predictions_pass_with_distinct_finite_columns() {
        assert!(validate_predictions(&predictions("y_hat", &[1.0, 2.0]), &schema(), "y_hat").is_ok());
    }

    #[test]
    fn prediction_field_must_not_shadow_id_or_time() {
        let err = validate_predictions(&predictions("id", &[1.0, 2.0]), &schema(), "id").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.message().contains("collides"));
    }

    #[test]
    fn non_finite_prediction_is_rejected() {
        let err = validate_predictions(&predictions("y_hat", &[1.0, f64::NAN]), &schema(), "y_hat")
            .unwrap_err();
        assert!(err.message().contains("non-finite"));
    }

    #[test]
    fn future_data_may_omit_target_column() {
        let t = Table::new(
            vec!["id".to_string(), "t".to_string()],
            vec![vec!["A".to_string(), "3".to_string()]],
        )
        .unwrap();
        assert!(validate_data(&t, &schema(), false).is_ok());
        assert!(validate_data(&t, &schema(), true).is_err());
    }
}
