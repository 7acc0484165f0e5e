//! Output assembly: join point forecasts with ids and future timestamps.
//!
//! Future timestamps are taken from the future data as given. This module does
//! no calendar arithmetic.

use indexmap::IndexMap;

use crate::error::AppError;
use crate::forecast::aggregate::PointForecasts;
use crate::io::ingest::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRow {
    pub series_id: String,
    pub timestamp: String,
    pub value: f64,
}

/// The prediction table, `[id_col, time_col, value_col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTable {
    id_col: String,
    time_col: String,
    value_col: String,
    rows: Vec<PredictionRow>,
}

impl PredictionTable {
    pub fn columns(&self) -> [&str; 3] {
        [self.id_col.as_str(), self.time_col.as_str(), self.value_col.as_str()]
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Future timestamps per series, in the order they appear in `table`.
pub fn future_timesteps_by_series(
    table: &Table,
    id_col: &str,
    time_col: &str,
) -> Result<IndexMap<String, Vec<String>>, AppError> {
    let id_idx = table
        .column_index(id_col)
        .ok_or_else(|| AppError::misalignment(format!("Future data has no `{id_col}` column.")))?;
    let time_idx = table
        .column_index(time_col)
        .ok_or_else(|| AppError::misalignment(format!("Future data has no `{time_col}` column.")))?;

    let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
    for row in table.rows() {
        out.entry(row[id_idx].clone())
            .or_default()
            .push(row[time_idx].clone());
    }
    Ok(out)
}

/// Build the prediction table.
///
/// For each id of `ordered_series_ids`, emits `horizon` rows pairing the first
/// `horizon` future timestamps of that series with its point forecasts, where
/// `horizon` is the length of the point-forecast rows. Every series is checked
/// before any row is built.
pub fn assemble(
    ordered_series_ids: &[String],
    future_timesteps_per_series: &IndexMap<String, Vec<String>>,
    point_forecast_per_series: &PointForecasts,
    id_col: &str,
    time_col: &str,
    value_col: &str,
) -> Result<PredictionTable, AppError> {
    if ordered_series_ids.len() != point_forecast_per_series.len() {
        return Err(AppError::shape(format!(
            "{} series ids but {} point forecasts.",
            ordered_series_ids.len(),
            point_forecast_per_series.len()
        )));
    }
    let horizon = point_forecast_per_series.first().map_or(0, Vec::len);
    if horizon == 0 {
        return Err(AppError::shape("Point forecasts are empty."));
    }

    let mut aligned = Vec::with_capacity(ordered_series_ids.len());
    for (id, points) in ordered_series_ids.iter().zip(point_forecast_per_series) {
        if points.len() != horizon {
            return Err(AppError::shape(format!(
                "Series `{id}` has {} point forecasts, expected {horizon}.",
                points.len()
            )));
        }
        let timestamps = future_timesteps_per_series
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if timestamps.len() < horizon {
            return Err(AppError::misalignment(format!(
                "Series `{id}` has {} future timestamps, need at least {horizon}.",
                timestamps.len()
            )));
        }
        aligned.push((id, &timestamps[..horizon], points));
    }

    let rows = aligned
        .into_iter()
        .flat_map(|(id, timestamps, points)| {
            timestamps.iter().zip(points).map(move |(ts, &value)| PredictionRow {
                series_id: id.clone(),
                timestamp: ts.clone(),
                value,
            })
        })
        .collect();

    Ok(PredictionTable {
        id_col: id_col.to_string(),
        time_col: time_col.to_string(),
        value_col: value_col.to_string(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn future(entries: &[(&str, &[&str])]) -> IndexMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(id, ts)| (id.to_string(), ts.iter().map(|t| t.to_string()).collect()))
            .collect()
    }

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn emits_horizon_rows_per_series_in_context_order() {
        // Future data lists B first; output must follow context order (A, B).
        let fut = future(&[("B", &["4", "5", "6"][..]), ("A", &["11", "12", "13", "14"][..])]);
        let points = vec![vec![1.0, 2.0, 3.0], vec![7.0, 8.0, 9.0]];

        let table = assemble(&ids(&["A", "B"]), &fut, &points, "id", "t", "pred").unwrap();
        assert_eq!(table.columns(), ["id", "t", "pred"]);
        assert_eq!(table.len(), 6);

        let got: Vec<(&str, &str, f64)> = table
            .rows()
            .iter()
            .map(|r| (r.series_id.as_str(), r.timestamp.as_str(), r.value))
            .collect();
        assert_eq!(
            got,
            vec![
                ("A", "11", 1.0),
                ("A", "12", 2.0),
                ("A", "13", 3.0),
                ("B", "4", 7.0),
                ("B", "5", 8.0),
                ("B", "6", 9.0),
            ]
        );
    }

    #[test]
    fn short_future_is_misalignment() {
        let fut = future(&[("A", &["1", "2", "3"][..]), ("B", &["1", "2"][..])]);
        let points = vec![vec![0.0; 3], vec![0.0; 3]];

        let err = assemble(&ids(&["A", "B"]), &fut, &points, "id", "t", "pred").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Misalignment);
        assert!(err.message().contains("`B`"));
    }

    #[test]
    fn series_missing_from_future_is_misalignment() {
        let fut = future(&[("A", &["1"][..])]);
        let points = vec![vec![0.0], vec![0.0]];

        let err = assemble(&ids(&["A", "Z"]), &fut, &points, "id", "t", "pred").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Misalignment);
    }

    #[test]
    fn groups_future_timestamps_by_series() {
        let table = Table::new(
            vec!["t".to_string(), "id".to_string()],
            vec![
                vec!["1".to_string(), "B".to_string()],
                vec!["1".to_string(), "A".to_string()],
                vec!["2".to_string(), "B".to_string()],
            ],
        )
        .unwrap();

        let fut = future_timesteps_by_series(&table, "id", "t").unwrap();
        assert_eq!(fut.keys().collect::<Vec<_>>(), ["B", "A"]);
        assert_eq!(fut["B"], ["1", "2"]);
    }
}
