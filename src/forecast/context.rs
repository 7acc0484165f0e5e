//! Context construction: one numeric history per series.
//!
//! Series keep the order in which their id first appears in the validated
//! table, so output rows come out in a reproducible order.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::AppError;
use crate::io::ingest::Table;

/// Historical target values per series, in first-seen series order.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    series: IndexMap<String, Vec<f64>>,
}

impl Context {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn get(&self, id: &str) -> Option<&[f64]> {
        self.series.get(id).map(Vec::as_slice)
    }

    /// Borrow the sequences as a model input batch.
    pub fn batch(&self) -> ContextBatch<'_> {
        let mut sequences: Vec<&[f64]> = self.series.values().map(Vec::as_slice).collect();
        if sequences.len() == 1 {
            ContextBatch::Single(sequences.remove(0))
        } else {
            ContextBatch::Many(sequences)
        }
    }
}

/// Model input: either a batch of one series or several.
///
/// A one-series run is still a batch of size one: [`ContextBatch::len`] is 1
/// and the engine must return a leading series axis of length 1.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextBatch<'a> {
    Single(&'a [f64]),
    Many(Vec<&'a [f64]>),
}

impl<'a> ContextBatch<'a> {
    pub fn len(&self) -> usize {
        match self {
            ContextBatch::Single(_) => 1,
            ContextBatch::Many(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The sequences in batch order.
    pub fn sequences(&self) -> Vec<&'a [f64]> {
        match self {
            ContextBatch::Single(s) => vec![*s],
            ContextBatch::Many(v) => v.clone(),
        }
    }
}

/// Group `table` by `series_id_col` and collect `target_col` in row order.
///
/// Returns the context and the series ids in context order. The table is not
/// modified.
pub fn build_context(
    table: &Table,
    series_id_col: &str,
    target_col: &str,
) -> Result<(Context, Vec<String>), AppError> {
    let id_idx = table
        .column_index(series_id_col)
        .ok_or_else(|| AppError::shape(format!("Series id column `{series_id_col}` not found.")))?;
    let target_idx = table
        .column_index(target_col)
        .ok_or_else(|| AppError::shape(format!("Target column `{target_col}` not found.")))?;

    let mut series: IndexMap<String, Vec<f64>> = IndexMap::new();
    for (idx, row) in table.rows().iter().enumerate() {
        let id = &row[id_idx];
        let raw = &row[target_idx];
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                AppError::shape(format!(
                    "Target `{target_col}` value '{raw}' for series `{id}` (row {idx}) is not a finite number."
                ))
            })?;
        match series.get_mut(id.as_str()) {
            Some(values) => values.push(value),
            None => {
                series.insert(id.clone(), vec![value]);
            }
        }
    }

    if series.is_empty() {
        return Err(AppError::shape("Historical data contains no series."));
    }
    if let Some((id, _)) = series.iter().find(|(_, v)| v.is_empty()) {
        return Err(AppError::shape(format!("Series `{id}` has no observations.")));
    }

    let ids: Vec<String> = series.keys().cloned().collect();
    debug!(
        series = ids.len(),
        min_len = series.values().map(Vec::len).min().unwrap_or(0),
        max_len = series.values().map(Vec::len).max().unwrap_or(0),
        "built context"
    );

    Ok((Context { series }, ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn table(rows: &[(&str, &str)]) -> Table {
        Table::new(
            vec!["id".to_string(), "y".to_string()],
            rows.iter()
                .map(|(id, y)| vec![id.to_string(), y.to_string()])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn groups_in_first_seen_order() {
        let t = table(&[("b", "1"), ("a", "2"), ("b", "3"), ("c", "4"), ("a", "5")]);
        let (ctx, ids) = build_context(&t, "id", "y").unwrap();

        assert_eq!(ids, ["b", "a", "c"]);
        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("b").unwrap(), [1.0, 3.0]);
        assert_eq!(ctx.get("a").unwrap(), [2.0, 5.0]);
        assert_eq!(ctx.ids().collect::<Vec<_>>(), ids);
    }

    #[test]
    fn single_series_is_a_batch_of_one() {
        let t = table(&[("x", "1"), ("x", "2")]);
        let (ctx, _) = build_context(&t, "id", "y").unwrap();

        let batch = ctx.batch();
        assert!(matches!(batch, ContextBatch::Single(_)));
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.sequences(), vec![&[1.0, 2.0][..]]);
    }

    #[test]
    fn missing_columns_are_shape_errors() {
        let t = table(&[("x", "1")]);
        assert_eq!(build_context(&t, "series", "y").unwrap_err().kind(), ErrorKind::Shape);
        assert_eq!(build_context(&t, "id", "target").unwrap_err().kind(), ErrorKind::Shape);
    }

    #[test]
    fn empty_table_is_a_shape_error() {
        let t = table(&[]);
        assert_eq!(build_context(&t, "id", "y").unwrap_err().kind(), ErrorKind::Shape);
    }

    #[test]
    fn input_table_is_untouched() {
        let t = table(&[("b", "1"), ("a", "2")]);
        let before = t.clone();
        let _ = build_context(&t, "id", "y").unwrap();
        assert_eq!(t, before);
    }
}
