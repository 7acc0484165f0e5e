//! CSV ingest.
//!
//! Reads every `*.csv` file in a directory and concatenates them into one
//! in-memory [`Table`]. Column roles are not interpreted here; that is the
//! validator's job (`io::validate`).

use std::collections::HashMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, info};

use crate::error::AppError;

/// A string-celled table with named columns.
///
/// Rows are kept in file order (files in name order). Every row has exactly
/// `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, rejecting ragged rows.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, AppError> {
        if let Some((idx, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(AppError::validation(format!(
                "Row {idx} has {} cells, expected {} ({}).",
                row.len(),
                headers.len(),
                headers.join(", ")
            )));
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Iterate the cells of one column.
    pub fn column<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| r[idx].as_str()))
    }
}

/// Read and concatenate every CSV file in `dir`.
///
/// Files after the first must carry the same column set; their columns are
/// re-ordered to match the first file's header order.
pub fn read_csv_dir(dir: &Path) -> Result<Table, AppError> {
    let files = csv_files_in(dir)?;

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for path in &files {
        let (file_headers, file_rows) = read_csv_file(path)?;
        if headers.is_none() {
            headers = Some(file_headers);
            rows.extend(file_rows);
            continue;
        }
        let expected = headers.as_deref().unwrap_or_default();

        let order = align_columns(expected, &file_headers).ok_or_else(|| {
            AppError::validation(format!(
                "CSV '{}' has columns [{}], expected [{}].",
                path.display(),
                file_headers.join(", "),
                expected.join(", ")
            ))
        })?;
        rows.extend(
            file_rows
                .into_iter()
                .map(|r| order.iter().map(|&i| r[i].clone()).collect::<Vec<_>>()),
        );
    }

    let headers = headers.unwrap_or_default();
    info!(dir = %dir.display(), files = files.len(), rows = rows.len(), "loaded CSV data");
    Table::new(headers, rows)
}

fn csv_files_in(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(dir).map_err(|e| {
        AppError::validation(format!("Failed to read data directory '{}': {e}", dir.display()))
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AppError::validation(format!("Failed to list data directory '{}': {e}", dir.display()))
        })?;
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(AppError::validation(format!(
            "No CSV files found in '{}'.",
            dir.display()
        )));
    }
    Ok(files)
}

fn read_csv_file(path: &Path) -> Result<(Vec<String>, Vec<Vec<String>>), AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::validation(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::validation(format!("Failed to read CSV headers of '{}': {e}", path.display())))?
        .iter()
        .map(normalize_header_name)
        .collect();

    let mut seen = HashMap::new();
    for (idx, h) in headers.iter().enumerate() {
        if let Some(prev) = seen.insert(h.as_str(), idx) {
            return Err(AppError::validation(format!(
                "CSV '{}' has duplicate column `{h}` (positions {prev} and {idx}).",
                path.display()
            )));
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based lines, plus the header line.
        let line = idx + 2;
        let record: StringRecord = result.map_err(|e| {
            AppError::validation(format!("CSV parse error in '{}' line {line}: {e}", path.display()))
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(file = %path.display(), rows = rows.len(), "read CSV file");
    Ok((headers, rows))
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// For each column of `expected`, its index in `actual`. `None` if the sets differ.
fn align_columns(expected: &[String], actual: &[String]) -> Option<Vec<usize>> {
    if expected.len() != actual.len() {
        return None;
    }
    expected
        .iter()
        .map(|name| actual.iter().position(|a| a == name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, body: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        f.write_all(body.as_bytes()).unwrap();
    }

    #[test]
    fn concatenates_files_aligning_columns() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", "\u{feff}id,date,value\nA,2024-01-01,1\n");
        write(dir.path(), "b.csv", "value,id,date\n2,B,2024-01-01\n");
        write(dir.path(), "notes.txt", "ignored");

        let table = read_csv_dir(dir.path()).unwrap();
        assert_eq!(table.headers(), ["id", "date", "value"]);
        assert_eq!(table.rows()[1], ["B", "2024-01-01", "2"]);
    }

    #[test]
    fn rejects_mismatched_column_sets() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.csv", "id,date,value\nA,2024-01-01,1\n");
        write(dir.path(), "b.csv", "id,date,other\nB,2024-01-01,2\n");

        let err = read_csv_dir(dir.path()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_csv_dir(dir.path()).is_err());
        assert!(read_csv_dir(&dir.path().join("missing")).is_err());
    }
}
