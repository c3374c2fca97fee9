//! Domain models for the Data Sweeper pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Cell`] - A scalar value (null, boolean, integer, float or text)
//! - [`Column`] - A named sequence of cells
//! - [`Dataset`] - Ordered columns of equal length with unique names
//! - [`InputFormat`] - Upload formats accepted by ingestion
//!
//! A [`Dataset`] is a plain value: cleaning operations and edits build a new
//! one instead of mutating shared state.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::DatasetError;

// =============================================================================
// Cell
// =============================================================================

/// A single scalar value in a dataset.
///
/// Serialized untagged, so JSON previews carry native `null`, booleans,
/// numbers and strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Infer a cell from a raw text field.
    ///
    /// Empty → null, then integer, finite float, boolean, text.
    ///
    /// # Example
    /// ```
    /// use datasweeper::Cell;
    ///
    /// assert_eq!(Cell::infer(""), Cell::Null);
    /// assert_eq!(Cell::infer("42"), Cell::Int(42));
    /// assert_eq!(Cell::infer("2.5"), Cell::Float(2.5));
    /// assert_eq!(Cell::infer("TRUE"), Cell::Bool(true));
    /// assert_eq!(Cell::infer("N/A"), Cell::Text("N/A".into()));
    /// ```
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return Cell::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return Cell::Int(i);
        }
        if let Ok(f) = raw.parse::<f64>() {
            if f.is_finite() {
                return Cell::Float(f);
            }
        }
        if raw.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if raw.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Cell::Int(_) | Cell::Float(_))
    }

    /// Numeric value, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Int(i) => write!(f, "{}", i),
            Cell::Float(x) => f.write_str(&format_float(*x)),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// Floats keep a decimal point so they re-parse as floats (`1.0`, not `1`).
fn format_float(x: f64) -> String {
    let s = x.to_string();
    if s.contains(['.', 'e', 'E']) || !x.is_finite() {
        s
    } else {
        format!("{}.0", s)
    }
}

// =============================================================================
// Column / Dataset
// =============================================================================

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, cells: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// A column is numeric when it has at least one number and nothing
    /// but numbers and nulls.
    pub fn is_numeric(&self) -> bool {
        self.cells.iter().any(Cell::is_numeric)
            && self.cells.iter().all(|c| c.is_numeric() || c.is_null())
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_null()).count()
    }

    /// Non-null numeric values in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.cells.iter().filter_map(Cell::as_f64).collect()
    }
}

/// In-memory tabular data: ordered, uniquely named columns of equal length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Build a dataset, checking name uniqueness and column lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self, DatasetError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(DatasetError::DuplicateColumn(column.name.clone()));
            }
        }

        if let Some(first) = columns.first() {
            let expected = first.cells.len();
            if let Some(bad) = columns.iter().find(|c| c.cells.len() != expected) {
                return Err(DatasetError::ColumnLength {
                    column: bad.name.clone(),
                    expected,
                    found: bad.cells.len(),
                });
            }
        }

        Ok(Self { columns })
    }

    /// Build a dataset from a header and row-major cells.
    ///
    /// # Example
    /// ```
    /// use datasweeper::{Cell, Dataset};
    ///
    /// let ds = Dataset::from_rows(
    ///     vec!["id".into(), "name".into()],
    ///     vec![vec![Cell::Int(1), "a".into()], vec![Cell::Int(2), "b".into()]],
    /// ).unwrap();
    ///
    /// assert_eq!(ds.row_count(), 2);
    /// assert_eq!(ds.column_names(), vec!["id", "name"]);
    /// ```
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self, DatasetError> {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(DatasetError::RowLength {
                    row: row_idx,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.cells.push(cell);
            }
        }

        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&Cell>> + '_ {
        (0..self.row_count()).map(move |i| self.columns.iter().map(|c| &c.cells[i]).collect())
    }

    /// First `n` rows (all rows if fewer).
    pub fn head(&self, n: usize) -> Dataset {
        self.select_rows((0..self.row_count().min(n)).collect::<Vec<_>>().as_slice())
    }

    /// New dataset holding the given rows, in the given order.
    pub(crate) fn select_rows(&self, indices: &[usize]) -> Dataset {
        let columns = self
            .columns
            .iter()
            .map(|c| Column::new(c.name.clone(), indices.iter().map(|&i| c.cells[i].clone()).collect()))
            .collect();
        Dataset { columns }
    }

    /// Mutable access to columns for crate-internal builders that keep
    /// lengths unchanged.
    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    /// Names of numeric columns, in column order.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
            .collect()
    }

    pub fn missing_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }
}

// =============================================================================
// Input formats
// =============================================================================

/// Upload formats understood by ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Csv,
    Xlsx,
}

impl InputFormat {
    /// Match an extension, with or without the leading dot, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Some(InputFormat::Csv),
            "xlsx" => Some(InputFormat::Xlsx),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Csv => "csv",
            InputFormat::Xlsx => "xlsx",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension of a file name including the dot, lowercased (`"Report.XLSX"` → `".xlsx"`).
pub fn file_extension(file_name: &str) -> String {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// File name without its last extension (`"sales.2024.csv"` → `"sales.2024"`).
pub fn file_stem(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["id".into(), "score".into(), "name".into()],
            vec![
                vec![Cell::Int(1), Cell::Float(2.5), "a".into()],
                vec![Cell::Int(2), Cell::Null, "b".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_infer_cells() {
        assert_eq!(Cell::infer(""), Cell::Null);
        assert_eq!(Cell::infer("-7"), Cell::Int(-7));
        assert_eq!(Cell::infer("1e3"), Cell::Float(1000.0));
        assert_eq!(Cell::infer("False"), Cell::Bool(false));
        assert_eq!(Cell::infer("NaN"), Cell::Text("NaN".into()));
        assert_eq!(Cell::infer(" 5"), Cell::Text(" 5".into()));
    }

    #[test]
    fn test_float_display_keeps_decimal_point() {
        assert_eq!(Cell::Float(1.0).to_string(), "1.0");
        assert_eq!(Cell::Float(2.5).to_string(), "2.5");
        assert_eq!(Cell::Float(-0.125).to_string(), "-0.125");
        assert_eq!(Cell::infer(&Cell::Float(3.0).to_string()), Cell::Float(3.0));
    }

    #[test]
    fn test_display_null_is_empty() {
        assert_eq!(Cell::Null.to_string(), "");
        assert_eq!(Cell::Bool(true).to_string(), "true");
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let err = Dataset::new(vec![
            Column::new("a", vec![Cell::Int(1)]),
            Column::new("a", vec![Cell::Int(2)]),
        ])
        .unwrap_err();
        assert_eq!(err, DatasetError::DuplicateColumn("a".into()));
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let err = Dataset::new(vec![
            Column::new("a", vec![Cell::Int(1), Cell::Int(2)]),
            Column::new("b", vec![Cell::Int(1)]),
        ])
        .unwrap_err();
        assert!(matches!(err, DatasetError::ColumnLength { found: 1, expected: 2, .. }));
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Int(1)]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rows_and_head() {
        let ds = sample();
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.row(1).unwrap()[2], &Cell::Text("b".into()));
        assert!(ds.row(2).is_none());
        assert_eq!(ds.rows().count(), 2);

        let head = ds.head(1);
        assert_eq!(head.row_count(), 1);
        assert_eq!(head.column_names(), ds.column_names());
        assert_eq!(ds.head(10), ds);
    }

    #[test]
    fn test_numeric_columns() {
        let ds = sample();
        assert_eq!(ds.numeric_columns(), vec!["id", "score"]);
        assert_eq!(ds.missing_count(), 1);

        let all_null = Column::new("x", vec![Cell::Null, Cell::Null]);
        assert!(!all_null.is_numeric());
    }

    #[test]
    fn test_serialize_cells_untagged() {
        let json = serde_json::to_value(vec![
            Cell::Null,
            Cell::Int(1),
            Cell::Float(1.5),
            Cell::Text("x".into()),
        ])
        .unwrap();
        assert_eq!(json, serde_json::json!([null, 1, 1.5, "x"]));
    }

    #[test]
    fn test_input_format_from_extension() {
        assert_eq!(InputFormat::from_extension(".CSV"), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_extension("xlsx"), Some(InputFormat::Xlsx));
        assert_eq!(InputFormat::from_extension(".xls"), None);
    }

    #[test]
    fn test_file_name_helpers() {
        assert_eq!(file_extension("Report.XLSX"), ".xlsx");
        assert_eq!(file_extension("noext"), "");
        assert_eq!(file_stem("sales.2024.csv"), "sales.2024");
        assert_eq!(file_stem("dir/data.csv"), "data");
        assert_eq!(file_stem("plain"), "plain");
    }
}
