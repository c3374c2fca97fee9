//! Error types for the Data Sweeper pipeline.
//!
//! Each stage of the pipeline has its own error type:
//!
//! - [`IngestError`] - reading an uploaded CSV/XLSX buffer
//! - [`DatasetError`] - dataset invariants and cell edits
//! - [`ChartError`] - histogram rendering
//! - [`ConvertError`] - rendering a dataset into an output format
//! - [`SweepError`] - top-level ingest → clean → convert orchestration
//! - [`ServerError`] - HTTP layer
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries. Every variant is a
//! user-input problem: nothing is retried.

use thiserror::Error;

// =============================================================================
// Ingestion Errors
// =============================================================================

/// Errors while turning an uploaded buffer into a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Extension is neither `.csv` nor `.xlsx`.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    /// Content is malformed (inconsistent records, corrupt archive, ...).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Failed to read the input file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        IngestError::Parse(err.to_string())
    }
}

// =============================================================================
// Dataset Errors
// =============================================================================

/// Violations of the dataset invariants, or edits that do not fit the dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    /// Two columns share a name.
    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column does not have the same number of cells as the others.
    #[error("Column '{column}' has {found} cells, expected {expected}")]
    ColumnLength {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A row does not have one cell per column.
    #[error("Row {row} has {found} cells, expected {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// Column not present in the dataset.
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Row index past the end of the dataset.
    #[error("Row {row} is out of bounds (dataset has {rows} rows)")]
    RowOutOfBounds { row: usize, rows: usize },
}

// =============================================================================
// Chart Errors
// =============================================================================

/// Errors while computing or drawing histograms.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The dataset has no numeric column at all.
    #[error("Dataset has no numeric columns to chart")]
    NoNumericColumns,

    /// A requested column is absent or not numeric.
    #[error("Invalid column selection: '{0}' is not a numeric column")]
    InvalidColumnSelection(String),

    /// Histograms need at least one bucket.
    #[error("Bucket count must be at least 1")]
    InvalidBucketCount,

    /// Encoding the chart image failed.
    #[error("Failed to render chart: {0}")]
    Render(String),
}

impl From<image::ImageError> for ChartError {
    fn from(err: image::ImageError) -> Self {
        ChartError::Render(err.to_string())
    }
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors from the conversion pipeline. Conversion is all-or-nothing:
/// no buffer is returned alongside an error.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Target name is not one of csv, xlsx, pdf, png, jpg.
    #[error("Unsupported target format: {0}")]
    UnsupportedTarget(String),

    /// Dataset has zero columns.
    #[error("Dataset has no columns")]
    EmptyDataset,

    /// Histogram requested but could not be produced.
    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),

    /// Underlying encoder failed.
    #[error("Failed to render {format}: {message}")]
    Render { format: String, message: String },
}

impl ConvertError {
    pub fn render(format: impl Into<String>, message: impl ToString) -> Self {
        ConvertError::Render {
            format: format.into(),
            message: message.to_string(),
        }
    }
}

// =============================================================================
// Sweep Errors (top-level)
// =============================================================================

/// Top-level errors of [`crate::transform::pipeline::sweep_bytes`] and friends.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Chart error: {0}")]
    Chart(#[from] ChartError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Sweep(#[from] SweepError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

pub type IngestResult<T> = Result<T, IngestError>;

pub type ConvertResult<T> = Result<T, ConvertError>;

pub type ChartResult<T> = Result<T, ChartError>;

pub type SweepResult<T> = Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let ingest = IngestError::UnsupportedFormat(".txt".into());
        let sweep: SweepError = ingest.into();
        assert!(sweep.to_string().contains(".txt"));

        let chart = ChartError::InvalidColumnSelection("name".into());
        let convert: ConvertError = chart.into();
        let sweep: SweepError = convert.into();
        assert!(sweep.to_string().contains("name"));
    }

    #[test]
    fn test_dataset_error_format() {
        let err = DatasetError::ColumnLength {
            column: "age".into(),
            expected: 3,
            found: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("expected 3"));
    }

    #[test]
    fn test_render_helper() {
        let err = ConvertError::render("PDF", "boom");
        assert_eq!(err.to_string(), "Failed to render PDF: boom");
    }
}
