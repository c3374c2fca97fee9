//! # Data Sweeper - tabular file cleaning and conversion
//!
//! Data Sweeper reads CSV and XLSX uploads, cleans them (duplicate removal,
//! missing-value filling, cell edits) and converts them to CSV, XLSX, PDF,
//! PNG or JPG, or draws histograms of their numeric columns.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ CSV / XLSX  │────▶│   Parser    │────▶│    Clean    │────▶│   Convert   │
//! │  (upload)   │     │  (auto-enc) │     │ (dedup/fill)│     │ csv/xlsx/.. │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use datasweeper::{convert, fill_missing, Cell, ConvertOptions, Dataset};
//!
//! let ds = Dataset::from_rows(
//!     vec!["x".into()],
//!     vec![vec![Cell::Int(1)], vec![Cell::Null], vec![Cell::Int(3)]],
//! ).unwrap();
//!
//! let filled = fill_missing(&ds, &Cell::from("N/A"));
//! let out = convert(&filled, "csv", &ConvertOptions::default()).unwrap();
//! assert_eq!(out.bytes, b"x\n1\nN/A\n3\n");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Cells, columns and datasets
//! - [`parser`] - CSV/XLSX ingestion with auto-detection
//! - [`transform`] - Cleaning operations and the sweep pipeline
//! - [`convert`] - Output encoders
//! - [`chart`] - Histograms of numeric columns
//! - [`render`] - Raster drawing shared by images and charts
//! - [`i18n`] - Interface translations
//! - [`config`] - Environment settings
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Ingestion
pub mod parser;

// Cleaning and orchestration
pub mod transform;

// Output
pub mod chart;
pub mod convert;
pub mod render;

// Settings and interface text
pub mod config;
pub mod i18n;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ChartError,
    ConvertError,
    DatasetError,
    IngestError,
    ServerError,
    SweepError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Cell, Column, Dataset, InputFormat};

// =============================================================================
// Re-exports - Ingestion
// =============================================================================

pub use parser::{
    ingest,
    ingest_file,
    ingest_named,
    detect_encoding,
    detect_delimiter,
    decode_content,
    ParseOptions,
    ParseResult,
};

// =============================================================================
// Re-exports - Cleaning
// =============================================================================

pub use transform::clean::{
    apply_edits,
    duplicate_count,
    fill_missing,
    remove_duplicates,
    CellEdit,
    DEFAULT_FILL_VALUE,
};

// =============================================================================
// Re-exports - Conversion and charts
// =============================================================================

pub use convert::{convert, convert_to, ConversionResult, ConvertOptions, TargetFormat};

pub use chart::{histograms, render_histogram_png, ChartOptions, Histogram};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    sweep_bytes,
    sweep_file,
    sweep_batch,
    inspect,
    Inspection,
    SweepOptions,
    SweptFile,
    SourceInfo,
};

pub use config::SweeperConfig;
pub use i18n::{translate, Language};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
