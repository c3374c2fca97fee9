//! Cleaning operations and the sweep pipeline.
//!
//! - Clean: duplicate removal, missing-value filling, cell edits
//! - Pipeline: ingest → clean → convert for one file or a batch

pub mod clean;
pub mod pipeline;

pub use clean::{apply_edits, duplicate_count, fill_missing, remove_duplicates, CellEdit, DEFAULT_FILL_VALUE};
pub use pipeline::*;
