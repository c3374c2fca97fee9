//! High-level sweep API: ingest → clean → convert in one call.
//!
//! # Example
//!
//! ```
//! use datasweeper::transform::pipeline::{sweep_bytes, SweepOptions};
//!
//! let options = SweepOptions {
//!     remove_duplicates: true,
//!     fill_missing: Some("N/A".to_string()),
//!     ..Default::default()
//! };
//! let swept = sweep_bytes("scores.csv", b"x\n1\n\"\"\n3\n3\n", "csv", &options).unwrap();
//!
//! assert_eq!(swept.output.bytes, b"x\n1\nN/A\n3\n");
//! assert_eq!(swept.output.file_name, "scores.csv");
//! assert_eq!(swept.removed_duplicates, 1);
//! ```

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

use super::clean::{apply_edits, duplicate_count, fill_missing, remove_duplicates, CellEdit};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::convert::{convert_to, ConversionResult, ConvertOptions, TargetFormat};
use crate::error::{DatasetError, IngestError, SweepResult};
use crate::models::{file_extension, file_stem, Cell, Dataset, InputFormat};
use crate::parser::{ingest_named, ParseOptions};

/// Rows shown by [`inspect`] unless overridden.
pub const DEFAULT_INSPECT_ROWS: usize = 5;

/// What to do with each uploaded file.
#[derive(Debug, Clone, Default)]
pub struct SweepOptions {
    /// Drop exact duplicate rows, keeping the first occurrence.
    pub remove_duplicates: bool,

    /// Replace every null with this value (inferred like an uploaded field).
    pub fill_missing: Option<String>,

    /// Direct cell edits, applied before the other cleaning steps.
    pub edits: Vec<CellEdit>,

    pub parse: ParseOptions,

    pub convert: ConvertOptions,
}

/// The uploaded file, as read.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub name: String,
    pub size_kb: f64,
    pub format: InputFormat,
    pub encoding: Option<String>,
    pub delimiter: Option<char>,
    pub rows_in: usize,
    pub rows_out: usize,
    pub columns: Vec<String>,
}

/// Result of sweeping one file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweptFile {
    pub source: SourceInfo,
    pub edits_applied: usize,
    pub removed_duplicates: usize,
    pub filled_cells: usize,
    pub output: ConversionResult,
}

/// Dataset after cleaning, with what each step changed.
#[derive(Debug, Clone)]
pub struct Cleaned {
    pub dataset: Dataset,
    pub edits_applied: usize,
    pub removed_duplicates: usize,
    pub filled_cells: usize,
}

/// Apply edits, then deduplicate, then fill.
///
/// Filling runs last so placeholder values never make distinct rows look
/// like duplicates.
pub fn clean_dataset(dataset: Dataset, options: &SweepOptions) -> Result<Cleaned, DatasetError> {
    let mut dataset = if options.edits.is_empty() {
        dataset
    } else {
        apply_edits(&dataset, &options.edits)?
    };

    let mut removed_duplicates = 0;
    if options.remove_duplicates {
        let before = dataset.row_count();
        dataset = remove_duplicates(&dataset);
        removed_duplicates = before - dataset.row_count();
    }

    let mut filled_cells = 0;
    if let Some(ref value) = options.fill_missing {
        filled_cells = dataset.missing_count();
        dataset = fill_missing(&dataset, &Cell::infer(value));
    }

    Ok(Cleaned {
        dataset,
        edits_applied: options.edits.len(),
        removed_duplicates,
        filled_cells,
    })
}

/// Sweep an uploaded buffer: the format comes from `file_name`'s extension.
///
/// The target is checked first, so an unsupported target fails before any
/// parsing work.
pub fn sweep_bytes(
    file_name: &str,
    bytes: &[u8],
    target: &str,
    options: &SweepOptions,
) -> SweepResult<SweptFile> {
    let target: TargetFormat = target.parse()?;
    let size_kb = bytes.len() as f64 / 1024.0;

    log_info(format!("📖 Reading {} ({:.1} KB)...", file_name, size_kb));
    let parsed = ingest_named(file_name, bytes, &options.parse)?;
    if let Some(ref encoding) = parsed.encoding {
        log_success(format!("Detected encoding: {}", encoding));
    }
    if let Some(delimiter) = parsed.delimiter {
        log_success(format!("Detected separator: '{}'", format_delimiter(delimiter)));
    }

    let rows_in = parsed.dataset.row_count();
    let columns: Vec<String> = parsed
        .dataset
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    log_success(format!("Read {} rows × {} columns", rows_in, columns.len()));

    log_info("🧹 Cleaning...");
    let cleaned = clean_dataset(parsed.dataset, options)?;
    if cleaned.edits_applied > 0 {
        log_info_indent(format!("{} cell edit(s) applied", cleaned.edits_applied), 1);
    }
    if options.remove_duplicates {
        log_info_indent(format!("{} duplicate row(s) removed", cleaned.removed_duplicates), 1);
    }
    if options.fill_missing.is_some() {
        log_info_indent(format!("{} missing value(s) filled", cleaned.filled_cells), 1);
    }

    let mut convert_options = options.convert.clone();
    if convert_options.file_stem.is_none() {
        convert_options.file_stem = Some(file_stem(file_name));
    }

    log_info(format!("🔄 Converting to {}...", target));
    let output = convert_to(&cleaned.dataset, target, &convert_options)?;
    if output.truncated {
        log_warning(format!(
            "Output truncated to the first {} of {} rows",
            output.rows_rendered,
            cleaned.dataset.row_count()
        ));
    }
    log_success(format!("{} ready ({} bytes)", output.file_name, output.bytes.len()));

    Ok(SweptFile {
        source: SourceInfo {
            name: file_name.to_string(),
            size_kb,
            format: parsed.format,
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            rows_in,
            rows_out: cleaned.dataset.row_count(),
            columns,
        },
        edits_applied: cleaned.edits_applied,
        removed_duplicates: cleaned.removed_duplicates,
        filled_cells: cleaned.filled_cells,
        output,
    })
}

/// Sweep a file on disk. Unsupported extensions are rejected before reading.
pub fn sweep_file<P: AsRef<Path>>(
    path: P,
    target: &str,
    options: &SweepOptions,
) -> SweepResult<SweptFile> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let extension = file_extension(&file_name);
    if InputFormat::from_extension(&extension).is_none() {
        return Err(IngestError::UnsupportedFormat(if extension.is_empty() {
            "(none)".to_string()
        } else {
            extension
        })
        .into());
    }

    let bytes = std::fs::read(path).map_err(IngestError::from)?;
    sweep_bytes(&file_name, &bytes, target, options)
}

fn unique_file_name(file_name: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(file_name) {
        return file_name.to_string();
    }
    let (stem, extension) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    (2..)
        .map(|n| {
            if extension.is_empty() {
                format!("{}_{}", stem, n)
            } else {
                format!("{}_{}.{}", stem, n, extension)
            }
        })
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| file_name.to_string())
}

/// Sweep several uploads one after another.
///
/// Each file gets its own result; a failure is logged and does not stop the
/// rest of the batch. Output names are unique within the batch: a repeated
/// name (`a.csv` and `a.xlsx` both give `a.pdf`) gets a `_2`, `_3`, ...
/// suffix on its stem.
pub fn sweep_batch(
    files: &[(String, Vec<u8>)],
    target: &str,
    options: &SweepOptions,
) -> Vec<(String, SweepResult<SweptFile>)> {
    let mut results = Vec::with_capacity(files.len());
    let mut taken: HashSet<String> = HashSet::new();

    for (i, (name, bytes)) in files.iter().enumerate() {
        log_info(format!("📄 File {}/{}: {}", i + 1, files.len(), name));
        let mut result = sweep_bytes(name, bytes, target, options);
        match result {
            Ok(ref mut swept) => {
                let unique = unique_file_name(&swept.output.file_name, &taken);
                if unique != swept.output.file_name {
                    log_warning(format!("{} already written in this batch, using {}", swept.output.file_name, unique));
                    swept.output.file_name = unique.clone();
                }
                taken.insert(unique);
            }
            Err(ref e) => log_error(format!("{}: {}", name, e)),
        }
        results.push((name.clone(), result));
    }

    let ok = results.iter().filter(|(_, r)| r.is_ok()).count();
    if ok == results.len() {
        log_success("🎉 All files processed successfully!");
    } else {
        log_warning(format!("{} of {} files processed", ok, results.len()));
    }

    results
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "TAB".to_string(),
        c => c.to_string(),
    }
}

// =============================================================================
// Inspection
// =============================================================================

/// Per-column overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSummary {
    pub name: String,
    pub numeric: bool,
    pub missing: usize,
}

/// A quick look at a dataset before cleaning it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Inspection {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
    pub duplicate_rows: usize,
    pub missing_cells: usize,
    /// First rows, in column order.
    pub head: Vec<Vec<Cell>>,
}

pub fn inspect(dataset: &Dataset, preview_rows: usize) -> Inspection {
    Inspection {
        rows: dataset.row_count(),
        columns: dataset
            .columns()
            .iter()
            .map(|c| ColumnSummary {
                name: c.name.clone(),
                numeric: c.is_numeric(),
                missing: c.missing_count(),
            })
            .collect(),
        duplicate_rows: duplicate_count(dataset),
        missing_cells: dataset.missing_count(),
        head: dataset
            .rows()
            .take(preview_rows)
            .map(|row| row.into_iter().cloned().collect())
            .collect(),
    }
}
