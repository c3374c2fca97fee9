//! Conversion pipeline: render a dataset into CSV, XLSX, PDF, PNG or JPG.
//!
//! Each branch is deterministic for a given dataset and options, and works
//! entirely in memory. Conversion is all-or-nothing: either a complete
//! [`ConversionResult`] or an error, never a partial buffer.
//!
//! ```text
//!                    ┌──────► csv   (text/csv)
//!                    ├──────► xlsx  (spreadsheetml)
//! Dataset ─ convert ─┼──────► pdf   (table, paged)
//!                    ├──────► png   (table grid | histogram)
//!                    └──────► jpg   (table grid | histogram)
//! ```

pub mod csv;
pub mod image;
pub mod pdf;
pub mod xlsx;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::chart::{self, ChartOptions};
use crate::error::{ConvertError, ConvertResult};
use crate::models::Dataset;

/// Rows shown by preview-style exports (PDF and images) unless overridden.
pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Stem used for output names when the source name is unknown.
pub const DEFAULT_FILE_STEM: &str = "data";

// =============================================================================
// Target formats
// =============================================================================

/// Output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Csv,
    Xlsx,
    Pdf,
    Png,
    Jpg,
}

impl TargetFormat {
    pub const ALL: [TargetFormat; 5] = [
        TargetFormat::Csv,
        TargetFormat::Xlsx,
        TargetFormat::Pdf,
        TargetFormat::Png,
        TargetFormat::Jpg,
    ];

    pub fn mime_type(&self) -> &'static str {
        match self {
            TargetFormat::Csv => "text/csv",
            TargetFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            TargetFormat::Pdf => "application/pdf",
            TargetFormat::Png => "image/png",
            TargetFormat::Jpg => "image/jpg",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Csv => "csv",
            TargetFormat::Xlsx => "xlsx",
            TargetFormat::Pdf => "pdf",
            TargetFormat::Png => "png",
            TargetFormat::Jpg => "jpg",
        }
    }

    /// PDF and image exports are previews and honour the row limit.
    pub fn is_preview(&self) -> bool {
        matches!(self, TargetFormat::Pdf | TargetFormat::Png | TargetFormat::Jpg)
    }
}

impl FromStr for TargetFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(TargetFormat::Csv),
            "xlsx" | "excel" => Ok(TargetFormat::Xlsx),
            "pdf" => Ok(TargetFormat::Pdf),
            "png" => Ok(TargetFormat::Png),
            "jpg" | "jpeg" => Ok(TargetFormat::Jpg),
            _ => Err(ConvertError::UnsupportedTarget(s.to_string())),
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.extension().to_ascii_uppercase())
    }
}

// =============================================================================
// Options / result
// =============================================================================

/// Optional rendering parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertOptions {
    /// Render a histogram of these columns instead of a table (PNG/JPG only).
    pub chart: Option<ChartOptions>,

    /// Rows kept by PDF/PNG/JPG exports; `None` keeps all rows.
    pub preview_row_limit: Option<usize>,

    /// Stem of the suggested output file name.
    pub file_stem: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            chart: None,
            preview_row_limit: Some(DEFAULT_PREVIEW_ROWS),
            file_stem: None,
        }
    }
}

/// A rendered output buffer.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub format: TargetFormat,
    pub mime_type: &'static str,
    pub file_name: String,
    /// True when rows were dropped by the preview limit.
    pub truncated: bool,
    /// Data rows present in the output (0 for charts).
    pub rows_rendered: usize,
}

/// Rows a table export keeps, and whether that drops any.
pub(crate) fn row_window(total: usize, limit: Option<usize>) -> (usize, bool) {
    match limit {
        Some(limit) if limit < total => (limit, true),
        _ => (total, false),
    }
}

/// Suggested output name: `report.xlsx` + PDF → `report.pdf`.
pub fn output_file_name(stem: Option<&str>, target: TargetFormat) -> String {
    let stem = stem.filter(|s| !s.is_empty()).unwrap_or(DEFAULT_FILE_STEM);
    format!("{}.{}", stem, target.extension())
}

// =============================================================================
// Entry points
// =============================================================================

/// Convert a dataset to the named target format (`csv`, `xlsx`/`excel`,
/// `pdf`, `png`, `jpg`/`jpeg`).
///
/// # Example
/// ```
/// use datasweeper::{convert, Cell, ConvertOptions, Dataset};
///
/// let ds = Dataset::from_rows(
///     vec!["x".into()],
///     vec![vec![Cell::Int(1)], vec!["N/A".into()], vec![Cell::Int(3)]],
/// ).unwrap();
///
/// let out = convert(&ds, "csv", &ConvertOptions::default()).unwrap();
/// assert_eq!(out.bytes, b"x\n1\nN/A\n3\n");
/// assert_eq!(out.mime_type, "text/csv");
/// assert!(convert(&ds, "docx", &ConvertOptions::default()).is_err());
/// ```
pub fn convert(dataset: &Dataset, target: &str, options: &ConvertOptions) -> ConvertResult<ConversionResult> {
    let target: TargetFormat = target.parse()?;
    convert_to(dataset, target, options)
}

/// Convert a dataset to an already-parsed target format.
pub fn convert_to(
    dataset: &Dataset,
    target: TargetFormat,
    options: &ConvertOptions,
) -> ConvertResult<ConversionResult> {
    if dataset.is_empty() {
        return Err(ConvertError::EmptyDataset);
    }

    let limit = if target.is_preview() {
        options.preview_row_limit
    } else {
        None
    };

    let (bytes, rows_rendered, truncated) = match (target, &options.chart) {
        (TargetFormat::Csv, _) => {
            (csv::to_csv(dataset)?, dataset.row_count(), false)
        }
        (TargetFormat::Xlsx, _) => {
            (xlsx::to_xlsx(dataset)?, dataset.row_count(), false)
        }
        (TargetFormat::Pdf, _) => {
            let rendered = pdf::to_pdf(dataset, limit);
            (rendered.bytes, rendered.rows_rendered, rendered.truncated)
        }
        (TargetFormat::Png | TargetFormat::Jpg, Some(chart_options)) => {
            let canvas = chart::histogram_canvas(dataset, chart_options)?;
            (image::encode(&canvas, target)?, 0, false)
        }
        (TargetFormat::Png | TargetFormat::Jpg, None) => {
            let rendered = image::table_image(dataset, limit);
            let bytes = image::encode(&rendered.canvas, target)?;
            (bytes, rendered.rows_rendered, rendered.truncated)
        }
    };

    Ok(ConversionResult {
        bytes,
        format: target,
        mime_type: target.mime_type(),
        file_name: output_file_name(options.file_stem.as_deref(), target),
        truncated,
        rows_rendered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cell, Column};
    use crate::parser::parse_csv_str;

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["id".into(), "price".into(), "name".into()],
            (0..30)
                .map(|i| vec![Cell::Int(i), Cell::Float(i as f64 + 0.5), Cell::Text(format!("item {}", i))])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_parse_target_names() {
        assert_eq!("CSV".parse::<TargetFormat>().unwrap(), TargetFormat::Csv);
        assert_eq!("Excel".parse::<TargetFormat>().unwrap(), TargetFormat::Xlsx);
        assert_eq!(".jpeg".parse::<TargetFormat>().unwrap(), TargetFormat::Jpg);
        assert!(matches!(
            "docx".parse::<TargetFormat>(),
            Err(ConvertError::UnsupportedTarget(ref t)) if t == "docx"
        ));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(TargetFormat::Csv.mime_type(), "text/csv");
        assert_eq!(
            TargetFormat::Xlsx.mime_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(TargetFormat::Pdf.mime_type(), "application/pdf");
        assert_eq!(TargetFormat::Png.mime_type(), "image/png");
        assert_eq!(TargetFormat::Jpg.mime_type(), "image/jpg");
    }

    #[test]
    fn test_unsupported_target_produces_nothing() {
        let result = convert(&sample(), "gif", &ConvertOptions::default());
        assert!(matches!(result, Err(ConvertError::UnsupportedTarget(_))));
    }

    #[test]
    fn test_empty_dataset_rejected_for_every_target() {
        for target in TargetFormat::ALL {
            let result = convert_to(&Dataset::default(), target, &ConvertOptions::default());
            assert!(matches!(result, Err(ConvertError::EmptyDataset)), "{}", target);
        }
    }

    #[test]
    fn test_zero_rows_still_converts() {
        let ds = Dataset::new(vec![Column::new("a", vec![])]).unwrap();
        let out = convert_to(&ds, TargetFormat::Csv, &ConvertOptions::default()).unwrap();
        assert_eq!(out.bytes, b"a\n");
        let out = convert_to(&ds, TargetFormat::Png, &ConvertOptions::default()).unwrap();
        assert!(out.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    #[test]
    fn test_csv_round_trip() {
        let ds = Dataset::from_rows(
            vec!["id".into(), "label".into(), "ratio".into(), "ok".into()],
            vec![
                vec![Cell::Int(1), "plain".into(), Cell::Float(1.0), Cell::Bool(true)],
                vec![Cell::Int(-2), "with, comma".into(), Cell::Null, Cell::Bool(false)],
                vec![Cell::Null, "quote \"q\"\nnewline".into(), Cell::Float(0.25), Cell::Null],
            ],
        )
        .unwrap();

        let out = convert(&ds, "csv", &ConvertOptions::default()).unwrap();
        let text = String::from_utf8(out.bytes).unwrap();
        assert_eq!(parse_csv_str(&text, ',').unwrap(), ds);
    }

    #[test]
    fn test_csv_keeps_text_verbatim_but_not_its_type() {
        // Spreadsheet text such as zip codes keeps every character, but CSV
        // carries no types, so it reads back as whatever it looks like.
        let ds = Dataset::from_rows(
            vec!["zip".into(), "flag".into()],
            vec![vec![Cell::Text("02134".into()), Cell::Text("TRUE".into())]],
        )
        .unwrap();

        let out = convert(&ds, "csv", &ConvertOptions::default()).unwrap();
        let text = String::from_utf8(out.bytes).unwrap();
        assert_eq!(text, "zip,flag\n02134,TRUE\n");

        let back = parse_csv_str(&text, ',').unwrap();
        assert_eq!(back.row(0).unwrap(), vec![&Cell::Int(2134), &Cell::Bool(true)]);
    }

    #[test]
    fn test_csv_and_xlsx_are_never_truncated() {
        let options = ConvertOptions {
            preview_row_limit: Some(5),
            ..Default::default()
        };
        for target in [TargetFormat::Csv, TargetFormat::Xlsx] {
            let out = convert_to(&sample(), target, &options).unwrap();
            assert!(!out.truncated);
            assert_eq!(out.rows_rendered, 30);
        }
    }

    #[test]
    fn test_preview_truncation_is_reported() {
        for target in [TargetFormat::Pdf, TargetFormat::Png, TargetFormat::Jpg] {
            let out = convert_to(&sample(), target, &ConvertOptions::default()).unwrap();
            assert!(out.truncated, "{}", target);
            assert_eq!(out.rows_rendered, DEFAULT_PREVIEW_ROWS);

            let all = ConvertOptions {
                preview_row_limit: None,
                ..Default::default()
            };
            let out = convert_to(&sample(), target, &all).unwrap();
            assert!(!out.truncated);
            assert_eq!(out.rows_rendered, 30);
        }
    }

    #[test]
    fn test_chart_target() {
        let options = ConvertOptions {
            chart: Some(ChartOptions::new(vec!["price".into()])),
            file_stem: Some("prices".into()),
            ..Default::default()
        };
        let out = convert_to(&sample(), TargetFormat::Png, &options).unwrap();
        assert!(out.bytes.starts_with(&[0x89, b'P', b'N', b'G']));
        assert_eq!(out.file_name, "prices.png");
        assert_eq!(out.rows_rendered, 0);

        let bad = ConvertOptions {
            chart: Some(ChartOptions::new(vec!["name".into()])),
            ..Default::default()
        };
        assert!(matches!(
            convert_to(&sample(), TargetFormat::Png, &bad),
            Err(ConvertError::Chart(_))
        ));
    }

    #[test]
    fn test_jpg_output() {
        let out = convert(&sample(), "jpg", &ConvertOptions::default()).unwrap();
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(out.file_name, "data.jpg");
    }

    #[test]
    fn test_output_file_name() {
        assert_eq!(output_file_name(Some("report"), TargetFormat::Pdf), "report.pdf");
        assert_eq!(output_file_name(None, TargetFormat::Xlsx), "data.xlsx");
        assert_eq!(output_file_name(Some(""), TargetFormat::Csv), "data.csv");
    }

    #[test]
    fn test_conversion_is_deterministic() {
        for target in TargetFormat::ALL {
            if target == TargetFormat::Xlsx {
                // Workbook metadata carries a creation timestamp.
                continue;
            }
            let a = convert_to(&sample(), target, &ConvertOptions::default()).unwrap();
            let b = convert_to(&sample(), target, &ConvertOptions::default()).unwrap();
            assert_eq!(a.bytes, b.bytes, "{}", target);
        }
    }
}
