//! Dataset ingestion: CSV (with encoding and delimiter auto-detection) and XLSX.
//!
//! Turns an uploaded byte buffer plus its declared extension into a
//! [`Dataset`]. The first row is always the header.

pub mod xlsx;

use std::collections::HashSet;
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::models::{file_extension, Cell, Dataset, InputFormat};

/// Candidate delimiters, in tie-breaking order.
pub(crate) const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Records inspected when checking a delimiter candidate.
const DELIMITER_SAMPLE_LINES: usize = 20;

/// Options controlling ingestion.
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Force a CSV delimiter instead of auto-detecting it.
    pub delimiter: Option<char>,
}

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed dataset
    pub dataset: Dataset,
    /// Format the input was read as
    pub format: InputFormat,
    /// Detected encoding (CSV only)
    pub encoding: Option<String>,
    /// Detected or used delimiter (CSV only)
    pub delimiter: Option<char>,
}

/// Parse a buffer according to its declared extension (`".csv"`, `"xlsx"`, ...).
///
/// # Example
/// ```
/// use datasweeper::parser::{ingest, ParseOptions};
///
/// let result = ingest(b"name,age\nAlice,30\n", ".csv", &ParseOptions::default()).unwrap();
/// assert_eq!(result.dataset.column_names(), vec!["name", "age"]);
/// assert_eq!(result.delimiter, Some(','));
/// ```
pub fn ingest(bytes: &[u8], extension: &str, options: &ParseOptions) -> IngestResult<ParseResult> {
    let format = InputFormat::from_extension(extension)
        .ok_or_else(|| IngestError::UnsupportedFormat(display_extension(extension)))?;

    match format {
        InputFormat::Csv => parse_csv_bytes(bytes, options.delimiter),
        InputFormat::Xlsx => Ok(ParseResult {
            dataset: xlsx::parse_xlsx_bytes(bytes)?,
            format,
            encoding: None,
            delimiter: None,
        }),
    }
}

/// Parse a buffer, taking the format from the file name's extension.
pub fn ingest_named(file_name: &str, bytes: &[u8], options: &ParseOptions) -> IngestResult<ParseResult> {
    ingest(bytes, &file_extension(file_name), options)
}

/// Read and parse a file from disk.
pub fn ingest_file<P: AsRef<Path>>(path: P, options: &ParseOptions) -> IngestResult<ParseResult> {
    let path = path.as_ref();
    let extension = file_extension(&path.to_string_lossy());
    // Reject before reading so a wrong extension never costs a read.
    if InputFormat::from_extension(&extension).is_none() {
        return Err(IngestError::UnsupportedFormat(display_extension(&extension)));
    }
    let bytes = std::fs::read(path)?;
    ingest(&bytes, &extension, options)
}

fn display_extension(extension: &str) -> String {
    if extension.is_empty() {
        "(none)".to_string()
    } else {
        extension.to_string()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "utf-8-sig" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Valid UTF-8 is always taken as UTF-8; a leading BOM is dropped.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => match encoding.to_lowercase().as_str() {
            "iso-8859-1" | "latin-1" | "latin1" => {
                encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
            }
            "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
            _ => String::from_utf8_lossy(bytes).into_owned(),
        },
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

// =============================================================================
// Delimiter
// =============================================================================

/// Detect the delimiter.
///
/// Candidates are tried by how often they occur unquoted in the header
/// line; a candidate is accepted only when the first records all have the
/// header's field count. Falls back to `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut candidates: Vec<(char, usize)> = DELIMITERS
        .iter()
        .map(|&sep| (sep, count_unquoted(first_line, sep)))
        .filter(|(_, count)| *count > 0)
        .collect();
    // Stable sort keeps DELIMITERS order on ties.
    candidates.sort_by(|a, b| b.1.cmp(&a.1));

    candidates
        .into_iter()
        .map(|(sep, _)| sep)
        .find(|&sep| has_consistent_fields(content, sep))
        .unwrap_or(',')
}

fn count_unquoted(line: &str, sep: char) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if c == sep && !quoted {
            count += 1;
        }
    }
    count
}

fn has_consistent_fields(content: &str, delimiter: char) -> bool {
    let Ok(delimiter) = u8::try_from(delimiter) else {
        return false;
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let mut expected = None;
    for record in reader.records().take(DELIMITER_SAMPLE_LINES) {
        let Ok(record) = record else {
            return false;
        };
        match expected {
            None => expected = Some(record.len()),
            Some(n) if n != record.len() => return false,
            _ => {}
        }
    }
    expected.is_some_and(|n| n > 1)
}

// =============================================================================
// CSV
// =============================================================================

/// Parse CSV bytes with auto-detection of encoding and (unless given) delimiter.
pub fn parse_csv_bytes(bytes: &[u8], delimiter: Option<char>) -> IngestResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = delimiter.unwrap_or_else(|| detect_delimiter(&content));

    let dataset = parse_csv_str(&content, delimiter)?;

    Ok(ParseResult {
        dataset,
        format: InputFormat::Csv,
        encoding: Some(encoding),
        delimiter: Some(delimiter),
    })
}

/// Parse CSV text with an explicit delimiter.
///
/// Every record must have as many fields as the header; anything else is
/// reported as a parse error with the offending line.
///
/// # Example
/// ```
/// use datasweeper::{parser::parse_csv_str, Cell};
///
/// let ds = parse_csv_str("a;b\n1;\n", ';').unwrap();
/// assert_eq!(ds.row(0).unwrap(), vec![&Cell::Int(1), &Cell::Null]);
/// ```
pub fn parse_csv_str(content: &str, delimiter: char) -> IngestResult<Dataset> {
    let delimiter = u8::try_from(delimiter)
        .map_err(|_| IngestError::Parse(format!("Delimiter '{}' is not a single byte", delimiter)))?;

    if content.trim().is_empty() {
        return Err(IngestError::Parse("No columns to parse from file".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .delimiter(delimiter)
        .from_reader(content.as_bytes());

    let raw_headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    let headers = normalize_headers(raw_headers);

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::infer).collect::<Vec<_>>());
    }

    Dataset::from_rows(headers, rows).map_err(|e| IngestError::Parse(e.to_string()))
}

/// Name blank headers `Unnamed: {index}` and suffix repeats with `.1`, `.2`, ...
pub fn normalize_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut headers = Vec::with_capacity(raw.len());

    for (idx, name) in raw.into_iter().enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            name
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        headers.push(candidate);
    }

    headers
}
