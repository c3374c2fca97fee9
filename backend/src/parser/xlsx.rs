//! XLSX ingestion via calamine: first worksheet, first row = header.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};

use super::normalize_headers;
use crate::error::{IngestError, IngestResult};
use crate::models::{Cell, Dataset};

/// Largest integer an f64 holds exactly (2^53).
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

/// Parse the first worksheet of an XLSX workbook.
pub fn parse_xlsx_bytes(bytes: &[u8]) -> IngestResult<Dataset> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| IngestError::Parse(format!("Invalid XLSX archive: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::Parse("Workbook has no worksheets".to_string()))?
        .map_err(|e| IngestError::Parse(format!("Cannot read first worksheet: {}", e)))?;

    let mut rows = range.rows();
    let header_row = rows
        .next()
        .ok_or_else(|| IngestError::Parse("No columns to parse from file".to_string()))?;

    let headers = normalize_headers(header_row.iter().map(header_text).collect());
    let width = headers.len();

    let body: Vec<Vec<Cell>> = rows
        .map(|row| {
            let mut cells: Vec<Cell> = row.iter().map(to_cell).collect();
            cells.resize(width, Cell::Null);
            cells
        })
        .collect();

    Dataset::from_rows(headers, body).map_err(|e| IngestError::Parse(e.to_string()))
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => to_cell(other).to_string(),
    }
}

/// Convert a calamine cell.
///
/// Integral floats become integers, as spreadsheets store every number as a float.
fn to_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty | Data::Error(_) => Cell::Null,
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() <= MAX_EXACT_INT {
                Cell::Int(*f as i64)
            } else {
                Cell::Float(*f)
            }
        }
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(_) => match cell.as_datetime() {
            Some(dt) => Cell::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
            None => Cell::Text(cell.to_string()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn workbook_bytes(build: impl FnOnce(&mut rust_xlsxwriter::Worksheet)) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        build(worksheet);
        workbook.save_to_buffer().unwrap()
    }

    #[test]
    fn test_parse_basic_sheet() {
        let bytes = workbook_bytes(|ws| {
            ws.write_string(0, 0, "name").unwrap();
            ws.write_string(0, 1, "score").unwrap();
            ws.write_string(1, 0, "Alice").unwrap();
            ws.write_number(1, 1, 9.5).unwrap();
            ws.write_string(2, 0, "Bob").unwrap();
            ws.write_number(2, 1, 7.0).unwrap();
        });

        let ds = parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(ds.column_names(), vec!["name", "score"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.row(0).unwrap()[1], &Cell::Float(9.5));
        assert_eq!(ds.row(1).unwrap()[1], &Cell::Int(7));
    }

    #[test]
    fn test_blank_cells_become_null() {
        let bytes = workbook_bytes(|ws| {
            ws.write_string(0, 0, "a").unwrap();
            ws.write_string(0, 1, "b").unwrap();
            ws.write_number(1, 0, 1.0).unwrap();
            ws.write_boolean(2, 1, true).unwrap();
        });

        let ds = parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(ds.row(0).unwrap(), vec![&Cell::Int(1), &Cell::Null]);
        assert_eq!(ds.row(1).unwrap(), vec![&Cell::Null, &Cell::Bool(true)]);
    }

    #[test]
    fn test_corrupt_archive() {
        let err = parse_xlsx_bytes(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, IngestError::Parse(_)));
    }
}
