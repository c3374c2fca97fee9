use rust_xlsxwriter::{Format, Workbook, XlsxError};

use crate::error::{ConvertError, ConvertResult};
use crate::models::{Cell, Dataset};

/// Integers beyond this magnitude are written as text to keep every digit.
const MAX_EXACT_INT: u64 = 1 << 53;

/// Name of the single worksheet.
const SHEET_NAME: &str = "Sheet1";

/// Render a dataset as a single-sheet XLSX workbook.
///
/// Bold header row; numbers and booleans keep their cell types and nulls
/// are left blank.
pub fn to_xlsx(dataset: &Dataset) -> ConvertResult<Vec<u8>> {
    build_workbook(dataset).map_err(|e| ConvertError::render("XLSX", e))
}

fn build_workbook(dataset: &Dataset) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let header_format = Format::new().set_bold();

    for (col, name) in dataset.column_names().into_iter().enumerate() {
        worksheet.write_string_with_format(0, col_index(col)?, name, &header_format)?;
    }

    for (row_idx, row) in dataset.rows().enumerate() {
        let excel_row = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col_idx, cell) in row.into_iter().enumerate() {
            let col = col_index(col_idx)?;
            match cell {
                Cell::Null => {}
                Cell::Bool(b) => {
                    worksheet.write_boolean(excel_row, col, *b)?;
                }
                Cell::Int(i) if i.unsigned_abs() <= MAX_EXACT_INT => {
                    worksheet.write_number(excel_row, col, *i as f64)?;
                }
                Cell::Int(i) => {
                    worksheet.write_string(excel_row, col, i.to_string())?;
                }
                Cell::Float(f) => {
                    worksheet.write_number(excel_row, col, *f)?;
                }
                Cell::Text(s) => {
                    worksheet.write_string(excel_row, col, s)?;
                }
            }
        }
    }

    worksheet.autofit();

    workbook.save_to_buffer()
}

fn col_index(col: usize) -> Result<u16, XlsxError> {
    u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::xlsx::parse_xlsx_bytes;

    #[test]
    fn test_xlsx_is_zip() {
        let ds = Dataset::from_rows(
            vec!["Name".into(), "Age".into()],
            vec![vec!["Alice".into(), Cell::Int(30)]],
        )
        .unwrap();
        let bytes = to_xlsx(&ds).unwrap();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[0..2], b"PK");
    }

    #[test]
    fn test_xlsx_round_trip_through_ingestion() {
        let ds = Dataset::from_rows(
            vec!["id".into(), "label".into(), "ratio".into(), "ok".into()],
            vec![
                vec![Cell::Int(1), "Hello, \"World\"".into(), Cell::Float(0.5), Cell::Bool(true)],
                vec![Cell::Int(2), Cell::Null, Cell::Float(-3.25), Cell::Bool(false)],
                vec![Cell::Int(3), "Line1\nLine2".into(), Cell::Null, Cell::Null],
            ],
        )
        .unwrap();

        let parsed = parse_xlsx_bytes(&to_xlsx(&ds).unwrap()).unwrap();
        assert_eq!(parsed, ds);
    }

    #[test]
    fn test_xlsx_header_only() {
        let ds = Dataset::from_rows(vec!["Col1".into(), "Col2".into()], vec![]).unwrap();
        let parsed = parse_xlsx_bytes(&to_xlsx(&ds).unwrap()).unwrap();
        assert_eq!(parsed.column_names(), vec!["Col1", "Col2"]);
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn test_huge_integers_written_as_text() {
        let ds = Dataset::from_rows(
            vec!["big".into()],
            vec![vec![Cell::Int(i64::MAX)]],
        )
        .unwrap();
        let parsed = parse_xlsx_bytes(&to_xlsx(&ds).unwrap()).unwrap();
        assert_eq!(parsed.row(0).unwrap()[0], &Cell::Text(i64::MAX.to_string()));
    }
}
