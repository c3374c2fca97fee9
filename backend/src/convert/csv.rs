use ::csv::{QuoteStyle, WriterBuilder};

use crate::error::{ConvertError, ConvertResult};
use crate::models::Dataset;
use crate::parser::DELIMITERS;

/// Render a dataset as comma-separated text.
///
/// Header row first, `\n` line endings, no index column. Fields are
/// quoted by the `csv` crate only when needed; nulls become empty fields.
pub fn to_csv(dataset: &Dataset) -> ConvertResult<Vec<u8>> {
    to_delimited(dataset, b',')
}

/// Same as [`to_csv`] with another single-byte delimiter.
///
/// A header holding another delimiter candidate is quoted whole, so
/// delimiter detection reads the output back with `delimiter`.
pub fn to_delimited(dataset: &Dataset, delimiter: u8) -> ConvertResult<Vec<u8>> {
    let header = dataset.column_names();
    let header_style = if header.iter().any(|name| holds_other_delimiter(name, delimiter)) {
        QuoteStyle::Always
    } else {
        QuoteStyle::Necessary
    };

    let mut writer = writer_builder(delimiter, header_style).from_writer(Vec::new());
    writer
        .write_record(&header)
        .map_err(|e| ConvertError::render("CSV", e))?;
    let buffer = writer
        .into_inner()
        .map_err(|e| ConvertError::render("CSV", e.error()))?;

    let mut writer = writer_builder(delimiter, QuoteStyle::Necessary).from_writer(buffer);
    for row in dataset.rows() {
        writer
            .write_record(row.iter().map(|cell| cell.to_string()))
            .map_err(|e| ConvertError::render("CSV", e))?;
    }

    writer
        .into_inner()
        .map_err(|e| ConvertError::render("CSV", e.error()))
}

fn writer_builder(delimiter: u8, style: QuoteStyle) -> WriterBuilder {
    let mut builder = WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(style)
        .terminator(::csv::Terminator::Any(b'\n'));
    builder
}

fn holds_other_delimiter(field: &str, delimiter: u8) -> bool {
    DELIMITERS
        .iter()
        .any(|&sep| sep as u32 != delimiter as u32 && field.contains(sep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use crate::parser::{ingest, ParseOptions};

    #[test]
    fn test_exact_output() {
        let ds = Dataset::from_rows(
            vec!["x".into()],
            vec![vec![Cell::Int(1)], vec!["N/A".into()], vec![Cell::Int(3)]],
        )
        .unwrap();
        assert_eq!(to_csv(&ds).unwrap(), b"x\n1\nN/A\n3\n");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let ds = Dataset::from_rows(
            vec!["Name".into(), "Location".into()],
            vec![vec!["Smith, John".into(), "Austin, TX".into()]],
        )
        .unwrap();
        let text = String::from_utf8(to_csv(&ds).unwrap()).unwrap();
        assert_eq!(text, "Name,Location\n\"Smith, John\",\"Austin, TX\"\n");
    }

    #[test]
    fn test_nulls_are_empty_fields() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Null, Cell::Float(2.0)]],
        )
        .unwrap();
        assert_eq!(to_csv(&ds).unwrap(), b"a,b\n,2.0\n");
    }

    #[test]
    fn test_header_with_other_delimiter_is_quoted() {
        let ds = Dataset::from_rows(
            vec!["a;b".into()],
            vec![vec!["x;y".into()], vec!["p;q".into()]],
        )
        .unwrap();
        assert_eq!(to_csv(&ds).unwrap(), b"\"a;b\"\nx;y\np;q\n");

        let parsed = ingest(&to_csv(&ds).unwrap(), ".csv", &ParseOptions::default()).unwrap();
        assert_eq!(parsed.delimiter, Some(','));
        assert_eq!(parsed.dataset, ds);
    }

    #[test]
    fn test_round_trip_through_detection() {
        let ds = Dataset::from_rows(
            vec!["id".into(), "path|tab\tsemi;".into()],
            vec![
                vec![Cell::Int(1), "a|b|c".into()],
                vec![Cell::Int(2), "x\ty;z".into()],
            ],
        )
        .unwrap();
        let parsed = ingest(&to_csv(&ds).unwrap(), ".csv", &ParseOptions::default()).unwrap();
        assert_eq!(parsed.delimiter, Some(','));
        assert_eq!(parsed.dataset, ds);
    }

    #[test]
    fn test_tab_delimited() {
        let ds = Dataset::from_rows(
            vec!["X".into(), "Y".into()],
            vec![vec![Cell::Int(1), Cell::Int(2)]],
        )
        .unwrap();
        assert_eq!(to_delimited(&ds, b'\t').unwrap(), b"X\tY\n1\t2\n");
    }
}
