//! Cleaning operations: duplicate removal, missing-value filling, cell edits.
//!
//! Every operation is pure: it takes a dataset by reference and returns a
//! new one, so steps compose in any order.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::DatasetError;
use crate::models::{Cell, Dataset};

/// Placeholder written into missing cells when none is given.
pub const DEFAULT_FILL_VALUE: &str = "N/A";

/// Hashable view of a cell, used to compare whole rows.
#[derive(Hash, PartialEq, Eq)]
enum CellKey<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(&'a str),
}

impl<'a> From<&'a Cell> for CellKey<'a> {
    fn from(cell: &'a Cell) -> Self {
        match cell {
            Cell::Null => CellKey::Null,
            Cell::Bool(b) => CellKey::Bool(*b),
            Cell::Int(i) => CellKey::Int(*i),
            // -0.0 == 0.0 as cells, so they must hash the same.
            Cell::Float(f) if *f == 0.0 => CellKey::Float(0.0_f64.to_bits()),
            Cell::Float(f) => CellKey::Float(f.to_bits()),
            Cell::Text(s) => CellKey::Text(s),
        }
    }
}

/// Per row: does it repeat an earlier row?
fn duplicate_rows(dataset: &Dataset) -> Vec<bool> {
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(dataset.row_count());
    dataset
        .rows()
        .map(|row| !seen.insert(row.into_iter().map(CellKey::from).collect()))
        .collect()
}

/// Remove rows that exactly repeat an earlier row, keeping first occurrences
/// in their original order.
///
/// # Example
/// ```
/// use datasweeper::{remove_duplicates, Cell, Dataset};
///
/// let ds = Dataset::from_rows(
///     vec!["id".into(), "name".into()],
///     vec![
///         vec![Cell::Int(1), "a".into()],
///         vec![Cell::Int(1), "a".into()],
///         vec![Cell::Int(2), "b".into()],
///     ],
/// ).unwrap();
///
/// assert_eq!(remove_duplicates(&ds).row_count(), 2);
/// ```
pub fn remove_duplicates(dataset: &Dataset) -> Dataset {
    let keep: Vec<usize> = duplicate_rows(dataset)
        .into_iter()
        .enumerate()
        .filter(|(_, duplicate)| !duplicate)
        .map(|(i, _)| i)
        .collect();
    dataset.select_rows(&keep)
}

/// Number of rows [`remove_duplicates`] would drop.
pub fn duplicate_count(dataset: &Dataset) -> usize {
    duplicate_rows(dataset).into_iter().filter(|d| *d).count()
}

/// Replace every null cell with `placeholder`. Populated cells are untouched.
pub fn fill_missing(dataset: &Dataset, placeholder: &Cell) -> Dataset {
    let mut filled = dataset.clone();
    for column in filled.columns_mut() {
        for cell in column.cells.iter_mut().filter(|c| c.is_null()) {
            *cell = placeholder.clone();
        }
    }
    filled
}

/// A direct edit of one cell. `value` is raw text, inferred like an uploaded field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellEdit {
    pub row: usize,
    pub column: String,
    pub value: String,
}

impl CellEdit {
    pub fn new(row: usize, column: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            value: value.into(),
        }
    }

    /// Parse `ROW:COLUMN=VALUE` (row is 0-based).
    pub fn parse(spec: &str) -> Result<Self, String> {
        let (target, value) = spec
            .split_once('=')
            .ok_or_else(|| format!("expected ROW:COLUMN=VALUE, got '{}'", spec))?;
        let (row, column) = target
            .split_once(':')
            .ok_or_else(|| format!("expected ROW:COLUMN=VALUE, got '{}'", spec))?;
        let row = row
            .trim()
            .parse::<usize>()
            .map_err(|_| format!("invalid row index '{}'", row))?;
        Ok(Self::new(row, column, value))
    }
}

/// Apply edits in order. Fails without partial changes if any edit targets
/// an unknown column or a row past the end.
pub fn apply_edits(dataset: &Dataset, edits: &[CellEdit]) -> Result<Dataset, DatasetError> {
    let mut edited = dataset.clone();
    let rows = dataset.row_count();

    for edit in edits {
        let index = dataset
            .column_index(&edit.column)
            .ok_or_else(|| DatasetError::UnknownColumn(edit.column.clone()))?;
        if edit.row >= rows {
            return Err(DatasetError::RowOutOfBounds { row: edit.row, rows });
        }
        edited.columns_mut()[index].cells[edit.row] = Cell::infer(&edit.value);
    }

    Ok(edited)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_name() -> Dataset {
        Dataset::from_rows(
            vec!["id".into(), "name".into()],
            vec![
                vec![Cell::Int(1), "a".into()],
                vec![Cell::Int(1), "a".into()],
                vec![Cell::Int(2), "b".into()],
            ],
        )
        .unwrap()
    }

    fn with_nulls() -> Dataset {
        Dataset::from_rows(
            vec!["x".into()],
            vec![vec![Cell::Int(1)], vec![Cell::Null], vec![Cell::Int(3)]],
        )
        .unwrap()
    }

    #[test]
    fn test_remove_duplicates_example() {
        let deduped = remove_duplicates(&id_name());
        let expected = Dataset::from_rows(
            vec!["id".into(), "name".into()],
            vec![vec![Cell::Int(1), "a".into()], vec![Cell::Int(2), "b".into()]],
        )
        .unwrap();
        assert_eq!(deduped, expected);
        assert_eq!(duplicate_count(&id_name()), 1);
    }

    #[test]
    fn test_remove_duplicates_idempotent() {
        let once = remove_duplicates(&id_name());
        let twice = remove_duplicates(&once);
        assert_eq!(once, twice);
        assert_eq!(duplicate_count(&once), 0);
    }

    #[test]
    fn test_remove_duplicates_keeps_order_and_columns() {
        let ds = Dataset::from_rows(
            vec!["v".into(), "w".into()],
            vec![
                vec![Cell::Int(3), Cell::Null],
                vec![Cell::Int(1), Cell::Null],
                vec![Cell::Int(3), Cell::Null],
                vec![Cell::Int(2), Cell::Float(0.0)],
                vec![Cell::Int(2), Cell::Float(-0.0)],
            ],
        )
        .unwrap();

        let deduped = remove_duplicates(&ds);
        assert!(deduped.row_count() <= ds.row_count());
        assert_eq!(deduped.column_names(), ds.column_names());
        let firsts: Vec<&Cell> = deduped.rows().map(|r| r[0]).collect();
        assert_eq!(firsts, vec![&Cell::Int(3), &Cell::Int(1), &Cell::Int(2)]);
    }

    #[test]
    fn test_int_and_float_rows_are_distinct() {
        let ds = Dataset::from_rows(
            vec!["v".into()],
            vec![vec![Cell::Int(1)], vec![Cell::Float(1.0)]],
        )
        .unwrap();
        assert_eq!(remove_duplicates(&ds).row_count(), 2);
    }

    #[test]
    fn test_remove_duplicates_empty_dataset() {
        let ds = Dataset::default();
        assert_eq!(remove_duplicates(&ds), ds);
    }

    #[test]
    fn test_fill_missing_example() {
        let filled = fill_missing(&with_nulls(), &Cell::Text(DEFAULT_FILL_VALUE.into()));
        let expected = Dataset::from_rows(
            vec!["x".into()],
            vec![vec![Cell::Int(1)], vec!["N/A".into()], vec![Cell::Int(3)]],
        )
        .unwrap();
        assert_eq!(filled, expected);
    }

    #[test]
    fn test_fill_missing_leaves_no_nulls_and_keeps_values() {
        let ds = Dataset::from_rows(
            vec!["a".into(), "b".into()],
            vec![
                vec![Cell::Null, "x".into()],
                vec![Cell::Float(1.5), Cell::Null],
            ],
        )
        .unwrap();
        let filled = fill_missing(&ds, &Cell::Int(0));

        assert_eq!(filled.missing_count(), 0);
        for (before, after) in ds.rows().zip(filled.rows()) {
            for (b, a) in before.iter().zip(after.iter()) {
                if !b.is_null() {
                    assert_eq!(b, a);
                }
            }
        }
        // Input untouched.
        assert_eq!(ds.missing_count(), 2);
    }

    #[test]
    fn test_apply_edits() {
        let edited = apply_edits(
            &id_name(),
            &[CellEdit::new(2, "name", "zed"), CellEdit::new(0, "id", "10")],
        )
        .unwrap();
        assert_eq!(edited.row(2).unwrap()[1], &Cell::Text("zed".into()));
        assert_eq!(edited.row(0).unwrap()[0], &Cell::Int(10));
    }

    #[test]
    fn test_apply_edits_errors() {
        let err = apply_edits(&id_name(), &[CellEdit::new(0, "missing", "1")]).unwrap_err();
        assert_eq!(err, DatasetError::UnknownColumn("missing".into()));

        let err = apply_edits(&id_name(), &[CellEdit::new(3, "id", "1")]).unwrap_err();
        assert_eq!(err, DatasetError::RowOutOfBounds { row: 3, rows: 3 });
    }

    #[test]
    fn test_parse_cell_edit() {
        assert_eq!(
            CellEdit::parse("4:price=9.99").unwrap(),
            CellEdit::new(4, "price", "9.99")
        );
        assert_eq!(
            CellEdit::parse("0:note=a=b").unwrap(),
            CellEdit::new(0, "note", "a=b")
        );
        assert!(CellEdit::parse("price=1").is_err());
        assert!(CellEdit::parse("x:price=1").is_err());
    }
}
