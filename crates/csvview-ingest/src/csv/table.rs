//! Parsed table: a header schema plus position-aligned rows.

use serde::{Deserialize, Serialize};

use super::header::Header;

/// Header and rows read from one CSV file.
///
/// Every row holds exactly `header.len()` values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvTable {
    pub header: Header,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn record(&self, index: usize) -> Option<Record<'_>> {
        self.rows.get(index).map(|values| Record {
            header: &self.header,
            values,
        })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(|values| Record {
            header: &self.header,
            values,
        })
    }

    /// Splits into plain header and row arrays.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.header.into_columns(), self.rows)
    }
}

/// One row viewed through the header.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    header: &'a Header,
    values: &'a [String],
}

impl<'a> Record<'a> {
    /// Cell under the named column. With duplicate names the last one wins.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = self.header.position(column)?;
        self.get_index(index)
    }

    pub fn get_index(&self, index: usize) -> Option<&'a str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }

    /// `(column, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + use<'a> {
        self.header
            .as_slice()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(String::as_str))
    }
}

/// Fits a parsed row to the header width: pads short rows with empty
/// strings and drops values past the last column.
///
/// Returns the number of dropped values.
pub(crate) fn fit_row(values: &mut Vec<String>, width: usize) -> usize {
    let dropped = values.len().saturating_sub(width);
    values.resize_with(width, String::new);
    dropped
}
