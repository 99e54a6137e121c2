//! CSV header schema.

use serde::{Deserialize, Serialize};

/// Ordered column names taken from the header line.
///
/// Names are kept as written and may repeat. Lookups by name resolve to the
/// last column carrying that name, matching map-based records where a later
/// duplicate overwrites an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Header {
    columns: Vec<String>,
}

impl Header {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if there are no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column index for a name, preferring the last duplicate.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().rposition(|column| column == name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.columns
    }

    /// Returns true if any column name appears more than once.
    pub fn has_duplicates(&self) -> bool {
        self.columns
            .iter()
            .enumerate()
            .any(|(idx, name)| self.columns[..idx].contains(name))
    }

    pub fn into_columns(self) -> Vec<String> {
        self.columns
    }
}

impl From<Vec<String>> for Header {
    fn from(columns: Vec<String>) -> Self {
        Self::new(columns)
    }
}
