//! Background loading for table views.
//!
//! Front ends hand a [`LoadRequest`] to [`spawn_load`] and receive the
//! flattened header/row arrays, or an error message, over a channel.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use serde::Serialize;

use crate::csv::{CsvReader, ReaderConfig};
use crate::detect::{Delimiter, OnDetectFailure, SourceEncoding};

/// What to load and how.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub path: PathBuf,
    /// Maximum number of records; `None` loads the whole file.
    pub row_limit: Option<usize>,
    pub encoding: Option<SourceEncoding>,
    pub delimiter: Option<Delimiter>,
    pub on_detect_failure: OnDetectFailure,
}

impl LoadRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            row_limit: None,
            encoding: None,
            delimiter: None,
            on_detect_failure: OnDetectFailure::default(),
        }
    }

    #[must_use]
    pub fn with_row_limit(mut self, limit: usize) -> Self {
        self.row_limit = Some(limit);
        self
    }

    fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            path: self.path.clone(),
            encoding_override: self.encoding,
            delimiter_override: self.delimiter,
            on_detect_failure: self.on_detect_failure,
        }
    }
}

/// A loaded table flattened for generic tabular display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub encoding: SourceEncoding,
    pub delimiter: Delimiter,
    pub had_sep_directive: bool,
}

/// Messages sent from the loading thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadUpdate {
    Loaded(LoadedTable),
    Failed(String),
}

/// Runs one reader and flattens its output.
///
/// Failures are turned into the message shown to the user.
pub fn load_table(request: &LoadRequest) -> Result<LoadedTable, String> {
    let reader = CsvReader::from_config(request.reader_config());
    let table = match request.row_limit {
        Some(limit) => reader.read_n(limit),
        None => reader.read(),
    }
    .map_err(|e| e.to_string())?;

    let detection = reader
        .detection()
        .copied()
        .ok_or_else(|| "detection did not run".to_string())?;
    let (headers, rows) = table.into_parts();

    Ok(LoadedTable {
        headers,
        rows,
        encoding: detection.encoding,
        delimiter: detection.delimiter,
        had_sep_directive: detection.had_sep_directive,
    })
}

/// Loads a table on a worker thread and reports the outcome on `sender`.
///
/// There is no cancellation; the load runs to completion or failure.
pub fn spawn_load(request: LoadRequest, sender: Sender<LoadUpdate>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let update = match load_table(&request) {
            Ok(table) => LoadUpdate::Loaded(table),
            Err(message) => {
                tracing::error!(path = %request.path.display(), %message, "CSV load failed");
                LoadUpdate::Failed(message)
            }
        };
        // The receiver may have gone away; nothing left to report to.
        let _ = sender.send(update);
    })
}
