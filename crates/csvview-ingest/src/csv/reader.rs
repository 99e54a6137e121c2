//! CSV file reading with encoding and delimiter auto-detection.

use std::cell::OnceCell;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use serde::Serialize;

use crate::detect::{
    DecodeReader, Delimiter, DelimiterDetection, OnDetectFailure, SAMPLE_SIZE, SourceEncoding,
    detect_delimiter, detect_encoding,
};
use crate::error::{IngestError, Result};

use super::header::Header;
use super::table::{CsvTable, fit_row};

/// Construction-time settings of a [`CsvReader`]. Never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    pub path: PathBuf,
    /// Trusted as-is; skips encoding detection.
    pub encoding_override: Option<SourceEncoding>,
    /// Wins over both sniffing and a `sep=` directive.
    pub delimiter_override: Option<Delimiter>,
    pub on_detect_failure: OnDetectFailure,
}

impl ReaderConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding_override: None,
            delimiter_override: None,
            on_detect_failure: OnDetectFailure::default(),
        }
    }
}

/// Parameters detected for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Detection {
    pub encoding: SourceEncoding,
    pub delimiter: Delimiter,
    /// The first line is a `sep=` directive and is skipped when parsing.
    pub had_sep_directive: bool,
    /// No candidate encoding matched; the file is read as lossy UTF-8.
    pub encoding_fallback: bool,
}

/// Reader for a single CSV file of unknown encoding and delimiter.
///
/// Detection runs once, on the first call that needs it, and is reused by
/// every later read on the same instance. The reader is meant for one thread;
/// run it on a worker and send the result back (see [`crate::spawn_load`]).
#[derive(Debug)]
pub struct CsvReader {
    config: ReaderConfig,
    detection: OnceCell<Detection>,
}

impl CsvReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_config(ReaderConfig::new(path))
    }

    pub fn from_config(config: ReaderConfig) -> Self {
        Self {
            config,
            detection: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn with_encoding(mut self, encoding: SourceEncoding) -> Self {
        self.config.encoding_override = Some(encoding);
        self
    }

    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.config.delimiter_override = Some(delimiter);
        self
    }

    #[must_use]
    pub fn with_detect_failure(mut self, policy: OnDetectFailure) -> Self {
        self.config.on_detect_failure = policy;
        self
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Detection result, if detection has run.
    pub fn detection(&self) -> Option<&Detection> {
        self.detection.get()
    }

    pub fn effective_encoding(&self) -> Option<SourceEncoding> {
        self.detection().map(|d| d.encoding)
    }

    pub fn effective_delimiter(&self) -> Option<Delimiter> {
        self.detection().map(|d| d.delimiter)
    }

    /// Runs detection if it has not run yet.
    pub fn detect(&self) -> Result<&Detection> {
        if let Some(detection) = self.detection.get() {
            return Ok(detection);
        }
        let detection = self.detect_now()?;
        Ok(self.detection.get_or_init(|| detection))
    }

    /// Reads the header and every record.
    pub fn read(&self) -> Result<CsvTable> {
        self.read_limited(None)
    }

    /// Reads the header and at most `n` records, leaving the rest of the
    /// file unread.
    pub fn read_n(&self, n: usize) -> Result<CsvTable> {
        self.read_limited(Some(n))
    }

    fn read_limited(&self, limit: Option<usize>) -> Result<CsvTable> {
        let path = self.path();
        let span = tracing::info_span!("read_csv", path = %path.display(), limit = ?limit);
        let _guard = span.enter();

        self.ensure_exists()?;
        let detection = *self.detect()?;
        let file = self.open()?;
        let table = parse_from(file, &detection, limit).map_err(|e| IngestError::read(path, e))?;

        tracing::debug!(
            columns = table.header.len(),
            records = table.len(),
            "read CSV records"
        );
        Ok(table)
    }

    fn detect_now(&self) -> Result<Detection> {
        self.ensure_exists()?;
        let path = self.path();
        let mut sample = Vec::with_capacity(SAMPLE_SIZE + 1);
        self.open()?
            .take(SAMPLE_SIZE as u64 + 1)
            .read_to_end(&mut sample)
            .map_err(|e| IngestError::read(path, e))?;
        let complete = sample.len() <= SAMPLE_SIZE;
        sample.truncate(SAMPLE_SIZE);

        let (encoding, encoding_fallback) = match self.config.encoding_override {
            Some(encoding) => (encoding, false),
            None => match detect_encoding(&sample, complete) {
                Some(encoding) => (encoding, false),
                None => match self.config.on_detect_failure {
                    OnDetectFailure::UseFallback => {
                        tracing::warn!(
                            path = %path.display(),
                            "no candidate encoding matched, reading as lossy UTF-8"
                        );
                        (SourceEncoding::Utf8, true)
                    }
                    OnDetectFailure::Fail => {
                        return Err(IngestError::EncodingUndetected {
                            path: path.to_path_buf(),
                        });
                    }
                },
            },
        };

        let text = encoding.decode_sample(&sample);
        let DelimiterDetection {
            delimiter,
            had_sep_directive,
        } = detect_delimiter(&text, self.config.delimiter_override);

        tracing::debug!(
            path = %path.display(),
            encoding = %encoding,
            delimiter = %delimiter.escaped(),
            had_sep_directive,
            "detected CSV parameters"
        );

        Ok(Detection {
            encoding,
            delimiter,
            had_sep_directive,
            encoding_fallback,
        })
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.path().exists() {
            Ok(())
        } else {
            Err(IngestError::FileNotFound {
                path: self.path().to_path_buf(),
            })
        }
    }

    fn open(&self) -> Result<File> {
        File::open(self.path()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IngestError::FileNotFound {
                    path: self.path().to_path_buf(),
                }
            } else {
                IngestError::read(self.path(), e)
            }
        })
    }
}

/// Parses header and records from raw file bytes.
///
/// Stops pulling input once `limit` records have been read.
pub(crate) fn parse_from<R: Read>(
    input: R,
    detection: &Detection,
    limit: Option<usize>,
) -> csv::Result<CsvTable> {
    let decoded = DecodeReader::new(input, detection.encoding, !detection.encoding_fallback);
    let mut buffered = BufReader::new(decoded);
    if detection.had_sep_directive {
        let mut directive = Vec::new();
        buffered.read_until(b'\n', &mut directive)?;
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(detection.delimiter.as_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(buffered);

    let header = Header::new(reader.headers()?.iter().map(str::to_string).collect());
    if header.has_duplicates() {
        tracing::debug!(columns = ?header.as_slice(), "duplicate column names, lookups use the last");
    }
    let width = header.len();
    let mut rows = Vec::new();
    let mut record = StringRecord::new();

    while limit.is_none_or(|n| rows.len() < n) && reader.read_record(&mut record)? {
        let mut values: Vec<String> = record.iter().map(str::to_string).collect();
        let dropped = fit_row(&mut values, width);
        if dropped > 0 {
            tracing::debug!(
                line = record.position().map(csv::Position::line),
                dropped,
                "dropped values past the last header column"
            );
        }
        rows.push(values);
    }

    Ok(CsvTable { header, rows })
}
