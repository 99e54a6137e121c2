//! Auto-detecting CSV ingestion.
//!
//! This crate reads delimited text files whose encoding and field delimiter
//! are not known up front, and hands back the header plus text records.
//!
//! # Features
//!
//! - **Encoding detection**: first clean decode of a 1 KiB sample over a fixed
//!   candidate list (UTF-8, cp1251, Latin-1, UTF-16 variants)
//! - **Delimiter detection**: `sep=` directive lines, structural sniffing and
//!   candidate counting over `,` `;` tab and `|`
//! - **Bounded reads**: preview the first records without decoding the rest
//! - **Background loading**: run a reader on a worker thread and receive the
//!   result over a channel
//!
//! # Example
//!
//! ```ignore
//! use csvview_ingest::CsvReader;
//!
//! let reader = CsvReader::new("export.csv");
//! let preview = reader.read_n(5)?;
//! println!("{} / {:?}", reader.effective_encoding().unwrap(), reader.effective_delimiter());
//! for record in preview.records() {
//!     println!("{:?}", record.get("name"));
//! }
//! ```

mod csv;
mod detect;
mod error;
mod loader;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use self::csv::{CsvReader, CsvTable, Detection, Header, ReaderConfig, Record};

// === Detection ===
pub use detect::{
    DecodeReader, Delimiter, DelimiterDetection, OnDetectFailure, SAMPLE_SIZE, SepDirective,
    SourceEncoding, count_candidates, detect_delimiter, detect_encoding, parse_sep_directive,
    sniff_delimiter, sniff_line,
};

// === Background Loading ===
pub use loader::{LoadRequest, LoadUpdate, LoadedTable, load_table, spawn_load};
