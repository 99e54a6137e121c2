//! Encoding and delimiter detection.

mod delimiter;
mod encoding;

pub use delimiter::{
    Delimiter, DelimiterDetection, SepDirective, count_candidates, detect_delimiter,
    parse_sep_directive, sniff_delimiter, sniff_line,
};
pub use encoding::{DecodeReader, OnDetectFailure, SAMPLE_SIZE, SourceEncoding, detect_encoding};
