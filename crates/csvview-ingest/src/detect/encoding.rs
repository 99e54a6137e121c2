//! Source encodings and byte-sample encoding detection.
//!
//! Detection walks a fixed candidate list and returns the first encoding that
//! decodes the sample cleanly. Order matters: single-byte Cyrillic and Latin-1
//! decoders accept nearly any input, so UTF-8 is tried first and the UTF-16
//! variants are only reachable for samples the single-byte decoders reject.

use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

use encoding_rs::{CoderResult, Decoder, DecoderResult, Encoding, UTF_8, UTF_16BE, UTF_16LE};
use serde::{Deserialize, Serialize};

use crate::error::IngestError;

/// Number of bytes read from the start of a file for detection.
pub const SAMPLE_SIZE: usize = 1024;

/// Encodings the reader can detect or be told to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEncoding {
    Utf8,
    /// Windows Cyrillic code page.
    Windows1251,
    Latin1,
    /// Same decoder as [`SourceEncoding::Latin1`], kept as its own label.
    Iso8859_1,
    /// UTF-16 with byte order taken from the BOM.
    Utf16,
    Utf16Le,
    Utf16Be,
}

impl SourceEncoding {
    /// Detection order. The first candidate that decodes the sample wins.
    pub const CANDIDATES: [SourceEncoding; 7] = [
        SourceEncoding::Utf8,
        SourceEncoding::Windows1251,
        SourceEncoding::Latin1,
        SourceEncoding::Iso8859_1,
        SourceEncoding::Utf16,
        SourceEncoding::Utf16Le,
        SourceEncoding::Utf16Be,
    ];

    /// Canonical label reported to callers.
    pub fn label(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Windows1251 => "cp1251",
            Self::Latin1 => "latin1",
            Self::Iso8859_1 => "iso-8859-1",
            Self::Utf16 => "utf-16",
            Self::Utf16Le => "utf-16le",
            Self::Utf16Be => "utf-16be",
        }
    }

    /// Decodes a sample for delimiter sniffing, replacing malformed input.
    ///
    /// An incomplete sequence at the end of the sample is dropped.
    pub fn decode_sample(self, bytes: &[u8]) -> String {
        match self.codec() {
            Codec::Latin1 => encoding_rs::mem::decode_latin1(bytes).into_owned(),
            Codec::Standard(encoding) => {
                let mut decoder = self.new_decoder(encoding);
                let capacity = decoder
                    .max_utf8_buffer_length(bytes.len())
                    .unwrap_or(bytes.len().saturating_mul(3));
                let mut text = String::with_capacity(capacity);
                let _ = decoder.decode_to_string(bytes, &mut text, false);
                text
            }
        }
    }

    fn codec(self) -> Codec {
        match self {
            Self::Utf8 => Codec::Standard(UTF_8),
            Self::Windows1251 => Codec::Standard(encoding_rs::WINDOWS_1251),
            Self::Latin1 | Self::Iso8859_1 => Codec::Latin1,
            Self::Utf16 | Self::Utf16Le => Codec::Standard(UTF_16LE),
            Self::Utf16Be => Codec::Standard(UTF_16BE),
        }
    }

    fn new_decoder(self, encoding: &'static Encoding) -> Decoder {
        match self {
            // BOM sniffing switches to big-endian when the file says so.
            Self::Utf16 => encoding.new_decoder(),
            _ => encoding.new_decoder_with_bom_removal(),
        }
    }

    /// Clean strict decode that yields no NUL. Without a BOM, UTF-16 also
    /// needs zero bytes on the side its byte order predicts.
    fn accepts_sample(self, sample: &[u8], complete: bool) -> bool {
        match self {
            Self::Latin1 | Self::Iso8859_1 => !sample.contains(&0),
            Self::Utf16 if !has_utf16_bom(sample) => false,
            Self::Utf16Le if zero_parity(sample) != Parity::Odd => false,
            Self::Utf16Be if zero_parity(sample) != Parity::Even => false,
            _ => self
                .decode_strict(sample, complete)
                .is_some_and(|text| !text.contains('\0')),
        }
    }

    fn decode_strict(self, bytes: &[u8], last: bool) -> Option<String> {
        let Codec::Standard(encoding) = self.codec() else {
            return Some(encoding_rs::mem::decode_latin1(bytes).into_owned());
        };
        let mut decoder = self.new_decoder(encoding);
        let capacity = decoder.max_utf8_buffer_length_without_replacement(bytes.len())?;
        let mut text = String::with_capacity(capacity);
        let (result, _) = decoder.decode_to_string_without_replacement(bytes, &mut text, last);
        matches!(result, DecoderResult::InputEmpty).then_some(text)
    }
}

impl fmt::Display for SourceEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SourceEncoding {
    type Err = IngestError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        let encoding = match normalized.as_str() {
            "utf-8" | "utf8" => Self::Utf8,
            "cp1251" | "cp-1251" | "windows-1251" | "win-1251" => Self::Windows1251,
            "latin1" | "latin-1" | "l1" => Self::Latin1,
            "iso-8859-1" | "iso8859-1" | "iso-8859_1" => Self::Iso8859_1,
            "utf-16" | "utf16" => Self::Utf16,
            "utf-16le" | "utf-16-le" | "utf16le" => Self::Utf16Le,
            "utf-16be" | "utf-16-be" | "utf16be" => Self::Utf16Be,
            _ => {
                return Err(IngestError::UnknownEncoding {
                    label: label.to_string(),
                });
            }
        };
        Ok(encoding)
    }
}

impl Serialize for SourceEncoding {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for SourceEncoding {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

/// What to do when no candidate encoding decodes the sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDetectFailure {
    /// Read as UTF-8, replacing undecodable bytes.
    #[default]
    UseFallback,
    /// Surface [`IngestError::EncodingUndetected`].
    Fail,
}

/// Returns the first candidate encoding that decodes `sample` without error.
///
/// `complete` tells whether the sample holds the whole file; when it does
/// not, a multi-byte sequence cut at the end of the sample is tolerated.
pub fn detect_encoding(sample: &[u8], complete: bool) -> Option<SourceEncoding> {
    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return Some(if encoding == UTF_8 {
            SourceEncoding::Utf8
        } else {
            SourceEncoding::Utf16
        });
    }
    SourceEncoding::CANDIDATES
        .into_iter()
        .find(|candidate| candidate.accepts_sample(sample, complete))
}

#[derive(Clone, Copy)]
enum Codec {
    Standard(&'static Encoding),
    Latin1,
}

fn has_utf16_bom(sample: &[u8]) -> bool {
    matches!(Encoding::for_bom(sample), Some((encoding, _)) if encoding == UTF_16LE || encoding == UTF_16BE)
}

#[derive(Debug, PartialEq, Eq)]
enum Parity {
    Even,
    Odd,
    Unknown,
}

/// Where zero bytes cluster. ASCII text in UTF-16LE puts them at odd offsets.
fn zero_parity(sample: &[u8]) -> Parity {
    let (even, odd) = sample
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == 0)
        .fold((0usize, 0usize), |(even, odd), (idx, _)| {
            if idx % 2 == 0 {
                (even + 1, odd)
            } else {
                (even, odd + 1)
            }
        });
    match even.cmp(&odd) {
        std::cmp::Ordering::Greater => Parity::Even,
        std::cmp::Ordering::Less => Parity::Odd,
        std::cmp::Ordering::Equal => Parity::Unknown,
    }
}

const INPUT_CHUNK: usize = 8 * 1024;
const OUTPUT_CHUNK: usize = 16 * 1024;

enum StreamCodec {
    Decoder(Decoder),
    Latin1,
}

/// Adapts a byte reader in `encoding` into a UTF-8 byte reader.
///
/// In strict mode malformed input fails with [`io::ErrorKind::InvalidData`];
/// otherwise it is replaced with U+FFFD. Input is pulled in chunks as the
/// consumer reads, so a consumer that stops early leaves the rest unread.
pub struct DecodeReader<R> {
    inner: R,
    encoding: SourceEncoding,
    codec: StreamCodec,
    strict: bool,
    input: Vec<u8>,
    input_pos: usize,
    input_len: usize,
    output: Vec<u8>,
    output_pos: usize,
    eof: bool,
    finished: bool,
}

impl<R: Read> DecodeReader<R> {
    pub fn new(inner: R, encoding: SourceEncoding, strict: bool) -> Self {
        let codec = match encoding.codec() {
            Codec::Standard(standard) => StreamCodec::Decoder(encoding.new_decoder(standard)),
            Codec::Latin1 => StreamCodec::Latin1,
        };
        Self {
            inner,
            encoding,
            codec,
            strict,
            input: vec![0; INPUT_CHUNK],
            input_pos: 0,
            input_len: 0,
            output: Vec::with_capacity(OUTPUT_CHUNK),
            output_pos: 0,
            eof: false,
            finished: false,
        }
    }

    fn fill_output(&mut self) -> io::Result<()> {
        if self.input_pos == self.input_len && !self.eof {
            let read = self.inner.read(&mut self.input)?;
            self.input_pos = 0;
            self.input_len = read;
            self.eof = read == 0;
        }

        let src = &self.input[self.input_pos..self.input_len];
        let last = self.eof;
        self.output.clear();
        self.output.resize(OUTPUT_CHUNK, 0);
        self.output_pos = 0;

        let (read, written, done) = match &mut self.codec {
            StreamCodec::Latin1 => {
                let (read, written) =
                    encoding_rs::mem::convert_latin1_to_utf8_partial(src, &mut self.output);
                (read, written, last && read == src.len())
            }
            StreamCodec::Decoder(decoder) if self.strict => {
                let (result, read, written) =
                    decoder.decode_to_utf8_without_replacement(src, &mut self.output, last);
                match result {
                    DecoderResult::Malformed(_, _) => {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidData,
                            format!("input is not valid {}", self.encoding),
                        ));
                    }
                    DecoderResult::InputEmpty => (read, written, last),
                    DecoderResult::OutputFull => (read, written, false),
                }
            }
            StreamCodec::Decoder(decoder) => {
                let (result, read, written, _) = decoder.decode_to_utf8(src, &mut self.output, last);
                (read, written, last && result == CoderResult::InputEmpty)
            }
        };

        self.input_pos += read;
        self.output.truncate(written);
        self.finished = done;
        Ok(())
    }
}

impl<R: Read> Read for DecodeReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            if self.output_pos < self.output.len() {
                let available = &self.output[self.output_pos..];
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                self.output_pos += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }
            self.fill_output()?;
        }
    }
}
