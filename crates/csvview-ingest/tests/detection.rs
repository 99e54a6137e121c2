//! Property tests: files written in a supported encoding with a candidate
//! delimiter are detected as exactly that encoding and delimiter.

use std::io::Write;

use proptest::prelude::*;
use tempfile::NamedTempFile;

use csvview_ingest::{CsvReader, Delimiter, SAMPLE_SIZE, SourceEncoding, detect_encoding};

fn table_strategy(cell: &'static str) -> impl Strategy<Value = Vec<Vec<String>>> {
    (2usize..6).prop_flat_map(move |width| {
        prop::collection::vec(prop::collection::vec(cell, width), 1..30)
    })
}

fn delimiter_strategy() -> impl Strategy<Value = Delimiter> {
    prop::sample::select(Delimiter::CANDIDATES.to_vec())
}

fn render(rows: &[Vec<String>], delimiter: Delimiter) -> String {
    let separator = delimiter.as_char().to_string();
    rows.iter()
        .map(|row| format!("{}\n", row.join(&separator)))
        .collect()
}

fn encode(text: &str, encoding: SourceEncoding) -> Vec<u8> {
    let utf16 = |bom: bool, little_endian: bool| {
        let units = bom.then_some(0xFEFFu16).into_iter().chain(text.encode_utf16());
        units
            .flat_map(|unit| {
                if little_endian {
                    unit.to_le_bytes()
                } else {
                    unit.to_be_bytes()
                }
            })
            .collect::<Vec<u8>>()
    };
    match encoding {
        SourceEncoding::Utf8 => text.as_bytes().to_vec(),
        SourceEncoding::Windows1251 => encoding_rs::WINDOWS_1251.encode(text).0.into_owned(),
        SourceEncoding::Utf16 => utf16(true, true),
        SourceEncoding::Utf16Le => utf16(false, true),
        SourceEncoding::Utf16Be => utf16(false, false),
        SourceEncoding::Latin1 | SourceEncoding::Iso8859_1 => {
            text.chars().map(|ch| ch as u8).collect()
        }
    }
}

fn detect(bytes: &[u8]) -> (SourceEncoding, Delimiter, usize) {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(bytes).expect("write temp file");
    let reader = CsvReader::new(file.path());
    let table = reader.read().expect("read csv");
    let detection = reader.detection().expect("detection ran");
    (detection.encoding, detection.delimiter, table.len())
}

fn check(rows: &[Vec<String>], delimiter: Delimiter, encoding: SourceEncoding) {
    let bytes = encode(&render(rows, delimiter), encoding);
    let (detected_encoding, detected_delimiter, records) = detect(&bytes);
    assert_eq!(detected_encoding, encoding);
    assert_eq!(detected_delimiter, delimiter);
    assert_eq!(records, rows.len() - 1);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn detects_utf8(rows in table_strategy("[a-zA-Z0-9]{1,8}"), delimiter in delimiter_strategy()) {
        check(&rows, delimiter, SourceEncoding::Utf8);
    }

    #[test]
    fn detects_utf8_with_punctuation_and_controls(
        rows in table_strategy("[a-zA-Z0-9 .!?()\\-\\x0b\\x1a]{1,8}"),
        delimiter in delimiter_strategy(),
    ) {
        check(&rows, delimiter, SourceEncoding::Utf8);
    }

    #[test]
    fn detects_utf8_cyrillic(rows in table_strategy("[а-яА-Я]{1,8}"), delimiter in delimiter_strategy()) {
        check(&rows, delimiter, SourceEncoding::Utf8);
    }

    #[test]
    fn detects_cp1251(rows in table_strategy("[а-яА-Я]{1,8}"), delimiter in delimiter_strategy()) {
        check(&rows, delimiter, SourceEncoding::Windows1251);
    }

    #[test]
    fn detects_utf16_with_bom(rows in table_strategy("[a-z0-9]{1,8}"), delimiter in delimiter_strategy()) {
        check(&rows, delimiter, SourceEncoding::Utf16);
    }

    #[test]
    fn detects_utf16le(rows in table_strategy("[a-z0-9]{1,8}"), delimiter in delimiter_strategy()) {
        check(&rows, delimiter, SourceEncoding::Utf16Le);
    }

    #[test]
    fn detects_utf16be(rows in table_strategy("[a-z0-9]{1,8}"), delimiter in delimiter_strategy()) {
        check(&rows, delimiter, SourceEncoding::Utf16Be);
    }
}

#[test]
fn detects_latin1_when_cp1251_cannot_decode() {
    let bytes = encode("name;note\nx;\u{98}caf\u{e9}\n", SourceEncoding::Latin1);
    let (encoding, delimiter, records) = detect(&bytes);
    assert_eq!(encoding, SourceEncoding::Latin1);
    assert_eq!(delimiter, Delimiter::SEMICOLON);
    assert_eq!(records, 1);
}

#[test]
fn detects_utf8_ending_in_eof_marker() {
    let (encoding, delimiter, records) = detect(b"a,b\n1,22\n\x1a");
    assert_eq!(encoding, SourceEncoding::Utf8);
    assert_eq!(delimiter, Delimiter::COMMA);
    assert_eq!(records, 2);
}

#[test]
fn detects_utf8_with_vertical_tab_past_the_sample() {
    let mut text = String::from("x,text\nx,line\x0bbreak\n");
    while text.len() < 2 * SAMPLE_SIZE {
        text.push_str("y,plain\n");
    }
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();

    let reader = CsvReader::new(file.path());
    let table = reader.read().unwrap();
    assert_eq!(reader.effective_encoding(), Some(SourceEncoding::Utf8));
    assert_eq!(table.record(0).unwrap().get("text"), Some("line\x0bbreak"));
}

#[test]
fn detects_utf8_in_full_sample_without_zero_bytes() {
    let mut text = String::from("id,text\n");
    while text.len() < SAMPLE_SIZE {
        text.push_str("1,ok\x0b\n");
    }
    text.truncate(SAMPLE_SIZE - 1);
    text.push('\n');
    let bytes = text.as_bytes();
    assert_eq!(bytes.len(), SAMPLE_SIZE);
    assert!(!bytes.contains(&0));

    assert_eq!(detect_encoding(bytes, true), Some(SourceEncoding::Utf8));
    assert_eq!(detect_encoding(bytes, false), Some(SourceEncoding::Utf8));
    let (encoding, delimiter, _) = detect(bytes);
    assert_eq!(encoding, SourceEncoding::Utf8);
    assert_eq!(delimiter, Delimiter::COMMA);
}
