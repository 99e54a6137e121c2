//! End-to-end runs of the `csvview` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn csvview(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_csvview"))
        .arg("--config")
        .arg(config)
        .arg("--color")
        .arg("never")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run csvview")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn config(&self) -> std::path::PathBuf {
        self.dir.path().join("settings.toml")
    }

    fn file(&self, name: &str, bytes: &[u8]) -> String {
        let path = self.dir.path().join(name);
        fs::write(&path, bytes).unwrap();
        path.to_string_lossy().into_owned()
    }
}

#[test]
fn detect_reports_encoding_and_delimiter() {
    let fixture = Fixture::new();
    let file = fixture.file("tabs.csv", b"a\tb\n1\t2\n");

    let output = csvview(&fixture.config(), &["detect", &file]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Encoding:      utf-8"), "{text}");
    assert!(text.contains("Delimiter:     \\t"), "{text}");
    assert!(text.contains("Sep directive: no"), "{text}");
}

#[test]
fn read_json_uses_sep_directive() {
    let fixture = Fixture::new();
    let file = fixture.file("directive.csv", b"sep=;\nx;y\n1;2\n");

    let output = csvview(&fixture.config(), &["read", &file, "--format", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["headers"], serde_json::json!(["x", "y"]));
    assert_eq!(value["rows"], serde_json::json!([["1", "2"]]));
    assert_eq!(value["encoding"], "utf-8");
    assert_eq!(value["delimiter"], ";");
    assert_eq!(value["had_sep_directive"], true);
}

#[test]
fn read_json_decodes_cp1251() {
    let fixture = Fixture::new();
    // "имя;город\nИван;Тверь\n" in Windows-1251
    let bytes: &[u8] = &[
        0xE8, 0xEC, 0xFF, b';', 0xE3, 0xEE, 0xF0, 0xEE, 0xE4, b'\n', 0xC8, 0xE2, 0xE0, 0xED,
        b';', 0xD2, 0xE2, 0xE5, 0xF0, 0xFC, b'\n',
    ];
    let file = fixture.file("cyrillic.csv", bytes);

    let output = csvview(&fixture.config(), &["read", &file, "--format", "json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["encoding"], "cp1251");
    assert_eq!(value["headers"], serde_json::json!(["имя", "город"]));
    assert_eq!(value["rows"], serde_json::json!([["Иван", "Тверь"]]));
}

#[test]
fn preview_limits_rows() {
    let fixture = Fixture::new();
    let file = fixture.file("many.csv", b"n\nrow-1\nrow-2\nrow-3\nrow-4\n");

    let output = csvview(&fixture.config(), &["preview", &file, "--rows", "2"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("row-1"));
    assert!(text.contains("row-2"));
    assert!(!text.contains("row-3"));
    assert!(text.contains("Rows:          2"));
}

#[test]
fn delimiter_flag_overrides_detection() {
    let fixture = Fixture::new();
    let file = fixture.file("override.csv", b"a;b,c\n1;2,3\n");

    let output = csvview(
        &fixture.config(),
        &["read", &file, "--format", "json", "--delimiter", ";"],
    );
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["headers"], serde_json::json!(["a", "b,c"]));
}

#[test]
fn missing_file_fails_with_message() {
    let fixture = Fixture::new();
    let missing = fixture.dir.path().join("absent.csv");

    let output = csvview(
        &fixture.config(),
        &["read", &missing.to_string_lossy()],
    );
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error: CSV file not found"), "{stderr}");
}

#[test]
fn unknown_encoding_label_is_rejected() {
    let fixture = Fixture::new();
    let file = fixture.file("a.csv", b"a\n1\n");

    let output = csvview(&fixture.config(), &["read", &file, "--encoding", "ebcdic"]);
    assert!(!output.status.success());
}

#[test]
fn remember_encoding_writes_settings() {
    let fixture = Fixture::new();
    let file = fixture.file("latin.csv", b"caf\xE9,x\n1,2\n");

    let output = csvview(
        &fixture.config(),
        &["detect", &file, "--encoding", "Latin-1", "--remember-encoding"],
    );
    assert!(output.status.success());
    let saved = fs::read_to_string(fixture.config()).unwrap();
    assert!(saved.contains("encoding = \"latin1\""), "{saved}");
}

#[test]
fn log_file_receives_timestamped_debug_events() {
    let fixture = Fixture::new();
    let file = fixture.file("logged.csv", b"a;b\n1;2\n");
    let log = fixture.dir.path().join("csvview.log");

    let output = csvview(
        &fixture.config(),
        &[
            "--log-file",
            &log.to_string_lossy(),
            "--log-level",
            "debug",
            "--log-format",
            "compact",
            "--log-timestamps",
            "detect",
            &file,
        ],
    );
    assert!(output.status.success());
    let logged = fs::read_to_string(&log).unwrap();
    let line = logged
        .lines()
        .find(|line| line.contains("detected CSV parameters"))
        .unwrap_or_else(|| panic!("no detection event in\n{logged}"));
    assert!(line.starts_with(|ch: char| ch.is_ascii_digit()), "{line}");
}
