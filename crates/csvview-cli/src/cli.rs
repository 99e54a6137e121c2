//! CLI argument definitions for csvview.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use csvview_ingest::{Delimiter, SourceEncoding};

#[derive(Parser)]
#[command(
    name = "csvview",
    version,
    about = "Inspect CSV files of unknown encoding and delimiter",
    long_about = "Inspect CSV files of unknown encoding and delimiter.\n\n\
                  Detects UTF-8, cp1251, Latin-1 and UTF-16 encodings, honours\n\
                  `sep=` directive lines and sniffs , ; tab and | delimiters."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix log lines with timestamps (pretty and compact formats).
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,

    /// Settings file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Report the detected encoding and delimiter without reading records.
    Detect(DetectArgs),

    /// Show the first rows of a file.
    Preview(PreviewArgs),

    /// Read a whole file.
    Read(ReadArgs),
}

/// Overrides shared by every command that opens a file.
#[derive(Args, Clone)]
pub struct ReaderArgs {
    /// Path to the CSV file.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Encoding to use instead of detection (utf-8, cp1251, latin1, utf-16, ...).
    #[arg(long = "encoding", value_name = "LABEL")]
    pub encoding: Option<SourceEncoding>,

    /// Field delimiter to use instead of detection (a single character, or `\t`).
    #[arg(long = "delimiter", value_name = "CHAR")]
    pub delimiter: Option<Delimiter>,

    /// Fail instead of falling back to lossy UTF-8 when no encoding matches.
    #[arg(long = "strict-encoding")]
    pub strict_encoding: bool,

    /// Remember the effective encoding for the next files opened.
    #[arg(long = "remember-encoding")]
    pub remember_encoding: bool,
}

#[derive(Args)]
pub struct DetectArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,
}

#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,

    /// Number of rows to show (default: from settings, 5).
    #[arg(long = "rows", short = 'n', value_name = "N")]
    pub rows: Option<usize>,
}

#[derive(Args)]
pub struct ReadArgs {
    #[command(flatten)]
    pub reader: ReaderArgs,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Table,
    Json,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
