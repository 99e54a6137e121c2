use std::path::Path;
use std::sync::mpsc;

use anyhow::{Context, Result, anyhow};
use tracing::{info, info_span, warn};

use csvview_cli::render::{detection_summary, loaded_summary, short_label, table_view, to_json};
use csvview_cli::settings::{Settings, save_settings};
use csvview_ingest::{CsvReader, LoadRequest, LoadUpdate, LoadedTable, SourceEncoding, spawn_load};

use crate::cli::{DetectArgs, OutputFormatArg, PreviewArgs, ReadArgs, ReaderArgs};

pub fn run_detect(args: &DetectArgs, settings: &Settings, config: Option<&Path>) -> Result<()> {
    let request = load_request(&args.reader, settings);
    let mut reader = CsvReader::new(&request.path).with_detect_failure(request.on_detect_failure);
    if let Some(encoding) = request.encoding {
        reader = reader.with_encoding(encoding);
    }
    if let Some(delimiter) = request.delimiter {
        reader = reader.with_delimiter(delimiter);
    }

    let detection = reader
        .detect()
        .with_context(|| format!("detect {}", request.path.display()))?;
    println!("File:          {}", request.path.display());
    println!("{}", detection_summary(detection));

    if args.reader.remember_encoding {
        remember_encoding(settings, detection.encoding, config);
    }
    Ok(())
}

pub fn run_preview(args: &PreviewArgs, settings: &Settings, config: Option<&Path>) -> Result<()> {
    let rows = args.rows.unwrap_or(settings.reader.preview_rows);
    let request = load_request(&args.reader, settings).with_row_limit(rows);
    let loaded = load_in_background(request)?;

    println!("{}", table_view(&loaded));
    println!("{}", loaded_summary(&loaded));

    if args.reader.remember_encoding {
        remember_encoding(settings, loaded.encoding, config);
    }
    Ok(())
}

pub fn run_read(args: &ReadArgs, settings: &Settings, config: Option<&Path>) -> Result<()> {
    let request = load_request(&args.reader, settings);
    let loaded = load_in_background(request)?;

    match args.format {
        OutputFormatArg::Table => {
            println!("{}", table_view(&loaded));
            println!("{}", loaded_summary(&loaded));
        }
        OutputFormatArg::Json => {
            println!("{}", to_json(&loaded).context("serialize table")?);
        }
    }

    if args.reader.remember_encoding {
        remember_encoding(settings, loaded.encoding, config);
    }
    Ok(())
}

fn load_request(args: &ReaderArgs, settings: &Settings) -> LoadRequest {
    settings.reader.load_request(
        &args.file,
        args.encoding,
        args.delimiter,
        args.strict_encoding,
    )
}

/// Runs the load on a worker thread and waits for its single update.
fn load_in_background(request: LoadRequest) -> Result<LoadedTable> {
    let span = info_span!("load", path = %request.path.display());
    let _guard = span.enter();

    let (sender, receiver) = mpsc::channel();
    let handle = spawn_load(request, sender);
    let update = receiver
        .recv()
        .context("loader thread exited without a result")?;
    handle
        .join()
        .map_err(|_| anyhow!("loader thread panicked"))?;

    match update {
        LoadUpdate::Loaded(loaded) => {
            info!(
                rows = loaded.rows.len(),
                detected = %short_label(loaded.encoding, loaded.delimiter),
                "loaded"
            );
            Ok(loaded)
        }
        LoadUpdate::Failed(message) => Err(anyhow!(message)),
    }
}

fn remember_encoding(settings: &Settings, encoding: SourceEncoding, config: Option<&Path>) {
    let mut updated = settings.clone();
    updated.reader.encoding = Some(encoding.label().to_string());
    if let Err(error) = save_settings(&updated, config) {
        warn!("Could not remember encoding: {}", error);
    }
}
