//! Terminal rendering for loaded tables and detection results.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use csvview_ingest::{Delimiter, Detection, LoadedTable, SourceEncoding};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Builds the header/row grid of a loaded table.
pub fn table_view(loaded: &LoadedTable) -> Table {
    let mut table = Table::new();
    table.set_header(loaded.headers.iter().map(|name| header_cell(name)));
    apply_table_style(&mut table);
    for row in &loaded.rows {
        table.add_row(row.iter().map(|value| value_cell(value)));
    }
    table
}

/// Key/value lines describing how a file was read.
pub fn detection_summary(detection: &Detection) -> String {
    let mut encoding = detection.encoding.label().to_string();
    if detection.encoding_fallback {
        encoding.push_str(" (fallback, undecodable bytes replaced)");
    }
    format_summary(&encoding, detection.delimiter, detection.had_sep_directive)
}

/// Footer printed under a rendered table.
pub fn loaded_summary(loaded: &LoadedTable) -> String {
    let mut summary = format!("Rows:          {}\n", loaded.rows.len());
    summary.push_str(&format_summary(
        loaded.encoding.label(),
        loaded.delimiter,
        loaded.had_sep_directive,
    ));
    summary
}

pub fn to_json(loaded: &LoadedTable) -> serde_json::Result<String> {
    serde_json::to_string_pretty(loaded)
}

/// One-line label, e.g. `cp1251 / ;`.
pub fn short_label(encoding: SourceEncoding, delimiter: Delimiter) -> String {
    format!("{} / {}", encoding.label(), delimiter.escaped())
}

fn format_summary(encoding: &str, delimiter: Delimiter, had_sep_directive: bool) -> String {
    format!(
        "Encoding:      {encoding}\nDelimiter:     {}\nSep directive: {}",
        delimiter.escaped(),
        if had_sep_directive { "yes" } else { "no" }
    )
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn value_cell(value: &str) -> Cell {
    if value.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(value)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
