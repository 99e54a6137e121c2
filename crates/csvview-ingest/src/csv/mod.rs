//! CSV reading utilities.

mod header;
mod reader;
mod table;

pub use header::Header;
pub use reader::{CsvReader, Detection, ReaderConfig};
pub use table::{CsvTable, Record};
