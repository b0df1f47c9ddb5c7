//! Spreadsheet input/output
//!
//! - Import: CSV / .xlsx / .xls / .ods → header-less `RawGrid`
//! - Export: normalized table + indicators → .xlsx

mod exporter;
mod importer;

pub use exporter::{TableExporter, TABLE_HEADERS};
pub use importer::{GridImporter, InputFormat};
