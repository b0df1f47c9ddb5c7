//! oncostat - chemotherapy unit statistics normalizer
//!
//! Reads the unit's monthly statistics spreadsheet (a header-less grid with
//! four titled blocks and one column per month), reshapes it into a flat
//! table with one row per procedure and month, and derives the monthly
//! management indicators from that table.
//!
//! # Features
//!
//! - CSV, .xlsx, .xls, .xlsb and .ods input
//! - Section detection by title text, tolerant of extra spaces and case
//! - Wide-to-long reshape with label abbreviation and footer filtering
//! - Monthly indicators and a narrative report
//! - Audit export as CSV, JSON, YAML or .xlsx
//!
//! # Example
//!
//! ```no_run
//! use oncostat::normalize_file;
//! use oncostat::core::all_indicators;
//!
//! let table = normalize_file("quimio_2025.xlsx")?;
//! println!("Records: {}", table.len());
//!
//! for month in all_indicators(&table) {
//!     println!("{}: {} actions", month.month, month.production);
//! }
//! # Ok::<(), oncostat::error::StatError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod report;
pub mod types;
pub mod writer;

use std::path::Path;

// Re-export commonly used types
pub use error::{StatError, StatResult};
pub use types::{
    Cell, Month, NormalizedRecord, NormalizedTable, Professional, RawGrid, Section, Subgroup,
};

/// Load and normalize a spreadsheet file
pub fn normalize_file<P: AsRef<Path>>(path: P) -> StatResult<NormalizedTable> {
    let grid = excel::GridImporter::new(path).import()?;
    core::Normalizer::new()?.normalize(&grid)
}

/// Load and normalize an in-memory upload; `name` supplies the extension
pub fn normalize_bytes(bytes: &[u8], name: &str) -> StatResult<NormalizedTable> {
    let grid = excel::GridImporter::from_bytes(bytes, name)?;
    core::Normalizer::new()?.normalize(&grid)
}
