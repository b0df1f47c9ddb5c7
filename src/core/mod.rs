//! Spreadsheet → table transformation and the indicators built on it

pub mod extractor;
pub mod indicators;
pub mod labels;
pub mod locator;
pub mod melt;

pub use extractor::{coerce_quantity, Normalizer};
pub use indicators::{all_indicators, monthly_indicators, MonthlyIndicators};
pub use labels::LabelCleaner;
pub use locator::{SectionIndex, SectionLocator};
