use crate::types::Section;
use thiserror::Error;

pub type StatResult<T> = Result<T, StatError>;

#[derive(Error, Debug)]
pub enum StatError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Unsupported input format: {0} (expected .csv, .xlsx, .xlsm, .xlsb, .xls or .ods)")]
    UnsupportedFormat(String),

    #[error("Section {section} not found: no row in column A contains \"{}\"", .section.title())]
    MissingSection { section: Section },

    #[error("Sections out of order: {earlier} (row {earlier_row}) must come before {later} (row {later_row})")]
    SectionOrder {
        earlier: Section,
        earlier_row: usize,
        later: Section,
        later_row: usize,
    },

    #[error("Expected at least {expected} columns (label + 12 months), found {found}")]
    ColumnCount { found: usize, expected: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl StatError {
    /// The section a fatal locator error refers to, if any
    pub fn section(&self) -> Option<Section> {
        match self {
            StatError::MissingSection { section } => Some(*section),
            StatError::SectionOrder { later, .. } => Some(*later),
            _ => None,
        }
    }
}
