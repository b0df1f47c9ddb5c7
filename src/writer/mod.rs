//! Table serialization: audit CSV, JSON, YAML and .xlsx

use crate::error::{StatError, StatResult};
use crate::excel::TableExporter;
use crate::types::{NormalizedRecord, NormalizedTable};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Output formats for the normalized table
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    Yaml,
    Xlsx,
}

impl OutputFormat {
    /// Infer the format from the output file extension
    pub fn from_path(path: &Path) -> StatResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "xlsx" => Ok(OutputFormat::Xlsx),
            _ => Err(StatError::Validation(format!(
                "Cannot infer output format from '{}' (use .csv, .json, .yaml or .xlsx, or pass --format)",
                path.display()
            ))),
        }
    }
}

/// UTF-8 CSV with a header row of the seven field names
pub fn to_csv(table: &NormalizedTable) -> StatResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in table {
        writer.serialize(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| StatError::Export(format!("Failed to flush CSV: {}", e)))
}

/// Read back an audit CSV produced by [`to_csv`]
pub fn read_csv<R: Read>(reader: R) -> StatResult<NormalizedTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let records = reader
        .deserialize::<NormalizedRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(NormalizedTable::new(records))
}

pub fn to_json(table: &NormalizedTable) -> StatResult<String> {
    Ok(serde_json::to_string_pretty(table)?)
}

pub fn to_yaml(table: &NormalizedTable) -> StatResult<String> {
    Ok(serde_yaml::to_string(table)?)
}

/// Serialize `table` to `path` in `format`
pub fn write_table(table: &NormalizedTable, path: &Path, format: OutputFormat) -> StatResult<()> {
    match format {
        OutputFormat::Csv => fs::write(path, to_csv(table)?)?,
        OutputFormat::Json => fs::write(path, to_json(table)?)?,
        OutputFormat::Yaml => fs::write(path, to_yaml(table)?)?,
        OutputFormat::Xlsx => TableExporter::new(table).export(path)?,
    }
    Ok(())
}
