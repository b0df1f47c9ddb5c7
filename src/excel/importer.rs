//! Grid importer - CSV / spreadsheet → RawGrid

use crate::error::{StatError, StatResult};
use crate::types::{Cell, RawGrid, GRID_WIDTH};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use encoding_rs::WINDOWS_1252;
use std::borrow::Cow;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reader selected from the file name extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Spreadsheet,
}

impl InputFormat {
    /// Detect the format from a file name or path (case-insensitive extension)
    pub fn from_name(name: &str) -> StatResult<Self> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(InputFormat::Csv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            _ => Err(StatError::UnsupportedFormat(name.to_string())),
        }
    }
}

/// Loads an upload into a header-less grid of at most 13 columns
pub struct GridImporter {
    path: PathBuf,
}

impl GridImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the file once and build the grid
    pub fn import(&self) -> StatResult<RawGrid> {
        let name = self.path.to_string_lossy();
        let format = InputFormat::from_name(&name)?;
        let bytes = fs::read(&self.path)?;
        Self::load(&bytes, format, &name)
    }

    /// Build a grid from an in-memory upload; `name` only supplies the extension
    pub fn from_bytes(bytes: &[u8], name: &str) -> StatResult<RawGrid> {
        let format = InputFormat::from_name(name)?;
        Self::load(bytes, format, name)
    }

    fn load(bytes: &[u8], format: InputFormat, name: &str) -> StatResult<RawGrid> {
        let rows = match format {
            InputFormat::Csv => read_csv(bytes)?,
            InputFormat::Spreadsheet => read_spreadsheet(bytes)?,
        };

        let grid = RawGrid::from_rows(rows, GRID_WIDTH);
        info!(
            file = name,
            ?format,
            rows = grid.len(),
            columns = grid.width(),
            "grid loaded"
        );
        Ok(grid)
    }
}

/// Headerless CSV. Input that is not valid UTF-8 is decoded as Windows-1252,
/// the ANSI code page of spreadsheet exports on Windows (a superset of the
/// printable Latin-1 range).
fn read_csv(bytes: &[u8]) -> StatResult<Vec<Vec<Cell>>> {
    let text: Cow<'_, str> = match std::str::from_utf8(bytes) {
        Ok(s) => Cow::Borrowed(s),
        Err(_) => {
            let (decoded, _, _) = WINDOWS_1252.decode(bytes);
            debug!("CSV is not UTF-8, decoded as windows-1252");
            decoded
        }
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(csv_cell).collect());
    }
    Ok(rows)
}

fn csv_cell(field: &str) -> Cell {
    if field.is_empty() {
        return Cell::Empty;
    }
    match field.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Cell::Number(n),
        _ => Cell::Text(field.to_string()),
    }
}

/// First worksheet, keeping absolute column positions (an empty column A is
/// still column 0)
fn read_spreadsheet(bytes: &[u8]) -> StatResult<Vec<Vec<Cell>>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| StatError::Spreadsheet(format!("Failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| StatError::Spreadsheet("Workbook has no worksheets".to_string()))?
        .map_err(|e| StatError::Spreadsheet(format!("Failed to read first worksheet: {}", e)))?;

    let Some((last_row, last_col)) = range.end() else {
        return Ok(Vec::new());
    };
    let width = (last_col as usize + 1).min(GRID_WIDTH) as u32;

    let rows = (0..=last_row)
        .map(|row| {
            (0..width)
                .map(|col| range.get_value((row, col)).map(data_cell).unwrap_or_default())
                .collect()
        })
        .collect();
    Ok(rows)
}

fn data_cell(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        _ => Cell::Empty,
    }
}
