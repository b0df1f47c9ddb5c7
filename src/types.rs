use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label column + 12 month columns
pub const GRID_WIDTH: usize = 13;

/// Maximum length of `Procedimento_Curto` before the ellipsis
pub const SHORT_LABEL_LEN: usize = 35;

const ELLIPSIS: &str = "...";

//==============================================================================
// Raw grid
//==============================================================================

/// A single cell of the header-less source grid
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<i64> for Cell {
    fn from(n: i64) -> Self {
        Cell::Number(n as f64)
    }
}

/// Header-less grid as read from the upload. Row 0 is data.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl RawGrid {
    /// Build a grid, padding short rows with `Cell::Empty` and dropping
    /// every column past `max_columns`.
    pub fn from_rows(rows: Vec<Vec<Cell>>, max_columns: usize) -> Self {
        let width = rows
            .iter()
            .map(|row| row.len())
            .max()
            .unwrap_or(0)
            .min(max_columns);

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.truncate(width);
                row.resize(width, Cell::Empty);
                row
            })
            .collect();

        Self { rows, width }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Column A of `row`, stringified (empty cells yield "")
    pub fn label(&self, row: usize) -> String {
        self.get(row, 0).map(Cell::to_string).unwrap_or_default()
    }
}

//==============================================================================
// Months
//==============================================================================

/// Month column codes, in the positional order of columns 1..=12
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Month {
    #[serde(rename = "JAN.")]
    Jan,
    #[serde(rename = "FEV.")]
    Fev,
    #[serde(rename = "MAR.")]
    Mar,
    #[serde(rename = "ABR.")]
    Abr,
    #[serde(rename = "MAI.")]
    Mai,
    #[serde(rename = "JUN.")]
    Jun,
    #[serde(rename = "JUL.")]
    Jul,
    #[serde(rename = "AGO.")]
    Ago,
    #[serde(rename = "SET.")]
    Set,
    #[serde(rename = "OUT.")]
    Out,
    #[serde(rename = "NOV.")]
    Nov,
    #[serde(rename = "DEZ.")]
    Dez,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Jan,
        Month::Fev,
        Month::Mar,
        Month::Abr,
        Month::Mai,
        Month::Jun,
        Month::Jul,
        Month::Ago,
        Month::Set,
        Month::Out,
        Month::Nov,
        Month::Dez,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Month::Jan => "JAN.",
            Month::Fev => "FEV.",
            Month::Mar => "MAR.",
            Month::Abr => "ABR.",
            Month::Mai => "MAI.",
            Month::Jun => "JUN.",
            Month::Jul => "JUL.",
            Month::Ago => "AGO.",
            Month::Set => "SET.",
            Month::Out => "OUT.",
            Month::Nov => "NOV.",
            Month::Dez => "DEZ.",
        }
    }

    /// Grid column holding this month's quantities
    pub fn column(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Month {
    type Err = String;

    /// Accepts the code with or without the trailing dot, any case ("jan", "JAN.")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_end_matches('.').to_uppercase();
        Month::ALL
            .into_iter()
            .find(|m| m.code().trim_end_matches('.') == wanted)
            .ok_or_else(|| format!("Unknown month '{}' (expected JAN. .. DEZ.)", s))
    }
}

//==============================================================================
// Sections, subgroups and roles
//==============================================================================

/// Record origin block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Subgroup {
    #[serde(rename = "Estatísticas Gerais")]
    GeneralStatistics,
    #[serde(rename = "Sessões Realizadas")]
    SessionsPerformed,
    #[serde(rename = "Produção")]
    Production,
}

impl Subgroup {
    pub fn label(self) -> &'static str {
        match self {
            Subgroup::GeneralStatistics => "Estatísticas Gerais",
            Subgroup::SessionsPerformed => "Sessões Realizadas",
            Subgroup::Production => "Produção",
        }
    }
}

impl fmt::Display for Subgroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Staff role attached to production records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Professional {
    #[serde(rename = "Enfermeiro")]
    Nurse,
    #[serde(rename = "Técnico de Enfermagem")]
    NursingTechnician,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl Professional {
    pub fn label(self) -> &'static str {
        match self {
            Professional::Nurse => "Enfermeiro",
            Professional::NursingTechnician => "Técnico de Enfermagem",
            Professional::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Professional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The four thematic blocks of the statistics sheet, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Section {
    G1,
    G2,
    G3,
    G4,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::G1, Section::G2, Section::G3, Section::G4];

    /// Title fragment searched for in column A
    pub fn title(self) -> &'static str {
        match self {
            Section::G1 => "ESTATÍSTICA DA QUIMIOTERAPIA – PROCEDIMENTOS",
            Section::G2 => "SESSÕES REALIZADAS NA QUIMIOTERAPIA",
            Section::G3 => "PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL ENFERMEIRO",
            Section::G4 => "PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL TÉCNICO DE ENFERMAGEM",
        }
    }

    pub fn subgroup(self) -> Subgroup {
        match self {
            Section::G1 => Subgroup::GeneralStatistics,
            Section::G2 => Subgroup::SessionsPerformed,
            Section::G3 | Section::G4 => Subgroup::Production,
        }
    }

    pub fn professional(self) -> Professional {
        match self {
            Section::G1 | Section::G2 => Professional::NotApplicable,
            Section::G3 => Professional::Nurse,
            Section::G4 => Professional::NursingTechnician,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::G1 => "G1",
            Section::G2 => "G2",
            Section::G3 => "G3",
            Section::G4 => "G4",
        };
        f.write_str(name)
    }
}

/// Row where a section title was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SectionMarker {
    pub section: Section,
    pub row_index: usize,
}

/// Half-open row range `[start_row, end_row)` holding one block's data rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub section: Section,
    pub start_row: usize,
    pub end_row: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end_row.saturating_sub(self.start_row)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//==============================================================================
// Normalized output
//==============================================================================

/// One (procedure, month) observation. Field names and order match the audit CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(rename = "Procedimento")]
    pub procedure: String,
    #[serde(rename = "Mes")]
    pub month: Month,
    #[serde(rename = "Quantidade")]
    pub quantity: u64,
    #[serde(rename = "Procedimento_Original")]
    pub original_procedure: String,
    #[serde(rename = "Subgrupo")]
    pub subgroup: Subgroup,
    #[serde(rename = "Profissional")]
    pub professional: Professional,
    #[serde(rename = "Procedimento_Curto")]
    pub short_procedure: String,
}

impl NormalizedRecord {
    pub fn new(
        procedure: String,
        original_procedure: String,
        month: Month,
        quantity: u64,
        subgroup: Subgroup,
        professional: Professional,
    ) -> Self {
        let short_procedure = shorten_label(&procedure);
        Self {
            procedure,
            month,
            quantity,
            original_procedure,
            subgroup,
            professional,
            short_procedure,
        }
    }
}

/// Truncate to `SHORT_LABEL_LEN` characters, appending "..." when something was cut
pub fn shorten_label(label: &str) -> String {
    if label.chars().count() > SHORT_LABEL_LEN {
        let mut short: String = label.chars().take(SHORT_LABEL_LEN).collect();
        short.push_str(ELLIPSIS);
        short
    } else {
        label.to_string()
    }
}

/// Concatenated records of G1, G2, G3 and G4, in that order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedTable {
    records: Vec<NormalizedRecord>,
}

impl NormalizedTable {
    pub fn new(records: Vec<NormalizedRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[NormalizedRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<NormalizedRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records.iter()
    }

    /// Months with at least one record, in calendar order
    pub fn months(&self) -> Vec<Month> {
        Month::ALL
            .into_iter()
            .filter(|m| self.records.iter().any(|r| r.month == *m))
            .collect()
    }

    pub fn for_month(&self, month: Month) -> impl Iterator<Item = &NormalizedRecord> {
        self.records.iter().filter(move |r| r.month == month)
    }

    pub fn for_subgroup(&self, subgroup: Subgroup) -> impl Iterator<Item = &NormalizedRecord> {
        self.records.iter().filter(move |r| r.subgroup == subgroup)
    }

    pub fn for_professional(
        &self,
        professional: Professional,
    ) -> impl Iterator<Item = &NormalizedRecord> {
        self.records
            .iter()
            .filter(move |r| r.professional == professional)
    }

    /// Records whose original label contains `needle` (case-sensitive, as the sheet is upper-case)
    pub fn matching_original<'a>(
        &'a self,
        needle: &'a str,
    ) -> impl Iterator<Item = &'a NormalizedRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| r.original_procedure.contains(needle))
    }
}

impl IntoIterator for NormalizedTable {
    type Item = NormalizedRecord;
    type IntoIter = std::vec::IntoIter<NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a NormalizedTable {
    type Item = &'a NormalizedRecord;
    type IntoIter = std::slice::Iter<'a, NormalizedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
