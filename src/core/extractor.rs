//! Block extraction and normalization
//!
//! Each located span is melted into `(label, month, quantity)` rows, zero
//! quantities and footer lines are dropped, labels are abbreviated and the
//! rows are tagged with the span's subgroup and professional role.

use crate::core::labels::{is_footer, LabelCleaner};
use crate::core::locator::{SectionIndex, SectionLocator};
use crate::core::melt::melt;
use crate::error::{StatError, StatResult};
use crate::types::{
    Cell, Month, NormalizedRecord, NormalizedTable, RawGrid, Span, GRID_WIDTH,
};
use tracing::{debug, info};

/// Coerce a quantity cell to a whole number.
///
/// Fractions truncate toward zero; text is parsed after trimming; anything
/// that does not parse, and every negative value, counts as 0.
pub fn coerce_quantity(cell: &Cell) -> u64 {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Cell::Bool(true) => 1.0,
        Cell::Bool(false) | Cell::Empty => 0.0,
    };

    if value.is_finite() && value >= 1.0 {
        value.trunc() as u64
    } else {
        0
    }
}

/// Spreadsheet → normalized table pipeline
pub struct Normalizer {
    locator: SectionLocator,
    cleaner: LabelCleaner,
}

impl Normalizer {
    pub fn new() -> StatResult<Self> {
        Ok(Self {
            locator: SectionLocator::new()?,
            cleaner: LabelCleaner::new()?,
        })
    }

    /// Locate the four sections without extracting anything
    pub fn locate(&self, grid: &RawGrid) -> SectionIndex {
        self.locator.locate(grid)
    }

    /// Run the whole transformation. Either every span is extracted or an
    /// error is returned; no partial table escapes.
    pub fn normalize(&self, grid: &RawGrid) -> StatResult<NormalizedTable> {
        if grid.width() < GRID_WIDTH {
            return Err(StatError::ColumnCount {
                found: grid.width(),
                expected: GRID_WIDTH,
            });
        }

        let spans = self.locate(grid).spans()?;

        let mut records = Vec::new();
        for span in &spans {
            let block = self.extract_span(grid, span);
            debug!(
                section = %span.section,
                start = span.start_row,
                end = span.end_row,
                records = block.len(),
                "span extracted"
            );
            records.extend(block);
        }

        info!(
            rows = grid.len(),
            records = records.len(),
            "spreadsheet normalized"
        );
        Ok(NormalizedTable::new(records))
    }

    /// Reshape one span into records, in month-major order
    pub fn extract_span(&self, grid: &RawGrid, span: &Span) -> Vec<NormalizedRecord> {
        let end = span.end_row.min(grid.len());
        let start = span.start_row.min(end);
        let rows = &grid.rows()[start..end];

        let month_columns: Vec<(usize, Month)> =
            Month::ALL.iter().map(|m| (m.column(), *m)).collect();
        let subgroup = span.section.subgroup();
        let professional = span.section.professional();

        melt(rows, 0, &month_columns)
            .into_iter()
            .filter_map(|cell| {
                let quantity = cell.value.as_ref().map(coerce_quantity).unwrap_or(0);
                if quantity == 0 {
                    return None;
                }

                let original = cell.id.to_string();
                if is_footer(&original) {
                    return None;
                }

                Some(NormalizedRecord::new(
                    self.cleaner.clean(&original),
                    original,
                    cell.variable,
                    quantity,
                    subgroup,
                    professional,
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Professional, Section, Subgroup};
    use pretty_assertions::assert_eq;

    fn row(label: &str, values: &[f64]) -> Vec<Cell> {
        let mut cells = vec![Cell::from(label)];
        cells.extend(values.iter().map(|v| Cell::Number(*v)));
        cells.resize(GRID_WIDTH, Cell::Number(0.0));
        cells
    }

    fn title(label: &str) -> Vec<Cell> {
        let mut cells = vec![Cell::from(label)];
        cells.resize(GRID_WIDTH, Cell::Empty);
        cells
    }

    fn sheet() -> RawGrid {
        let mut first = row("TOTAL DE PACIENTES AMBULATORIAL", &[5.0, 3.0]);
        first[12] = Cell::Number(0.0);
        let rows = vec![
            title("ESTATÍSTICA DA QUIMIOTERAPIA – PROCEDIMENTOS"),
            first,
            row("PACIENTES DE PRIMEIRA VEZ", &[2.0]),
            title("SESSÕES REALIZADAS NA QUIMIOTERAPIA"),
            row("QUIMIOTERAPIA ORAL", &[7.0]),
            row("TOTAL DE SESSÕES REALIZADAS", &[7.0]),
            title("PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL ENFERMEIRO"),
            row("QUANTIDADE DE CURATIVOS", &[0.0, 4.0]),
            title("PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL TÉCNICO DE ENFERMAGEM"),
            row("INJEÇÃO SUBCUTÂNEA", &[1.0]),
            row("TOTAL GERAL TECNICO", &[1.0]),
            row("RODAPÉ FORA DO BLOCO", &[99.0]),
        ];
        RawGrid::from_rows(rows, GRID_WIDTH)
    }

    #[test]
    fn test_coerce_quantity() {
        assert_eq!(coerce_quantity(&Cell::Number(5.0)), 5);
        assert_eq!(coerce_quantity(&Cell::Number(5.9)), 5);
        assert_eq!(coerce_quantity(&Cell::Number(0.4)), 0);
        assert_eq!(coerce_quantity(&Cell::Number(-3.0)), 0);
        assert_eq!(coerce_quantity(&Cell::Number(f64::NAN)), 0);
        assert_eq!(coerce_quantity(&Cell::from(" 12 ")), 12);
        assert_eq!(coerce_quantity(&Cell::from("7.8")), 7);
        assert_eq!(coerce_quantity(&Cell::from("n/d")), 0);
        assert_eq!(coerce_quantity(&Cell::from("")), 0);
        assert_eq!(coerce_quantity(&Cell::Empty), 0);
        assert_eq!(coerce_quantity(&Cell::Bool(true)), 1);
    }

    #[test]
    fn test_normalize_sheet() {
        let table = Normalizer::new().unwrap().normalize(&sheet()).unwrap();

        let summary: Vec<(&str, Month, u64, Subgroup, Professional)> = table
            .iter()
            .map(|r| (r.procedure.as_str(), r.month, r.quantity, r.subgroup, r.professional))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("TOTAL DE PACIENTES AMBULATORIAL", Month::Jan, 5, Subgroup::GeneralStatistics, Professional::NotApplicable),
                ("PACIENTES DE PRIMEIRA VEZ", Month::Jan, 2, Subgroup::GeneralStatistics, Professional::NotApplicable),
                ("TOTAL DE PACIENTES AMBULATORIAL", Month::Fev, 3, Subgroup::GeneralStatistics, Professional::NotApplicable),
                ("QT ORAL", Month::Jan, 7, Subgroup::SessionsPerformed, Professional::NotApplicable),
                ("Qtd. CURATIVOS", Month::Fev, 4, Subgroup::Production, Professional::Nurse),
                ("Inj. SUBCUTÂNEA", Month::Jan, 1, Subgroup::Production, Professional::NursingTechnician),
            ]
        );
    }

    #[test]
    fn test_original_label_is_preserved() {
        let table = Normalizer::new().unwrap().normalize(&sheet()).unwrap();
        let curativos = table
            .iter()
            .find(|r| r.procedure == "Qtd. CURATIVOS")
            .unwrap();
        assert_eq!(curativos.original_procedure, "QUANTIDADE DE CURATIVOS");
    }

    #[test]
    fn test_footer_rows_never_leak() {
        let table = Normalizer::new().unwrap().normalize(&sheet()).unwrap();
        assert!(table.iter().all(|r| !is_footer(&r.original_procedure)));
        assert!(table.iter().all(|r| r.quantity > 0));
        assert!(table.iter().all(|r| r.original_procedure != "RODAPÉ FORA DO BLOCO"));
    }

    #[test]
    fn test_narrow_grid_fails() {
        let grid = RawGrid::from_rows(vec![vec![Cell::from("x"), Cell::Number(1.0)]], GRID_WIDTH);
        let err = Normalizer::new().unwrap().normalize(&grid).unwrap_err();
        assert!(matches!(
            err,
            StatError::ColumnCount {
                found: 2,
                expected: 13
            }
        ));
    }

    #[test]
    fn test_extract_empty_span() {
        let normalizer = Normalizer::new().unwrap();
        let span = Span {
            section: Section::G2,
            start_row: 4,
            end_row: 4,
        };
        assert!(normalizer.extract_span(&sheet(), &span).is_empty());
    }

    #[test]
    fn test_span_bounds_clamped_to_grid() {
        let normalizer = Normalizer::new().unwrap();
        let span = Span {
            section: Section::G4,
            start_row: 11,
            end_row: 50,
        };
        let records = normalizer.extract_span(&sheet(), &span);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].quantity, 99);
        assert_eq!(records[0].professional, Professional::NursingTechnician);
    }
}
