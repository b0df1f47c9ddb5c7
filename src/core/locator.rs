//! Section locator
//!
//! Finds the four block titles in column A of a [`RawGrid`] and derives the
//! row spans each block occupies. Title matching is case-insensitive substring
//! containment with whitespace runs collapsed, so `"ESTATÍSTICA DA
//! QUIMIOTERAPIA –  PROCEDIMENTOS"` (two spaces) and the single-space form
//! both match.

use crate::error::{StatError, StatResult};
use crate::types::{RawGrid, Section, SectionMarker, Span};
use regex::Regex;
use tracing::debug;

/// Closing row of the technician block ("TOTAL GERAL TECNICO" and similar)
const TECHNICIAN_FOOTER_PATTERN: &str = r"(?i)TOTAL.*TECNICO";

/// Upper-case, trim and collapse whitespace runs to one space
pub fn normalize_title(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Section markers found in one scan of the grid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionIndex {
    rows: [Option<usize>; 4],
    grid_len: usize,
    footer_row: Option<usize>,
}

impl SectionIndex {
    /// Row index of `section`, if its title was found
    pub fn row(&self, section: Section) -> Option<usize> {
        self.rows[section as usize]
    }

    /// All markers found so far, in section order
    pub fn markers(&self) -> Vec<SectionMarker> {
        Section::ALL
            .into_iter()
            .filter_map(|section| {
                self.row(section)
                    .map(|row_index| SectionMarker { section, row_index })
            })
            .collect()
    }

    /// Row of the technician footer, when one exists after G4
    pub fn footer_row(&self) -> Option<usize> {
        self.footer_row
    }

    fn require(&self, section: Section) -> StatResult<usize> {
        self.row(section)
            .ok_or(StatError::MissingSection { section })
    }

    /// Derive the four data spans. Fails on the first missing section or when
    /// titles are not in ascending G1..G4 order.
    pub fn spans(&self) -> StatResult<[Span; 4]> {
        let rows = [
            self.require(Section::G1)?,
            self.require(Section::G2)?,
            self.require(Section::G3)?,
            self.require(Section::G4)?,
        ];

        for pair in Section::ALL.windows(2) {
            let (earlier, later) = (pair[0], pair[1]);
            let (earlier_row, later_row) = (rows[earlier as usize], rows[later as usize]);
            if earlier_row >= later_row {
                return Err(StatError::SectionOrder {
                    earlier,
                    earlier_row,
                    later,
                    later_row,
                });
            }
        }

        let tail_end = self.footer_row.unwrap_or(self.grid_len);

        Ok([
            Span {
                section: Section::G1,
                start_row: rows[0] + 1,
                end_row: rows[1],
            },
            Span {
                section: Section::G2,
                start_row: rows[1] + 1,
                end_row: rows[2],
            },
            Span {
                section: Section::G3,
                start_row: rows[2] + 1,
                end_row: rows[3],
            },
            Span {
                section: Section::G4,
                start_row: rows[3] + 1,
                end_row: tail_end,
            },
        ])
    }
}

/// Column-A scanner with the title table and footer pattern compiled once
pub struct SectionLocator {
    titles: Vec<(Section, String)>,
    footer: Regex,
}

impl SectionLocator {
    pub fn new() -> StatResult<Self> {
        let titles = Section::ALL
            .into_iter()
            .map(|section| (section, normalize_title(section.title())))
            .collect();
        let footer = Regex::new(TECHNICIAN_FOOTER_PATTERN)
            .map_err(|e| StatError::Validation(format!("Regex error: {}", e)))?;

        Ok(Self { titles, footer })
    }

    /// Section whose title fragment appears in `label`. A label matching more
    /// than one fragment goes to the first in G1..G4 order.
    pub fn classify(&self, label: &str) -> Option<Section> {
        let normalized = normalize_title(label);
        self.titles
            .iter()
            .find(|(_, title)| normalized.contains(title.as_str()))
            .map(|(section, _)| *section)
    }

    /// Single pass over column A. The first row matching a title wins; later
    /// repeats of the same title are ignored.
    pub fn locate(&self, grid: &RawGrid) -> SectionIndex {
        let mut index = SectionIndex {
            grid_len: grid.len(),
            ..SectionIndex::default()
        };

        for row in 0..grid.len() {
            if let Some(section) = self.classify(&grid.label(row)) {
                let slot = &mut index.rows[section as usize];
                if slot.is_none() {
                    debug!(%section, row, "section title found");
                    *slot = Some(row);
                }
            }
        }

        if let Some(g4) = index.row(Section::G4) {
            index.footer_row = (g4 + 1..grid.len()).find(|&row| self.footer.is_match(&grid.label(row)));
            match index.footer_row {
                Some(row) => debug!(row, "technician footer found"),
                None => debug!("no technician footer, last block runs to end of sheet"),
            }
        }

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cell, GRID_WIDTH};

    fn grid(labels: &[&str]) -> RawGrid {
        RawGrid::from_rows(
            labels
                .iter()
                .map(|l| {
                    let mut row = vec![Cell::from(*l)];
                    row.resize(GRID_WIDTH, Cell::Empty);
                    row
                })
                .collect(),
            GRID_WIDTH,
        )
    }

    fn full_sheet() -> Vec<&'static str> {
        vec![
            "ESTATÍSTICA DA QUIMIOTERAPIA –  PROCEDIMENTOS",
            "PACIENTES",
            "SESSÕES REALIZADAS NA QUIMIOTERAPIA",
            "ORAL",
            "PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL ENFERMEIRO",
            "CURATIVO",
            "PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL TÉCNICO DE ENFERMAGEM",
            "PUNÇÃO",
            "TOTAL GERAL TECNICO",
            "NOTAS",
        ]
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("  sessões   realizadas\tna "), "SESSÕES REALIZADAS NA");
    }

    #[test]
    fn test_locate_all_sections() {
        let locator = SectionLocator::new().unwrap();
        let index = locator.locate(&grid(&full_sheet()));

        assert_eq!(index.row(Section::G1), Some(0));
        assert_eq!(index.row(Section::G2), Some(2));
        assert_eq!(index.row(Section::G3), Some(4));
        assert_eq!(index.row(Section::G4), Some(6));
        assert_eq!(index.footer_row(), Some(8));
        assert_eq!(index.markers().len(), 4);
    }

    #[test]
    fn test_spans_from_markers() {
        let locator = SectionLocator::new().unwrap();
        let spans = locator.locate(&grid(&full_sheet())).spans().unwrap();

        let ranges: Vec<(usize, usize)> = spans.iter().map(|s| (s.start_row, s.end_row)).collect();
        assert_eq!(ranges, vec![(1, 2), (3, 4), (5, 6), (7, 8)]);
        assert_eq!(spans[3].section, Section::G4);
    }

    #[test]
    fn test_single_space_title_matches() {
        let locator = SectionLocator::new().unwrap();
        assert_eq!(
            locator.classify("ESTATÍSTICA DA QUIMIOTERAPIA – PROCEDIMENTOS"),
            Some(Section::G1)
        );
        assert_eq!(
            locator.classify("estatística da quimioterapia – procedimentos 2025"),
            Some(Section::G1)
        );
    }

    #[test]
    fn test_first_match_wins() {
        let mut labels = full_sheet();
        labels.push("SESSÕES REALIZADAS NA QUIMIOTERAPIA");
        let locator = SectionLocator::new().unwrap();
        let index = locator.locate(&grid(&labels));
        assert_eq!(index.row(Section::G2), Some(2));
    }

    #[test]
    fn test_missing_footer_extends_to_end() {
        let labels: Vec<&str> = full_sheet()
            .into_iter()
            .filter(|l| !l.starts_with("TOTAL"))
            .collect();
        let locator = SectionLocator::new().unwrap();
        let index = locator.locate(&grid(&labels));
        assert_eq!(index.footer_row(), None);

        let spans = index.spans().unwrap();
        assert_eq!(spans[3].end_row, labels.len());
    }

    #[test]
    fn test_footer_before_g4_is_ignored() {
        let mut labels = vec!["TOTAL TECNICO ANTIGO"];
        labels.extend(full_sheet());
        let locator = SectionLocator::new().unwrap();
        let index = locator.locate(&grid(&labels));
        assert_eq!(index.footer_row(), Some(9));
    }

    #[test]
    fn test_missing_section_is_reported() {
        let labels: Vec<&str> = full_sheet()
            .into_iter()
            .filter(|l| !l.starts_with("SESSÕES"))
            .collect();
        let locator = SectionLocator::new().unwrap();
        let err = locator.locate(&grid(&labels)).spans().unwrap_err();

        match err {
            StatError::MissingSection { section } => assert_eq!(section, Section::G2),
            other => panic!("Expected MissingSection, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_order_sections_fail() {
        let labels = vec![
            "SESSÕES REALIZADAS NA QUIMIOTERAPIA",
            "ESTATÍSTICA DA QUIMIOTERAPIA – PROCEDIMENTOS",
            "PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL ENFERMEIRO",
            "PROCEDIMENTOS REALIZADOS PELOS PROFISSIONAL TÉCNICO DE ENFERMAGEM",
        ];
        let locator = SectionLocator::new().unwrap();
        let err = locator.locate(&grid(&labels)).spans().unwrap_err();

        match err {
            StatError::SectionOrder { earlier, later, .. } => {
                assert_eq!(earlier, Section::G1);
                assert_eq!(later, Section::G2);
            }
            other => panic!("Expected SectionOrder, got {other:?}"),
        }
    }

    #[test]
    fn test_numeric_cells_never_match() {
        let rows = vec![vec![Cell::Number(42.0); GRID_WIDTH]];
        let locator = SectionLocator::new().unwrap();
        let index = locator.locate(&RawGrid::from_rows(rows, GRID_WIDTH));
        assert!(index.markers().is_empty());
    }
}
