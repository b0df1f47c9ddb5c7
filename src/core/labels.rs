//! Procedure label rules: abbreviation table and footer detection

use crate::error::{StatError, StatResult};
use regex::Regex;

/// Abbreviations applied in this exact order. "QUANTIDADE DE" must run before
/// "QUANTIDADE", otherwise a stray "DE" is left behind.
pub const ABBREVIATIONS: &[(&str, &str)] = &[
    ("QUANTIDADE DE", "Qtd."),
    ("QUANTIDADE", "Qtd."),
    ("INJEÇÕES", "Inj."),
    ("INJEÇÃO", "Inj."),
    ("QUIMIOTERAPIA", "QT"),
];

/// Block summary lines. They carry non-zero totals and must never reach the table.
pub const FOOTER_MARKERS: &[&str] = &[
    "total de procedimentos",
    "sessões realizadas",
    "procedimentos realizados",
];

/// True when the raw label is a block footer (case-insensitive containment)
pub fn is_footer(raw_label: &str) -> bool {
    let lowered = raw_label.to_lowercase();
    FOOTER_MARKERS.iter().any(|marker| lowered.contains(marker))
}

/// Compiled abbreviation rules
pub struct LabelCleaner {
    rules: Vec<(Regex, &'static str)>,
}

impl LabelCleaner {
    pub fn new() -> StatResult<Self> {
        let rules = ABBREVIATIONS
            .iter()
            .map(|(pattern, replacement)| {
                let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(pattern)))
                    .map_err(|e| StatError::Validation(format!("Regex error: {}", e)))?;
                Ok((re, *replacement))
            })
            .collect::<StatResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Trim and abbreviate a raw label. Applying it twice changes nothing.
    pub fn clean(&self, raw_label: &str) -> String {
        let mut label = raw_label.trim().to_string();
        for (re, replacement) in &self.rules {
            if re.is_match(&label) {
                label = re.replace_all(&label, *replacement).into_owned();
            }
        }
        label
    }
}
