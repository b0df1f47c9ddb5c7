//! Excel exporter - normalized table → .xlsx

use crate::core::indicators::{all_indicators, MonthlyIndicators};
use crate::error::{StatError, StatResult};
use crate::types::{NormalizedRecord, NormalizedTable};
use rust_xlsxwriter::{Format, Note, Workbook, Worksheet};
use std::path::Path;

/// Column headers of the "Base" worksheet, in audit CSV order
pub const TABLE_HEADERS: [&str; 7] = [
    "Procedimento",
    "Mes",
    "Quantidade",
    "Procedimento_Original",
    "Subgrupo",
    "Profissional",
    "Procedimento_Curto",
];

const INDICATOR_HEADERS: [&str; 10] = [
    "Mes",
    "Producao",
    "Pacientes",
    "Pacientes_Novos",
    "Intercorrencias",
    "Puncoes",
    "Complexidade_Pct",
    "Eventos_por_1000",
    "Acoes_por_Paciente",
    "Previsao_Agulhas",
];

fn export_err(what: &str) -> impl Fn(rust_xlsxwriter::XlsxError) -> StatError + '_ {
    move |e| StatError::Export(format!("Failed to write {}: {}", what, e))
}

/// Writes the table ("Base") and the monthly indicators ("Indicadores")
pub struct TableExporter<'a> {
    table: &'a NormalizedTable,
}

impl<'a> TableExporter<'a> {
    pub fn new(table: &'a NormalizedTable) -> Self {
        Self { table }
    }

    /// Export to an .xlsx file
    pub fn export(&self, output_path: &Path) -> StatResult<()> {
        let mut workbook = self.build()?;
        workbook
            .save(output_path)
            .map_err(|e| StatError::Export(format!("Failed to save Excel file: {}", e)))
    }

    /// Export to an in-memory .xlsx
    pub fn to_bytes(&self) -> StatResult<Vec<u8>> {
        let mut workbook = self.build()?;
        workbook
            .save_to_buffer()
            .map_err(|e| StatError::Export(format!("Failed to build Excel file: {}", e)))
    }

    fn build(&self) -> StatResult<Workbook> {
        let mut workbook = Workbook::new();
        let header = Format::new().set_bold();

        let base = workbook.add_worksheet();
        base.set_name("Base").map_err(export_err("worksheet name"))?;
        Self::write_records(base, self.table.records(), &header)?;

        let indicators = all_indicators(self.table);
        let sheet = workbook.add_worksheet();
        sheet
            .set_name("Indicadores")
            .map_err(export_err("worksheet name"))?;
        Self::write_indicators(sheet, &indicators, &header)?;

        Ok(workbook)
    }

    fn write_records(
        worksheet: &mut Worksheet,
        records: &[NormalizedRecord],
        header: &Format,
    ) -> StatResult<()> {
        for (col, name) in TABLE_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *name, header)
                .map_err(export_err("header"))?;
        }

        let note = Note::new("Rótulo exatamente como na planilha de origem").set_author("oncostat");
        worksheet
            .insert_note(0, 3, &note)
            .map_err(export_err("note"))?;

        for (idx, record) in records.iter().enumerate() {
            let row = (idx + 1) as u32;
            worksheet
                .write_string(row, 0, &record.procedure)
                .and_then(|ws| ws.write_string(row, 1, record.month.code()))
                .and_then(|ws| ws.write_number(row, 2, record.quantity as f64))
                .and_then(|ws| ws.write_string(row, 3, &record.original_procedure))
                .and_then(|ws| ws.write_string(row, 4, record.subgroup.label()))
                .and_then(|ws| ws.write_string(row, 5, record.professional.label()))
                .and_then(|ws| ws.write_string(row, 6, &record.short_procedure))
                .map_err(export_err("record"))?;
        }

        worksheet.autofit();
        Ok(())
    }

    fn write_indicators(
        worksheet: &mut Worksheet,
        indicators: &[MonthlyIndicators],
        header: &Format,
    ) -> StatResult<()> {
        for (col, name) in INDICATOR_HEADERS.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col as u16, *name, header)
                .map_err(export_err("header"))?;
        }

        for (idx, ind) in indicators.iter().enumerate() {
            let row = (idx + 1) as u32;
            worksheet
                .write_string(row, 0, ind.month.code())
                .and_then(|ws| ws.write_number(row, 1, ind.production as f64))
                .and_then(|ws| ws.write_number(row, 2, ind.patients as f64))
                .and_then(|ws| ws.write_number(row, 3, ind.new_patients as f64))
                .and_then(|ws| ws.write_number(row, 4, ind.adverse_events as f64))
                .and_then(|ws| ws.write_number(row, 5, ind.punctures as f64))
                .and_then(|ws| ws.write_number(row, 6, ind.complexity_change))
                .and_then(|ws| ws.write_number(row, 7, ind.event_rate))
                .and_then(|ws| ws.write_number(row, 8, ind.intensity))
                .and_then(|ws| ws.write_number(row, 9, ind.supply_forecast as f64))
                .map_err(export_err("indicator"))?;
        }

        worksheet.autofit();
        Ok(())
    }
}
