//! Narrative management report
//!
//! Plain text, ready to be reviewed and signed. Rendering it to PDF is left to
//! whatever document tool the unit uses.

use crate::core::indicators::{monthly_indicators, MonthlyIndicators};
use crate::error::{StatError, StatResult};
use crate::types::{Month, NormalizedTable};
use chrono::{Local, NaiveDate};

const SIGNATURE_LINE_LEN: usize = 50;

/// Render the report for `month`, dated today
pub fn render(table: &NormalizedTable, month: Month) -> StatResult<String> {
    render_dated(table, month, Local::now().date_naive())
}

/// Render the report for `month` with an explicit issue date
pub fn render_dated(table: &NormalizedTable, month: Month, issued: NaiveDate) -> StatResult<String> {
    let indicators = monthly_indicators(table, month).ok_or_else(|| {
        let available: Vec<&str> = table.months().iter().map(|m| m.code()).collect();
        StatError::Validation(format!(
            "No records for month {} (available: {})",
            month,
            if available.is_empty() {
                "none".to_string()
            } else {
                available.join(", ")
            }
        ))
    })?;

    Ok(compose(&indicators, issued))
}

fn compose(ind: &MonthlyIndicators, issued: NaiveDate) -> String {
    let month = ind.month;
    let mut text = String::new();

    text.push_str(&format!("PARECER TECNICO DE ENFERMAGEM ONCOLOGICA - {}\n\n", month));

    text.push_str("1. RESUMO OPERACIONAL:\n");
    text.push_str(&format!(
        "No mes de {}, a unidade registrou o atendimento de {} pacientes. \
         O volume total de procedimentos assistenciais realizados pela equipe de enfermagem \
         somou {} acoes, resultando em um indice de intensidade de {:.1} procedimentos por paciente.\n\n",
        month, ind.patients, ind.production, ind.intensity
    ));

    text.push_str("2. SEGURANCA E QUALIDADE:\n");
    text.push_str(&format!(
        "Foram registrados {} eventos adversos (extravasamentos/derramamentos). \
         Estatisticamente, isso representa uma taxa de {:.2} eventos para cada 1.000 \
         procedimentos realizados. Este indice mantem-se dentro dos padroes de monitoramento da unidade.\n\n",
        ind.adverse_events, ind.event_rate
    ));

    text.push_str("3. COMPLEXIDADE E RECURSOS:\n");
    text.push_str(&format!(
        "Observou-se uma variacao de complexidade de {:+.1}% em relacao ao mes anterior. \
         Com base no volume de puncoes assistenciais, estima-se a necessidade de {} dispositivos \
         de puncao venosa para a manutencao do estoque de seguranca no proximo ciclo.\n\n",
        ind.complexity_change, ind.supply_forecast
    ));

    text.push_str(
        "O presente relatorio baseia-se nos dados estatisticos processados pelo sistema \
         de indicadores Gestao Onco-HOL.\n\n",
    );
    text.push_str(&format!("Emitido em {}\n\n", issued.format("%d/%m/%Y")));
    text.push_str(&"_".repeat(SIGNATURE_LINE_LEN));
    text.push_str("\nResponsavel Tecnica / Gerencia de Enfermagem\n");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NormalizedRecord, Professional, Subgroup};

    fn table() -> NormalizedTable {
        NormalizedTable::new(vec![
            NormalizedRecord::new(
                "TOTAL DE PACIENTES AMBULATORIAL".to_string(),
                "TOTAL DE PACIENTES AMBULATORIAL".to_string(),
                Month::Mar,
                50,
                Subgroup::GeneralStatistics,
                Professional::NotApplicable,
            ),
            NormalizedRecord::new(
                "PUNÇÃO VENOSA".to_string(),
                "PUNÇÃO VENOSA".to_string(),
                Month::Mar,
                100,
                Subgroup::Production,
                Professional::Nurse,
            ),
        ])
    }

    fn issued() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()
    }

    #[test]
    fn test_report_contents() {
        let text = render_dated(&table(), Month::Mar, issued()).unwrap();
        assert!(text.starts_with("PARECER TECNICO DE ENFERMAGEM ONCOLOGICA - MAR."));
        assert!(text.contains("atendimento de 50 pacientes"));
        assert!(text.contains("somou 100 acoes"));
        assert!(text.contains("intensidade de 2.0 procedimentos"));
        assert!(text.contains("Foram registrados 0 eventos adversos"));
        assert!(text.contains("taxa de 0.00 eventos"));
        assert!(text.contains("complexidade de +0.0%"));
        assert!(text.contains("necessidade de 120 dispositivos"));
        assert!(text.contains("Emitido em 02/04/2025"));
    }

    #[test]
    fn test_report_unknown_month() {
        let err = render_dated(&table(), Month::Jan, issued()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("JAN."));
        assert!(msg.contains("available: MAR."));
    }
}
