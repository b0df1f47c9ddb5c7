//! Monthly management indicators derived from the normalized table

use crate::types::{Month, NormalizedRecord, NormalizedTable, Subgroup};
use serde::Serialize;

const OUTPATIENT: &str = "AMBULATORIAL";
const FIRST_VISIT: &str = "PRIMEIRA VEZ";
const ADVERSE_EVENTS: &[&str] = &["extravasamento", "derramamento"];
const PUNCTURES: &[&str] = &["PUNÇÃO", "PUNÇÕES"];

/// Indicators for a single month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyIndicators {
    pub month: Month,
    /// Production actions (nurse + technician)
    pub production: u64,
    /// Patients seen; never 0 so ratios stay defined
    pub patients: u64,
    pub new_patients: u64,
    /// Extravasation and spill events
    pub adverse_events: u64,
    pub punctures: u64,
    /// Production change against the previous month present, in percent
    pub complexity_change: f64,
    /// Adverse events per 1000 production actions
    pub event_rate: f64,
    /// Production actions per patient
    pub intensity: f64,
    /// Venous access devices to stock for the next cycle
    pub supply_forecast: u64,
}

/// Saturating total; a cell can carry any value up to `u64::MAX`
fn sum<'a>(records: impl Iterator<Item = &'a NormalizedRecord>) -> u64 {
    records.fold(0u64, |acc, r| acc.saturating_add(r.quantity))
}

fn is_adverse_event(record: &NormalizedRecord) -> bool {
    let lowered = record.original_procedure.to_lowercase();
    ADVERSE_EVENTS.iter().any(|k| lowered.contains(k))
}

fn is_puncture(record: &NormalizedRecord) -> bool {
    PUNCTURES
        .iter()
        .any(|k| record.original_procedure.contains(k))
}

fn production(table: &NormalizedTable, month: Month) -> u64 {
    sum(table
        .for_month(month)
        .filter(|r| r.subgroup == Subgroup::Production))
}

/// Outpatient total, falling back to the largest general statistic, then to 1
fn patients(table: &NormalizedTable, month: Month) -> u64 {
    let general: Vec<&NormalizedRecord> = table
        .for_month(month)
        .filter(|r| r.subgroup == Subgroup::GeneralStatistics)
        .collect();

    let outpatient = sum(general
        .iter()
        .copied()
        .filter(|r| r.original_procedure.contains(OUTPATIENT)));
    if outpatient > 0 {
        return outpatient;
    }

    general
        .iter()
        .map(|r| r.quantity)
        .max()
        .filter(|max| *max > 0)
        .unwrap_or(1)
}

/// Indicators for `month`; `None` when the table has no record for it
pub fn monthly_indicators(table: &NormalizedTable, month: Month) -> Option<MonthlyIndicators> {
    let months = table.months();
    let position = months.iter().position(|m| *m == month)?;

    let production_now = production(table, month);
    let patients = patients(table, month);
    let new_patients = sum(table
        .for_month(month)
        .filter(|r| r.original_procedure.contains(FIRST_VISIT)));
    let adverse_events = sum(table.for_month(month).filter(|r| is_adverse_event(r)));
    let punctures = sum(table.for_month(month).filter(|r| is_puncture(r)));

    let complexity_change = match position.checked_sub(1).map(|i| months[i]) {
        Some(previous) => {
            let before = production(table, previous);
            if before > 0 {
                (production_now as f64 - before as f64) / before as f64 * 100.0
            } else {
                0.0
            }
        }
        None => 0.0,
    };

    let event_rate = if production_now > 0 {
        adverse_events as f64 / production_now as f64 * 1000.0
    } else {
        0.0
    };

    Some(MonthlyIndicators {
        month,
        production: production_now,
        patients,
        new_patients,
        adverse_events,
        punctures,
        complexity_change,
        event_rate,
        intensity: production_now as f64 / patients as f64,
        supply_forecast: punctures.saturating_mul(12) / 10,
    })
}

/// Indicators for every month present, in calendar order
pub fn all_indicators(table: &NormalizedTable) -> Vec<MonthlyIndicators> {
    table
        .months()
        .into_iter()
        .filter_map(|m| monthly_indicators(table, m))
        .collect()
}

/// The `n` largest production records of `month`, ties kept in table order
pub fn top_activities(table: &NormalizedTable, month: Month, n: usize) -> Vec<&NormalizedRecord> {
    let mut production: Vec<&NormalizedRecord> = table
        .for_month(month)
        .filter(|r| r.subgroup == Subgroup::Production)
        .collect();
    production.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    production.truncate(n);
    production
}

/// Extravasation and spill records of `month`
pub fn adverse_events(table: &NormalizedTable, month: Month) -> Vec<&NormalizedRecord> {
    table
        .for_month(month)
        .filter(|r| is_adverse_event(r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Professional;

    fn rec(label: &str, month: Month, qty: u64, subgroup: Subgroup, prof: Professional) -> NormalizedRecord {
        NormalizedRecord::new(label.to_string(), label.to_string(), month, qty, subgroup, prof)
    }

    fn table() -> NormalizedTable {
        use Professional::*;
        use Subgroup::*;
        NormalizedTable::new(vec![
            rec("TOTAL DE PACIENTES AMBULATORIAL", Month::Jan, 120, GeneralStatistics, NotApplicable),
            rec("PACIENTES DE PRIMEIRA VEZ", Month::Jan, 15, GeneralStatistics, NotApplicable),
            rec("PACIENTES INTERNADOS", Month::Fev, 40, GeneralStatistics, NotApplicable),
            rec("PUNÇÃO VENOSA", Month::Jan, 200, Production, Nurse),
            rec("EXTRAVASAMENTO DE QUIMIOTERAPIA", Month::Jan, 1, Production, Nurse),
            rec("CURATIVOS", Month::Jan, 30, Production, Nurse),
            rec("INJEÇÕES", Month::Jan, 80, Production, NursingTechnician),
            rec("PUNÇÕES VENOSAS", Month::Fev, 250, Production, NursingTechnician),
            rec("Derramamento de QT", Month::Fev, 2, Production, NursingTechnician),
        ])
    }

    #[test]
    fn test_january_indicators() {
        let jan = monthly_indicators(&table(), Month::Jan).unwrap();
        assert_eq!(jan.production, 311);
        assert_eq!(jan.patients, 120);
        assert_eq!(jan.new_patients, 15);
        assert_eq!(jan.adverse_events, 1);
        assert_eq!(jan.punctures, 200);
        assert_eq!(jan.supply_forecast, 240);
        assert_eq!(jan.complexity_change, 0.0);
        assert!((jan.intensity - 311.0 / 120.0).abs() < 1e-9);
        assert!((jan.event_rate - 1000.0 / 311.0).abs() < 1e-9);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        use Professional::*;
        use Subgroup::*;
        let huge = 10_000_000_000_000_000_000;
        let table = NormalizedTable::new(vec![
            rec("PUNÇÃO VENOSA", Month::Mar, huge, Production, Nurse),
            rec("CURATIVOS", Month::Mar, huge, Production, Nurse),
        ]);

        let mar = monthly_indicators(&table, Month::Mar).unwrap();
        assert_eq!(mar.production, u64::MAX);
        assert_eq!(mar.punctures, huge);
        assert_eq!(mar.supply_forecast, u64::MAX / 10);
        assert_eq!(mar.patients, 1);
    }

    #[test]
    fn test_patients_fallback_to_max() {
        let fev = monthly_indicators(&table(), Month::Fev).unwrap();
        // No outpatient line in February: largest general statistic is used
        assert_eq!(fev.patients, 40);
    }

    #[test]
    fn test_patients_fallback_to_one() {
        let table = NormalizedTable::new(vec![rec(
            "PUNÇÃO",
            Month::Mar,
            10,
            Subgroup::Production,
            Professional::Nurse,
        )]);
        let mar = monthly_indicators(&table, Month::Mar).unwrap();
        assert_eq!(mar.patients, 1);
        assert_eq!(mar.intensity, 10.0);
    }

    #[test]
    fn test_complexity_against_previous_month() {
        let fev = monthly_indicators(&table(), Month::Fev).unwrap();
        assert_eq!(fev.production, 252);
        let expected = (252.0 - 311.0) / 311.0 * 100.0;
        assert!((fev.complexity_change - expected).abs() < 1e-9);
        // Adverse events match case-insensitively
        assert_eq!(fev.adverse_events, 2);
    }

    #[test]
    fn test_month_without_records() {
        assert!(monthly_indicators(&table(), Month::Dez).is_none());
        assert_eq!(all_indicators(&table()).len(), 2);
    }

    #[test]
    fn test_top_activities_order() {
        let t = table();
        let top = top_activities(&t, Month::Jan, 2);
        let labels: Vec<&str> = top.iter().map(|r| r.procedure.as_str()).collect();
        assert_eq!(labels, vec!["PUNÇÃO VENOSA", "INJEÇÕES"]);
    }

    #[test]
    fn test_adverse_event_listing() {
        let t = table();
        let events = adverse_events(&t, Month::Fev);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].professional, Professional::NursingTechnician);
    }
}
