use std::collections::BTreeMap;

use chrono::NaiveDate;
use protocol::DailyLog;

use crate::time::{local_date, local_hour};

/// Time-of-day bucket, split at fixed local-hour boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Franja {
    Manana,
    Tarde,
    Noche,
}

impl Franja {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..12 => Franja::Manana,
            12..18 => Franja::Tarde,
            _ => Franja::Noche,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Franja::Manana => "mañana",
            Franja::Tarde => "tarde",
            Franja::Noche => "noche",
        }
    }
}

/// Total hours per local calendar day, ordered by date.
pub fn hours_by_day(logs: &[DailyLog]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for log in logs {
        *totals.entry(local_date(log.fecha_creacion)).or_insert(0.0) += log.horas;
    }
    totals
}

/// Hours per (day, time-of-day bucket), the grouped bar chart's input.
pub fn hours_by_day_and_franja(logs: &[DailyLog]) -> BTreeMap<(NaiveDate, Franja), f64> {
    let mut totals = BTreeMap::new();
    for log in logs {
        let key = (
            local_date(log.fecha_creacion),
            Franja::from_hour(local_hour(log.fecha_creacion)),
        );
        *totals.entry(key).or_insert(0.0) += log.horas;
    }
    totals
}

/// Hours per (day, local hour) cell for the heatmap.
pub fn heatmap(logs: &[DailyLog]) -> BTreeMap<(NaiveDate, u32), f64> {
    let mut cells = BTreeMap::new();
    for log in logs {
        let key = (local_date(log.fecha_creacion), local_hour(log.fecha_creacion));
        *cells.entry(key).or_insert(0.0) += log.horas;
    }
    cells
}

/// Occurrence count per technology, splitting the free-text field on
/// commas. Sorted by frequency, ties alphabetically.
pub fn technology_frequency(logs: &[DailyLog]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for log in logs {
        for token in log.tecnologias_utilizadas.split(',') {
            let name = token.trim();
            if name.is_empty() {
                continue;
            }
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}
