//! Biomarker time series and trend helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Direction of change between the two most recent values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    /// Compare two optional values; any missing side yields `Flat`.
    pub fn between(previous: Option<f64>, latest: Option<f64>) -> Self {
        match (previous, latest) {
            (Some(prev), Some(last)) if last > prev => Trend::Up,
            (Some(prev), Some(last)) if last < prev => Trend::Down,
            _ => Trend::Flat,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Trend::Up => Trend::Down,
            Trend::Down => Trend::Up,
            Trend::Flat => Trend::Flat,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↗",
            Trend::Down => "↘",
            Trend::Flat => "→",
        }
    }
}

/// The `biomarkers` resource: readings grouped by marker name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomarkerReport {
    pub grouped_data: BTreeMap<String, Vec<BiomarkerReading>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomarkerReading {
    pub month: Option<f64>,
    pub date: Option<String>,
    /// `None` is the missing marker (the backend sent `NaN` or `null`).
    pub value: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

impl BiomarkerReport {
    pub fn markers(&self) -> impl Iterator<Item = &str> {
        self.grouped_data.keys().map(String::as_str)
    }

    pub fn latest(&self, marker: &str) -> Option<&BiomarkerReading> {
        self.grouped_data.get(marker).and_then(|r| r.last())
    }

    pub fn trend(&self, marker: &str) -> Trend {
        match self.grouped_data.get(marker).map(Vec::as_slice) {
            Some([.., prev, last]) => Trend::between(prev.value, last.value),
            _ => Trend::Flat,
        }
    }

    /// Chart points `(month, value)`, skipping readings with a missing
    /// month or value. Readings without a month fall back to their index.
    pub fn series(&self, marker: &str) -> Vec<(f64, f64)> {
        self.grouped_data
            .get(marker)
            .map(|readings| {
                readings
                    .iter()
                    .enumerate()
                    .filter_map(|(i, r)| Some((r.month.unwrap_or(i as f64), r.value?)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.grouped_data.values().all(Vec::is_empty)
    }
}
