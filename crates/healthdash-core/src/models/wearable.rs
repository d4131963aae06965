//! Daily wearable records.

use serde::{Deserialize, Serialize};

use super::Trend;

/// One day of wearable data. Every metric may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WearableDay {
    pub date: Option<String>,
    pub sleep_score_100: Option<f64>,
    pub hrv_ms: Option<f64>,
    pub rhr_bpm: Option<f64>,
    pub respiratory_rate_brpm: Option<f64>,
}

/// A headline metric shown above the wearables chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WearableMetric {
    pub label: &'static str,
    pub value: Option<f64>,
    pub unit: &'static str,
    /// Whether the metric moved in the good direction.
    pub trend: Trend,
}

/// Headline metrics for the most recent day, with trends against the day
/// before. A falling resting heart rate counts as an improvement; the
/// respiratory rate carries no trend.
pub fn headline_metrics(days: &[WearableDay]) -> Vec<WearableMetric> {
    let Some(latest) = days.last() else {
        return Vec::new();
    };
    let previous = days.len().checked_sub(2).and_then(|i| days.get(i));

    vec![
        WearableMetric {
            label: "Sleep Score",
            value: latest.sleep_score_100,
            unit: "/100",
            trend: trend_of(previous, latest, |d| d.sleep_score_100),
        },
        WearableMetric {
            label: "HRV",
            value: latest.hrv_ms,
            unit: "ms",
            trend: trend_of(previous, latest, |d| d.hrv_ms),
        },
        WearableMetric {
            label: "Resting HR",
            value: latest.rhr_bpm,
            unit: "bpm",
            trend: trend_of(previous, latest, |d| d.rhr_bpm).inverted(),
        },
        WearableMetric {
            label: "Respiratory Rate",
            value: latest.respiratory_rate_brpm,
            unit: "brpm",
            trend: Trend::Flat,
        },
    ]
}

pub type Metric = fn(&WearableDay) -> Option<f64>;

fn trend_of(previous: Option<&WearableDay>, latest: &WearableDay, pick: Metric) -> Trend {
    previous.map_or(Trend::Flat, |prev| Trend::between(pick(prev), pick(latest)))
}

/// Chart points `(day index, value)` for one metric, skipping missing days.
pub fn series(days: &[WearableDay], pick: Metric) -> Vec<(f64, f64)> {
    days.iter()
        .enumerate()
        .filter_map(|(i, d)| Some((i as f64, pick(d)?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::normalize::parse_payload;

    fn days() -> Vec<WearableDay> {
        parse_payload(
            r#"[
                {"date": "2025-02-01", "sleep_score_100": 70, "hrv_ms": 40, "rhr_bpm": 62, "respiratory_rate_brpm": 14},
                {"date": "2025-02-02", "sleep_score_100": 75, "hrv_ms": NaN, "rhr_bpm": 60, "respiratory_rate_brpm": 15}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_headline_metrics_trends() {
        let metrics = headline_metrics(&days());
        assert_eq!(metrics.len(), 4);
        assert_eq!(metrics[0].trend, Trend::Up);
        // HRV went missing: no trend, value shown as missing.
        assert_eq!(metrics[1].value, None);
        assert_eq!(metrics[1].trend, Trend::Flat);
        // Resting HR dropped, which is an improvement.
        assert_eq!(metrics[2].trend, Trend::Up);
        assert_eq!(metrics[3].trend, Trend::Flat);
    }

    #[test]
    fn test_headline_metrics_single_day() {
        let single = vec![days().remove(0)];
        let metrics = headline_metrics(&single);
        assert!(metrics.iter().all(|m| m.trend == Trend::Flat));
        assert!(headline_metrics(&[]).is_empty());
    }

    #[test]
    fn test_series_skips_missing() {
        assert_eq!(series(&days(), |d| d.hrv_ms), vec![(0.0, 40.0)]);
        assert_eq!(series(&days(), |d| d.rhr_bpm), vec![(0.0, 62.0), (1.0, 60.0)]);
    }
}
