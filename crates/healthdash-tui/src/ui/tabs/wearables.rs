use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::wearable::{self, Metric};
use healthdash_core::models::{headline_metrics, ResourceId, WearableDay};

use super::{decode_or_placeholder, render_chart, render_lines, Series};
use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_date, format_number};

/// Charted daily series: label and field.
const CHARTED: [(&str, Metric); 3] = [
    ("HRV (ms)", |d: &WearableDay| d.hrv_ms),
    ("Resting HR (bpm)", |d: &WearableDay| d.rhr_bpm),
    ("Sleep score", |d: &WearableDay| d.sleep_score_100),
];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = " Wearables ".to_string();
    let days = match decode_or_placeholder::<Vec<WearableDay>>(app, ResourceId::Wearables) {
        Ok(days) if !days.is_empty() => days,
        Ok(_) => {
            let empty = vec![Line::from(Span::styled("No wearable data.", styles::muted_style()))];
            return render_lines(frame, app, area, title, empty);
        }
        Err(lines) => return render_lines(frame, app, area, title, lines),
    };

    let [summary_area, chart_area] =
        Layout::vertical([Constraint::Length(8), Constraint::Min(6)]).areas(area);
    render_lines(frame, app, summary_area, title, summary_lines(&days));

    let series = CHARTED
        .iter()
        .map(|(name, pick)| Series {
            name: name.to_string(),
            points: wearable::series(&days, *pick),
        })
        .collect::<Vec<_>>();
    render_chart(frame, chart_area, format!(" Last {} days ", days.len()), &series);
}

fn summary_lines(days: &[WearableDay]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if let Some(date) = days.last().and_then(|d| d.date.as_deref()) {
        lines.push(Line::from(Span::styled(
            format!("Latest reading: {}", format_date(date)),
            styles::muted_style(),
        )));
    }

    for metric in headline_metrics(days) {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<18}", metric.label), styles::highlight_style()),
            Span::styled(
                format!("{} {} ", format_number(metric.value), metric.unit),
                styles::list_item_style(),
            ),
            Span::styled(metric.trend.arrow(), styles::trend_style(metric.trend)),
        ]));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lines() {
        let days = vec![
            WearableDay {
                date: Some("2025-02-01".into()),
                hrv_ms: Some(40.0),
                rhr_bpm: Some(62.0),
                ..Default::default()
            },
            WearableDay {
                date: Some("2025-02-02".into()),
                hrv_ms: Some(44.0),
                rhr_bpm: Some(60.0),
                ..Default::default()
            },
        ];
        let text: Vec<String> = summary_lines(&days).iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "Latest reading: Feb 02, 2025");
        assert!(text[1].starts_with("Sleep Score"));
        assert!(text[1].contains("N/A /100"));
        assert!(text[2].contains("44 ms ↗"));
        // Lower resting heart rate reads as an improvement.
        assert!(text[3].contains("60 bpm ↗"));
    }
}
