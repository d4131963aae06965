use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::{BiomarkerReport, ResourceId};

use super::{decode_or_placeholder, render_chart, render_lines, Series};
use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_date, format_number, format_optional};

const CHARTS_PER_ROW: usize = 2;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = " Biomarkers ".to_string();
    let report = match decode_or_placeholder::<BiomarkerReport>(app, ResourceId::Biomarkers) {
        Ok(report) if !report.is_empty() => report,
        Ok(_) => {
            let empty = vec![Line::from(Span::styled("No biomarker data.", styles::muted_style()))];
            return render_lines(frame, app, area, title, empty);
        }
        Err(lines) => return render_lines(frame, app, area, title, lines),
    };

    let [cards_area, charts_area] =
        Layout::vertical([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(area);
    render_lines(frame, app, cards_area, title, latest_lines(&report));
    render_charts(frame, charts_area, &report);
}

/// One line per marker: latest value, unit, direction and date.
fn latest_lines(report: &BiomarkerReport) -> Vec<Line<'static>> {
    report
        .markers()
        .map(|marker| {
            let latest = report.latest(marker);
            let value = format_number(latest.and_then(|r| r.value));
            let unit = latest.map(|r| format_optional(&r.unit, "")).unwrap_or_default();
            let date = latest
                .and_then(|r| r.date.as_deref())
                .map(format_date)
                .unwrap_or_default();
            // Higher is not always better for a lab marker, so the arrow stays neutral.
            let trend = report.trend(marker);

            let mut spans = vec![
                Span::styled(format!("{:<16}", marker), styles::highlight_style()),
                Span::styled(format!("{} {}", value, unit), styles::list_item_style()),
                Span::raw(" "),
                Span::styled(trend.arrow(), styles::title_style()),
            ];
            if !date.is_empty() {
                spans.push(Span::styled(format!("  {}", date), styles::muted_style()));
            }
            if let Some(notes) = latest.and_then(|r| r.notes.as_deref()).filter(|n| !n.is_empty()) {
                spans.push(Span::styled(format!("  {}", notes), styles::muted_style()));
            }
            Line::from(spans)
        })
        .collect()
}

fn render_charts(frame: &mut Frame, area: Rect, report: &BiomarkerReport) {
    let markers: Vec<&str> = report.markers().collect();
    let rows = markers.chunks(CHARTS_PER_ROW).collect::<Vec<_>>();
    let row_areas = Layout::vertical(vec![Constraint::Ratio(1, rows.len() as u32); rows.len()]).split(area);

    for (row, row_area) in rows.iter().zip(row_areas.iter()) {
        let cells = Layout::horizontal(vec![Constraint::Ratio(1, CHARTS_PER_ROW as u32); CHARTS_PER_ROW])
            .split(*row_area);
        for (marker, cell) in row.iter().zip(cells.iter()) {
            let series = [Series {
                name: marker.to_string(),
                points: report.series(marker),
            }];
            render_chart(frame, *cell, format!(" {} ", marker), &series);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use healthdash_core::api::parse_payload;

    #[test]
    fn test_latest_lines_show_missing_value_as_na() {
        let report: BiomarkerReport = parse_payload(
            r#"{"grouped_data": {
                "HbA1c": [
                    {"month": 1, "date": "2025-01-15", "value": 6.1, "unit": "%"},
                    {"month": 3, "date": "2025-03-15", "value": NaN, "unit": "%"}
                ]
            }}"#,
        )
        .unwrap();
        let line = latest_lines(&report)[0].to_string();
        assert!(line.starts_with("HbA1c"));
        assert!(line.contains("N/A %"));
        assert!(line.contains("Mar 15, 2025"));
    }
}
