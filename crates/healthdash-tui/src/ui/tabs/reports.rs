use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::{display_value, ResourceId, TestReports};

use super::{decode_or_placeholder, render_lines};
use crate::app::App;
use crate::ui::styles;
use crate::utils::format_optional;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match decode_or_placeholder::<TestReports>(app, ResourceId::TestReports) {
        Ok(reports) => report_lines(&reports),
        Err(lines) => lines,
    };
    render_lines(frame, app, area, " Test Reports ".to_string(), lines);
}

fn report_lines(reports: &TestReports) -> Vec<Line<'static>> {
    if reports.test_panel_reports.is_empty() {
        return vec![Line::from(Span::styled("No test reports.", styles::muted_style()))];
    }

    let mut lines = Vec::new();
    for report in &reports.test_panel_reports {
        let month = report.month.map(|m| format!("Month {} • ", m)).unwrap_or_default();
        lines.push(Line::from(Span::styled(
            format!("{}{}", month, format_optional(&report.title, "Test panel report")),
            styles::title_style(),
        )));

        for panel in &report.panels {
            lines.push(Line::from(Span::styled(
                format!("  {}", panel.name),
                styles::highlight_style(),
            )));
            for test in &panel.tests {
                lines.push(Line::from(vec![
                    Span::styled(format!("    {:<24}", test.marker), styles::list_item_style()),
                    Span::raw(display_value(&test.value)),
                ]));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}
