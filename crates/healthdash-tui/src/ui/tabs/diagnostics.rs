use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::{display_value, DiagnosticPlan, MonthlyPlan, ResourceId};

use super::{decode_or_placeholder, field, render_lines};
use crate::app::App;
use crate::ui::styles;
use crate::utils::format_optional;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match decode_or_placeholder::<DiagnosticPlan>(app, ResourceId::Diagnostics) {
        Ok(plan) => plan_lines(&plan),
        Err(lines) => lines,
    };
    render_lines(frame, app, area, " Diagnostic Plan ".to_string(), lines);
}

fn plan_lines(plan: &DiagnosticPlan) -> Vec<Line<'static>> {
    if plan.diagnostic_plan_over_time.is_empty() {
        return vec![Line::from(Span::styled("No diagnostic plan.", styles::muted_style()))];
    }

    let mut lines = Vec::new();
    for phase in &plan.diagnostic_plan_over_time {
        lines.push(Line::from(Span::styled(
            format!(
                "Phase {}: {}",
                display_value(&phase.phase),
                format_optional(&phase.title, "Untitled")
            ),
            styles::title_style(),
        )));
        if let Some(notes) = phase.notes.as_deref().filter(|n| !n.is_empty()) {
            lines.push(Line::from(Span::styled(notes.to_string(), styles::muted_style())));
        }
        for monthly in &phase.monthly_plans {
            lines.extend(monthly_lines(monthly));
        }
        lines.push(Line::from(""));
    }
    lines
}

fn monthly_lines(plan: &MonthlyPlan) -> Vec<Line<'static>> {
    let month = plan.month.map(|m| format!("Month {}", m)).unwrap_or_else(|| "Month ?".to_string());
    let mut lines = vec![Line::from(vec![
        Span::styled(format!("  {}", month), styles::highlight_style()),
        Span::raw(format!("  {}", format_optional(&plan.title, ""))),
    ])];
    if plan.objective.is_some() {
        lines.push(field("    Objective", format_optional(&plan.objective, "")));
    }
    if !plan.tests.is_null() {
        lines.push(field("    Tests", display_value(&plan.tests)));
    }
    if plan.rationale.is_some() {
        lines.push(field("    Rationale", format_optional(&plan.rationale, "")));
    }
    lines
}
