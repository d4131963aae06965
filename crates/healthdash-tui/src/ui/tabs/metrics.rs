use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::{InternalMetrics, ResourceId};

use super::{decode_or_placeholder, field, render_lines};
use crate::app::App;
use crate::ui::styles;
use crate::utils::{format_number, format_optional};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match decode_or_placeholder::<InternalMetrics>(app, ResourceId::InternalMetrics) {
        Ok(metrics) => metrics_lines(&metrics),
        Err(lines) => lines,
    };
    render_lines(frame, app, area, " Internal Metrics ".to_string(), lines);
}

fn metrics_lines(metrics: &InternalMetrics) -> Vec<Line<'static>> {
    if metrics.is_empty() {
        return vec![Line::from(Span::styled("No metrics recorded.", styles::muted_style()))];
    }

    let mut lines = vec![field(
        "Total messages",
        metrics.total_messages().map_or_else(|| "N/A".to_string(), |n| n.to_string()),
    )];
    for (role, count) in &metrics.messages_by_role {
        lines.push(Line::from(Span::styled(
            format!("  {:<20}{}", role, count),
            styles::muted_style(),
        )));
    }
    if !metrics.members_served_by_role.is_empty() {
        lines.push(Line::from(Span::styled("Members served", styles::highlight_style())));
        for (role, count) in &metrics.members_served_by_role {
            lines.push(Line::from(Span::styled(
                format!("  {:<20}{}", role, count),
                styles::muted_style(),
            )));
        }
    }
    lines.push(Line::from(""));

    for month in &metrics.internal_metrics {
        let label = match (&month.period, month.month) {
            (Some(period), _) if !period.is_empty() => period.clone(),
            (_, Some(m)) => format!("Month {}", m),
            _ => "Unknown period".to_string(),
        };
        lines.push(Line::from(Span::styled(label, styles::title_style())));
        lines.push(field("  Doctor consults (h)", format_number(month.doctor_consults_hours)));
        lines.push(field("  Coach time (h)", format_number(month.coach_hours)));
        lines.push(field(
            "  Plan adherence",
            month
                .plan_adherence_percentage
                .filter(|v| v.is_finite())
                .map_or_else(|| "N/A".to_string(), |v| format!("{}%", format_number(Some(v)))),
        ));
        lines.push(field(
            "  Member-initiated",
            month
                .member_initiated_conversations
                .map_or_else(|| "N/A".to_string(), |n| n.to_string()),
        ));
        if month.notes.is_some() {
            lines.push(Line::from(Span::styled(
                format!("  {}", format_optional(&month.notes, "")),
                styles::muted_style(),
            )));
        }
    }
    lines
}
