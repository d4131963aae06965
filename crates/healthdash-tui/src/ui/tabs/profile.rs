use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::{MemberProfile, ResourceId};

use super::{decode_or_placeholder, field, render_lines};
use crate::app::App;
use crate::ui::styles;
use crate::utils::format_optional;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    match decode_or_placeholder::<MemberProfile>(app, ResourceId::Profile) {
        Ok(profile) => render_lines(frame, app, area, " Profile ".to_string(), profile_lines(&profile)),
        Err(lines) => render_lines(frame, app, area, " Profile ".to_string(), lines),
    }
}

fn profile_lines(profile: &MemberProfile) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(profile.display_name().to_string(), styles::title_style())),
    ];

    let demographics = profile.demographics();
    if !demographics.is_empty() {
        lines.push(Line::from(Span::styled(demographics, styles::muted_style())));
    }
    lines.push(Line::from(""));

    lines.push(field("Occupation", format_optional(&profile.occupation, "N/A")));
    lines.push(field("Chronic condition", format_optional(&profile.chronic_condition, "None reported")));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled("Health goals", styles::highlight_style())));
    if profile.goals.is_empty() {
        lines.push(Line::from(Span::styled("  No goals recorded", styles::muted_style())));
    }
    for goal in &profile.goals {
        lines.push(Line::from(format!("  • {}", goal)));
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_lines_with_missing_fields() {
        let profile = MemberProfile {
            name: Some("Rohan Patel".to_string()),
            goals: vec!["Lower LDL".to_string()],
            ..Default::default()
        };
        let text: Vec<String> = profile_lines(&profile).iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "Rohan Patel");
        assert!(text.iter().any(|l| l == "Occupation: N/A"));
        assert!(text.iter().any(|l| l == "  • Lower LDL"));
    }
}
