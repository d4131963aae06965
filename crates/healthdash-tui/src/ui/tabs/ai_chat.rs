//! "Ask AI" tab: the conversation transcript above a single input line.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use healthdash_core::{Speaker, TranscriptEntry};

use super::{render_lines, titled_block};
use crate::app::{App, MAX_QUERY_LENGTH};
use crate::ui::styles;
use crate::utils::{format_time, truncate_string};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let [transcript_area, input_area] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(3)]).areas(area);

    let mut lines = transcript_lines(&app.transcript);
    if app.query_pending {
        lines.push(Line::from(Span::styled("AI Assistant is thinking...", styles::muted_style())));
    }
    render_lines(frame, app, transcript_area, " Ask AI ".to_string(), lines);

    render_input(frame, app, input_area);
}

fn transcript_lines(entries: &[TranscriptEntry]) -> Vec<Line<'static>> {
    if entries.is_empty() {
        return vec![
            Line::from(Span::styled(
                "Ask a question about this member's health data.",
                styles::muted_style(),
            )),
            Line::from(Span::styled(
                "Type below and press Enter.",
                styles::muted_style(),
            )),
        ];
    }

    let mut lines = Vec::new();
    for entry in entries {
        let speaker_style = match entry.speaker {
            Speaker::Member => styles::title_style(),
            Speaker::Assistant => styles::success_style(),
        };
        lines.push(Line::from(vec![
            Span::styled(entry.speaker.label(), speaker_style),
            Span::styled(format!("  {}", format_time(&entry.at)), styles::muted_style()),
        ]));
        let text_style = if entry.failed {
            styles::error_style()
        } else {
            styles::list_item_style()
        };
        for text_line in entry.text.lines() {
            lines.push(Line::from(Span::styled(text_line.to_string(), text_style)));
        }
        if let Some(context) = entry.context_display() {
            lines.push(Line::from(Span::styled("Context found:", styles::highlight_style())));
            for context_line in context.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {}", context_line),
                    styles::muted_style(),
                )));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let enabled = !app.query_pending;
    let width = area.width.saturating_sub(4) as usize;
    let text = if enabled {
        // Keep the tail visible while typing past the box width.
        let chars = app.query_input.chars().count();
        let visible: String = app.query_input.chars().skip(chars.saturating_sub(width.saturating_sub(1))).collect();
        format!("{}▏", visible)
    } else {
        truncate_string("Waiting for a reply...", width)
    };

    let title = format!(" Question ({}/{}) ", app.query_input.chars().count(), MAX_QUERY_LENGTH);
    let input = Paragraph::new(Line::from(Span::styled(text, styles::input_style(enabled))))
        .block(titled_block(title).border_style(styles::border_style(enabled)));
    frame.render_widget(input, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use healthdash_core::chat::NO_CONTEXT;

    fn entry(speaker: Speaker, text: &str, failed: bool) -> TranscriptEntry {
        TranscriptEntry {
            speaker,
            text: text.to_string(),
            at: Utc::now(),
            failed,
            context: None,
        }
    }

    #[test]
    fn test_transcript_lines() {
        let entries = vec![
            entry(Speaker::Member, "How is my HRV?", false),
            entry(Speaker::Assistant, "Trending up.\nKeep it going.", false),
        ];
        let lines = transcript_lines(&entries);
        assert!(lines[0].to_string().starts_with("You"));
        assert_eq!(lines[1].to_string(), "How is my HRV?");
        assert!(lines[3].to_string().starts_with("AI Assistant"));
        assert_eq!(lines[4].to_string(), "Trending up.");
        assert_eq!(lines[5].to_string(), "Keep it going.");
        assert_eq!(lines[6].to_string(), "Context found:");
        assert_eq!(lines[7].to_string(), format!("  {}", NO_CONTEXT));
    }

    #[test]
    fn test_answer_context_listed_under_answer() {
        let mut answer = entry(Speaker::Assistant, "Zone 2 builds aerobic base.", false);
        answer.context = Some("[2025-02-03] Advik: adding zone 2\n[2025-02-10] Rohan: done".to_string());
        let text: Vec<String> = transcript_lines(&[answer]).iter().map(|l| l.to_string()).collect();
        assert_eq!(
            text[2..5],
            [
                "Context found:".to_string(),
                "  [2025-02-03] Advik: adding zone 2".to_string(),
                "  [2025-02-10] Rohan: done".to_string(),
            ]
        );
    }

    #[test]
    fn test_failed_entry_uses_error_style() {
        let lines = transcript_lines(&[entry(Speaker::Assistant, "Sorry", true)]);
        assert_eq!(lines[1].spans[0].style, styles::error_style());
    }
}
