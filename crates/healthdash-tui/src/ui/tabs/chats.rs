use ratatui::{
    layout::Rect,
    text::{Line, Span},
    Frame,
};

use healthdash_core::models::{ChatHistory, ResourceId};

use super::{decode_or_placeholder, render_lines};
use crate::app::App;
use crate::ui::styles;
use crate::utils::format_date;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match decode_or_placeholder::<ChatHistory>(app, ResourceId::Chats) {
        Ok(history) => history_lines(&history),
        Err(lines) => lines,
    };
    render_lines(frame, app, area, " Care Team Chats ".to_string(), lines);
}

fn history_lines(history: &ChatHistory) -> Vec<Line<'static>> {
    if history.is_empty() {
        return vec![Line::from(Span::styled(
            "No conversations yet.",
            styles::muted_style(),
        ))];
    }

    let mut lines = Vec::new();
    for (date, messages) in history.by_date() {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            format!("── {} ──", format_date(date)),
            styles::title_style(),
        )));
        for message in messages {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", message.sender_label()), styles::highlight_style()),
                Span::raw(message.message.clone()),
            ]));
        }
    }
    lines
}
