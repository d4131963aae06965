use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use healthdash_core::view::Tab;

use crate::app::{App, AppState};
use crate::utils::{format_optional, truncate_string};

use super::styles;
use super::tabs::{ai_chat, biomarkers, chats, diagnostics, metrics, profile, reports, wearables};

const PICKER_WIDTH: u16 = 60;
const PICKER_HEIGHT: u16 = 18;

pub fn render(frame: &mut Frame, app: &App) {
    let [title_area, tabs_area, main_area, status_area] = Layout::vertical([
        Constraint::Length(3), // Title bar
        Constraint::Length(3), // Tabs
        Constraint::Min(10),   // Main content
        Constraint::Length(2), // Status bar
    ])
    .areas(frame.area());

    render_title_bar(frame, app, title_area);
    render_tabs(frame, app, tabs_area);
    render_main_content(frame, app, main_area);
    render_status_bar(frame, app, status_area);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::PickingMember => render_member_picker(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  Health Dashboard";
    let member = app
        .member_display_name()
        .map(|name| format!("  •  {}", name))
        .unwrap_or_default();
    let loading = match app.loading_count() {
        0 => String::new(),
        n => format!("Loading {}...  ", n),
    };
    let help_hint = "[?] Help";

    let used = title.chars().count() + member.chars().count() + loading.chars().count() + help_hint.len();
    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::styled(member, styles::highlight_style()),
        Span::raw(" ".repeat((area.width as usize).saturating_sub(used + 4))),
        Span::styled(loading, styles::muted_style()),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in Tab::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        spans.push(Span::styled(label, styles::tab_style(*tab == app.current_tab)));
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Profile => profile::render(frame, app, area),
        Tab::Chats => chats::render(frame, app, area),
        Tab::Biomarkers => biomarkers::render(frame, app, area),
        Tab::Wearables => wearables::render(frame, app, area),
        Tab::Reports => reports::render(frame, app, area),
        Tab::Diagnostics => diagnostics::render(frame, app, area),
        Tab::Metrics => metrics::render(frame, app, area),
        Tab::AiChat => ai_chat::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.status_message, app.last_updated()) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(age)) => format!(" Updated {} ", age),
        (None, None) => " Not loaded ".to_string(),
    };
    let shortcuts = if app.current_tab == Tab::AiChat {
        "[Enter] send | [Esc] clear | [Tab] next tab"
    } else {
        "[m]ember | [r]etry | [q]uit"
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_entry(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let help_text = vec![
        Line::from(Span::styled("  Health Dashboard", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_entry("1-8", "Switch tabs"),
        help_entry("←/→ Tab", "Prev/next tab"),
        help_entry("↑/↓ j/k", "Scroll"),
        help_entry("PgUp/PgDn", "Scroll a page"),
        Line::from(""),
        Line::from(Span::styled(" Actions", styles::highlight_style())),
        help_entry("m", "Pick a member"),
        help_entry("r", "Retry the current tab"),
        help_entry("q", "Quit"),
        Line::from(""),
        Line::from(Span::styled(" Ask AI Tab", styles::highlight_style())),
        help_entry("Enter", "Send the question"),
        help_entry("Esc", "Clear input, again to leave"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_member_picker(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(PICKER_WIDTH, PICKER_HEIGHT, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Select Member ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    let placeholder = if app.members_loading {
        Some(Line::from(Span::styled(" Loading members...", styles::muted_style())))
    } else if app.members.is_empty() {
        Some(Line::from(vec![
            Span::styled(" No members found. Press ", styles::muted_style()),
            Span::styled("[r]", styles::help_key_style()),
            Span::styled(" to reload.", styles::muted_style()),
        ]))
    } else {
        None
    };
    if let Some(line) = placeholder {
        frame.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    let inner_width = PICKER_WIDTH.saturating_sub(4) as usize;
    let items: Vec<ListItem> = app
        .members
        .iter()
        .map(|summary| {
            let is_focused = app.member.as_ref() == Some(&summary.member_id());
            let marker = if is_focused { "● " } else { "  " };
            let detail = format_optional(&summary.chronic_condition, "");
            let mut spans = vec![
                Span::styled(marker, styles::success_style()),
                Span::styled(truncate_string(&summary.name, 24), styles::list_item_style()),
            ];
            if !detail.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", truncate_string(&detail, inner_width.saturating_sub(28))),
                    styles::muted_style(),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(styles::selected_style());
    let mut state = ListState::default().with_selected(Some(app.member_selection));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}
