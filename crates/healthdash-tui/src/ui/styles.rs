use ratatui::style::{Color, Modifier, Style};

use healthdash_core::models::Trend;

// Color palette
pub const PRIMARY: Color = Color::Rgb(64, 160, 176);
pub const SECONDARY: Color = Color::Rgb(96, 176, 112);
pub const ACCENT: Color = Color::Rgb(208, 168, 72);
pub const ERROR: Color = Color::Rgb(200, 72, 72);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const HIGHLIGHT: Color = Color::Rgb(40, 52, 64);

/// Line colors for multi-series charts, cycled by series index.
pub const SERIES: [Color; 4] = [PRIMARY, ACCENT, SECONDARY, Color::Rgb(176, 112, 192)];

// Styles
pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn input_style(enabled: bool) -> Style {
    if enabled {
        Style::default().fg(ACCENT)
    } else {
        muted_style()
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(32, 32, 40)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Trend arrows: up is good, down is bad.
pub fn trend_style(trend: Trend) -> Style {
    match trend {
        Trend::Up => success_style(),
        Trend::Down => error_style(),
        Trend::Flat => muted_style(),
    }
}

pub fn series_color(index: usize) -> Color {
    SERIES[index % SERIES.len()]
}
