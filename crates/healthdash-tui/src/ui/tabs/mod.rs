//! Per-tab content rendering.
//!
//! Every data tab renders its resource through [`decode_or_placeholder`],
//! so loading, failure and missing-focus states look the same everywhere.

pub mod ai_chat;
pub mod biomarkers;
pub mod chats;
pub mod diagnostics;
pub mod metrics;
pub mod profile;
pub mod reports;
pub mod wearables;

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    symbols::Marker,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use healthdash_core::models::{ResourceId, ResourceStatus};

use crate::app::App;
use crate::ui::styles;
use crate::utils::format_number;

/// Decode the resource behind a tab, or produce the lines to show instead.
pub fn decode_or_placeholder<T: DeserializeOwned>(
    app: &App,
    id: ResourceId,
) -> Result<T, Vec<Line<'static>>> {
    let resource = app.resource(id);
    match resource.status {
        ResourceStatus::NotRequested if app.member.is_none() => Err(vec![
            Line::from(Span::styled("No member selected.", styles::muted_style())),
            Line::from(""),
            Line::from(vec![
                Span::styled("Press ", styles::muted_style()),
                Span::styled("[m]", styles::help_key_style()),
                Span::styled(" to pick one.", styles::muted_style()),
            ]),
        ]),
        ResourceStatus::NotRequested => Err(vec![Line::from(Span::styled(
            "Not loaded yet.",
            styles::muted_style(),
        ))]),
        ResourceStatus::Loading => Err(vec![Line::from(Span::styled(
            "Loading...",
            styles::muted_style(),
        ))]),
        ResourceStatus::Failed(e) => Err(failure_lines(&e.user_message())),
        ResourceStatus::Ready(cached) => cached.data.decode::<T>().map_err(|e| {
            warn!(resource = %id, error = %e, "Payload did not match the expected shape");
            failure_lines(&e.user_message())
        }),
    }
}

fn failure_lines(message: &str) -> Vec<Line<'static>> {
    vec![
        Line::from(Span::styled(message.to_string(), styles::error_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", styles::muted_style()),
            Span::styled("[r]", styles::help_key_style()),
            Span::styled(" to retry.", styles::muted_style()),
        ]),
    ]
}

/// Bordered block with the common title style.
pub fn titled_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

/// Scrollable, wrapped text panel.
pub fn render_lines(frame: &mut Frame, app: &App, area: Rect, title: String, lines: Vec<Line<'static>>) {
    let paragraph = Paragraph::new(lines)
        .block(titled_block(title))
        .wrap(Wrap { trim: false })
        .scroll((app.content_scroll, 0));
    frame.render_widget(paragraph, area);
}

/// Named line series for [`render_chart`].
pub struct Series {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

/// Line chart over all series, with bounds covering every point.
pub fn render_chart(frame: &mut Frame, area: Rect, title: String, series: &[Series]) {
    let points = series.iter().flat_map(|s| s.points.iter());
    let Some((x_bounds, y_bounds)) = chart_bounds(points) else {
        let empty = Paragraph::new(Line::from(Span::styled(
            "No data to chart.",
            styles::muted_style(),
        )))
        .block(titled_block(title));
        frame.render_widget(empty, area);
        return;
    };

    let datasets = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            Dataset::default()
                .name(s.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(styles::series_color(i)))
                .data(&s.points)
        })
        .collect::<Vec<_>>();

    let chart = Chart::new(datasets)
        .block(titled_block(title))
        .x_axis(
            Axis::default()
                .style(styles::muted_style())
                .bounds(x_bounds)
                .labels(axis_labels(x_bounds)),
        )
        .y_axis(
            Axis::default()
                .style(styles::muted_style())
                .bounds(y_bounds)
                .labels(axis_labels(y_bounds)),
        );
    frame.render_widget(chart, area);
}

fn chart_bounds<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Option<([f64; 2], [f64; 2])> {
    let mut bounds: Option<([f64; 2], [f64; 2])> = None;
    for &(x, y) in points {
        let (xs, ys) = bounds.get_or_insert(([x, x], [y, y]));
        xs[0] = xs[0].min(x);
        xs[1] = xs[1].max(x);
        ys[0] = ys[0].min(y);
        ys[1] = ys[1].max(y);
    }
    bounds.map(|(mut xs, mut ys)| {
        // A single point or flat line still needs a non-empty range.
        if xs[0] == xs[1] {
            xs[1] += 1.0;
        }
        if ys[0] == ys[1] {
            ys[0] -= 1.0;
            ys[1] += 1.0;
        }
        (xs, ys)
    })
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .iter()
        .map(|v| Span::raw(format_number(Some(*v))))
        .collect()
}

/// "Label: value" line.
pub fn field(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), styles::highlight_style()),
        Span::raw(value),
    ])
}
