use dashframe_proto::{
    Align, ChartPayload, ColorTextPayload, GraphType as ChartGraph, ImagePayload, MarkerType,
    Payload, StyledLine, TextPayload,
};
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Axis, Block, Borders, Chart, Dataset, GraphType, List, ListItem, Padding, Paragraph, Widget,
    Wrap,
};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::console::Console;
use crate::engine::{DashboardState, EngineStats};
use crate::registry::Widget as DashWidget;
use crate::todo::TodoList;

const CHART_HEIGHT: u16 = 12;

/// One full screen: todos and console on the left, widgets on the right,
/// a status line along the bottom.
pub struct DashboardView<'a> {
    state: &'a DashboardState,
}

impl<'a> DashboardView<'a> {
    pub fn new(state: &'a DashboardState) -> Self {
        Self { state }
    }
}

impl Widget for DashboardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [main, status] = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(area);
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(30), Constraint::Percentage(70)]).areas(main);
        let [todo_area, console_area] =
            Layout::vertical([Constraint::Percentage(60), Constraint::Percentage(40)]).areas(left);

        render_todos(&self.state.todos, todo_area, buf);
        render_console(&self.state.console, console_area, buf);
        render_widgets(self.state, right, buf);
        render_status(&self.state.stats, status, buf);
    }
}

fn render_widgets(state: &DashboardState, area: Rect, buf: &mut Buffer) {
    if state.widgets.is_empty() {
        Paragraph::new("Loading...")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL))
            .render(area, buf);
        return;
    }

    let widgets: Vec<&DashWidget> = state.widgets.iter().collect();
    let constraints: Vec<Constraint> = widgets.iter().map(|w| height_of(&w.payload)).collect();
    let slots = Layout::vertical(constraints).split(area);
    for (widget, slot) in widgets.into_iter().zip(slots.iter()) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(widget.key.label());
        match &widget.payload {
            Payload::Text(text) => render_text(text, false, block, *slot, buf),
            Payload::Big(text) => render_text(text, true, block, *slot, buf),
            Payload::ColorText(text) => render_color_text(text, block, *slot, buf),
            Payload::Image(image) => render_image(image, block, *slot, buf),
            Payload::Chart(chart) => render_chart(chart, block, *slot, buf),
            _ => {}
        }
    }
}

fn height_of(payload: &Payload) -> Constraint {
    match payload {
        Payload::Text(text) => Constraint::Length(text.text.lines().count().max(1) as u16 + 2),
        Payload::Big(_) => Constraint::Length(5),
        Payload::ColorText(text) => Constraint::Length(text.lines().len().max(1) as u16 + 2),
        Payload::Chart(_) => Constraint::Min(CHART_HEIGHT),
        _ => Constraint::Length(3),
    }
}

fn render_text(text: &TextPayload, big: bool, block: Block<'_>, area: Rect, buf: &mut Buffer) {
    let style = Style::default().fg(parse_color(text.color()));
    let (content, style, block) = if big {
        (
            text.text.to_uppercase(),
            style.add_modifier(Modifier::BOLD),
            block.padding(Padding::vertical(1)),
        )
    } else {
        (text.text.clone(), style, block)
    };
    Paragraph::new(content)
        .style(style)
        .alignment(alignment(text.align()))
        .wrap(Wrap { trim: false })
        .block(block)
        .render(area, buf);
}

fn render_color_text(text: &ColorTextPayload, block: Block<'_>, area: Rect, buf: &mut Buffer) {
    let color = parse_color(text.color());
    let lines: Vec<Line> = text
        .lines()
        .iter()
        .map(|line| Line::from(Span::styled(line.text.clone(), line_style(line, color))))
        .collect();
    Paragraph::new(Text::from(lines))
        .alignment(alignment(text.align()))
        .block(block)
        .render(area, buf);
}

fn line_style(line: &StyledLine, color: Color) -> Style {
    let mut style = Style::default().fg(color);
    for (set, modifier) in [
        (line.is_bold(), Modifier::BOLD),
        (line.is_underline(), Modifier::UNDERLINED),
        (line.is_italic(), Modifier::ITALIC),
        (line.is_crossline(), Modifier::CROSSED_OUT),
    ] {
        if set {
            style = style.add_modifier(modifier);
        }
    }
    style
}

fn render_image(image: &ImagePayload, block: Block<'_>, area: Rect, buf: &mut Buffer) {
    Paragraph::new(format!("[image] {}", image.filepath))
        .style(Style::default().add_modifier(Modifier::DIM))
        .block(block)
        .render(area, buf);
}

fn render_chart(chart: &ChartPayload, block: Block<'_>, area: Rect, buf: &mut Buffer) {
    let points: Vec<(f64, f64)> = chart.visible_points().copied().collect();
    let mut dataset = Dataset::default()
        .marker(marker(chart.marker_type()))
        .graph_type(graph_type(chart.graph_type()))
        .style(Style::default().fg(parse_color(chart.color())))
        .data(&points);
    if let Some(name) = &chart.name {
        dataset = dataset.name(name.clone());
    }
    let block = match &chart.description {
        Some(description) if !description.is_empty() => {
            block.title_bottom(Line::from(description.clone()).alignment(Alignment::Right))
        }
        _ => block,
    };

    let (x_min, x_max) = chart.x_bounds();
    let (y_min, y_max) = chart.y_bounds();
    Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title(chart.x_title.clone().unwrap_or_default())
                .style(Style::default().fg(parse_color(chart.x_color())))
                .bounds([x_min, x_max])
                .labels(axis_labels(chart.x_labels(), (x_min, x_max))),
        )
        .y_axis(
            Axis::default()
                .title(chart.y_title.clone().unwrap_or_default())
                .style(Style::default().fg(parse_color(chart.y_color())))
                .bounds([y_min, y_max])
                .labels(axis_labels(chart.y_labels(), (y_min, y_max))),
        )
        .render(area, buf);
}

/// Explicit labels win; otherwise label both ends and the midpoint.
fn axis_labels(labels: &[String], (min, max): (f64, f64)) -> Vec<Span<'static>> {
    if !labels.is_empty() {
        return labels.iter().cloned().map(Span::raw).collect();
    }
    [min, (min + max) / 2.0, max]
        .into_iter()
        .map(|value| Span::raw(format!("{value:.1}")))
        .collect()
}

fn render_todos(todos: &TodoList, area: Rect, buf: &mut Buffer) {
    let items: Vec<ListItem> = todos
        .iter()
        .map(|item| {
            let (mark, style) = if item.done {
                (
                    "[x] ",
                    Style::default().add_modifier(Modifier::CROSSED_OUT | Modifier::DIM),
                )
            } else {
                ("[ ] ", Style::default())
            };
            let mut lines = vec![Line::from(vec![
                Span::raw(mark),
                Span::styled(item.text.clone(), style),
            ])];
            let mut details = Vec::new();
            if !item.by.is_empty() {
                details.push(format!("by {}", item.by));
            }
            if let Some(deadline) = format_deadline(item.deadline) {
                details.push(deadline);
            }
            if !details.is_empty() {
                lines.push(Line::styled(
                    format!("    {}", details.join(" · ")),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(lines)
        })
        .collect();
    List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Todo ({})", todos.len())),
        )
        .render(area, buf);
}

/// Deadlines are epoch seconds; zero means none was given.
fn format_deadline(deadline: i64) -> Option<String> {
    if deadline == 0 {
        return None;
    }
    let formatted = OffsetDateTime::from_unix_timestamp(deadline)
        .ok()
        .and_then(|at| {
            at.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .ok()
        })
        .unwrap_or_else(|| deadline.to_string());
    Some(formatted)
}

fn render_console(console: &Console, area: Rect, buf: &mut Buffer) {
    let visible = area.height.saturating_sub(2) as usize;
    let skip = console.len().saturating_sub(visible);
    let lines: Vec<Line> = console
        .iter()
        .skip(skip)
        .map(|line| {
            let style = if line.stderr {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            Line::styled(line.text.clone(), style)
        })
        .collect();
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Console"))
        .render(area, buf);
}

fn render_status(stats: &EngineStats, area: Rect, buf: &mut Buffer) {
    let mut spans = vec![Span::raw(format!(
        " applied {} · ignored {} · skipped {}",
        stats.applied, stats.ignored, stats.skipped
    ))];
    if let Some(error) = &stats.last_error {
        spans.push(Span::styled(
            format!(" · last error: {error}"),
            Style::default().fg(Color::Red),
        ));
    }
    if stats.source_closed {
        spans.push(Span::styled(
            " · input closed",
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::styled(
        " · q/Esc to quit",
        Style::default().fg(Color::DarkGray),
    ));
    Paragraph::new(Line::from(spans)).render(area, buf);
}

fn parse_color(name: &str) -> Color {
    name.parse().unwrap_or(Color::White)
}

fn alignment(align: Align) -> Alignment {
    match align {
        Align::Left => Alignment::Left,
        Align::Center => Alignment::Center,
        Align::Right => Alignment::Right,
    }
}

fn graph_type(graph: ChartGraph) -> GraphType {
    match graph {
        ChartGraph::Line => GraphType::Line,
        ChartGraph::Scatter => GraphType::Scatter,
        ChartGraph::Bar => GraphType::Bar,
    }
}

fn marker(marker: MarkerType) -> symbols::Marker {
    match marker {
        MarkerType::Braille => symbols::Marker::Braille,
        MarkerType::Dot => symbols::Marker::Dot,
        MarkerType::Block => symbols::Marker::Block,
        MarkerType::Bar => symbols::Marker::Bar,
        MarkerType::HalfBlock => symbols::Marker::HalfBlock,
    }
}
