// services/metrics-dash/src/ui/widgets.rs
//
// Building blocks shared by the views: metric cards, charts built from
// ChartData, the delivery heatmap and the loading/error/empty panels.

use ratatui::{prelude::*, widgets::*};

use super::colors;
use crate::source::Domain;
use crate::state::ViewStatus;
use crate::transform::chart::parse_hex_color;
use crate::transform::contributors::LegendEntry;
use crate::transform::format::{display_number, Sentiment};
use crate::transform::qe::{heatmap_intensity, Heatmap};
use crate::transform::{ChartData, MetricCard, SeriesKind};

/// Bars carry two decimals of precision in their integer length.
const BAR_SCALE: f64 = 100.0;

/// `#RRGGBB` as a terminal color; anything else reads as silver.
pub fn hex_color(hex: &str) -> Color {
    parse_hex_color(hex)
        .map(|(r, g, b)| Color::Rgb(r, g, b))
        .unwrap_or(colors::SILVER)
}

pub(super) fn panel<'a>(title: impl Into<String>) -> Block<'a> {
    Block::default()
        .title(Span::styled(
            format!(" {} ", title.into()),
            Style::default().fg(colors::GOLD).bold(),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::DARK_GOLD))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL))
}

fn sentiment_color(sentiment: Sentiment) -> Color {
    match sentiment {
        Sentiment::Positive => colors::SUCCESS,
        Sentiment::Negative => colors::ERROR,
        Sentiment::Neutral => colors::WHITE,
    }
}

pub(super) fn draw_metric_card(frame: &mut Frame, area: Rect, card: &MetricCard) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::SILVER))
        .border_type(BorderType::Rounded)
        .style(Style::default().bg(colors::BG_PANEL));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut text = vec![
        Line::from(Span::styled(
            card.title.as_str(),
            Style::default().fg(colors::SILVER).add_modifier(Modifier::DIM),
        )),
        Line::from(Span::styled(
            card.value.as_str(),
            Style::default().fg(sentiment_color(card.trend)).add_modifier(Modifier::BOLD),
        )),
    ];
    if let Some(subtitle) = &card.subtitle {
        text.push(Line::from(Span::styled(
            subtitle.as_str(),
            Style::default().fg(colors::SILVER).add_modifier(Modifier::ITALIC),
        )));
    }

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, inner);
}

/// Cards side by side, equal widths.
pub(super) fn draw_metric_cards(frame: &mut Frame, area: Rect, cards: &[&MetricCard]) {
    if cards.is_empty() {
        return;
    }
    let constraints = vec![Constraint::Ratio(1, cards.len() as u32); cards.len()];
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);
    for (card, slot) in cards.iter().zip(slots.iter()) {
        draw_metric_card(frame, *slot, card);
    }
}

fn series_marker(kind: SeriesKind) -> &'static str {
    match kind {
        SeriesKind::Bar => "▇",
        SeriesKind::Line => "━",
        SeriesKind::Slice => "◔",
    }
}

fn chart_legend(chart: &ChartData) -> Line<'static> {
    let spans: Vec<Span> = chart
        .datasets
        .iter()
        .filter(|dataset| !dataset.label.is_empty())
        .flat_map(|dataset| {
            let color = dataset.color_at(0).map(hex_color).unwrap_or(colors::SILVER);
            [
                Span::styled(format!("{} ", series_marker(dataset.kind)), Style::default().fg(color)),
                Span::styled(format!("{}   ", dataset.label), Style::default().fg(colors::SILVER)),
            ]
        })
        .collect();
    Line::from(spans)
}

/// One horizontal bar group per label, one bar per dataset. Slices draw a
/// bar per label in its own color with the value shown as a percent.
pub(super) fn draw_chart(frame: &mut Frame, area: Rect, title: &str, chart: &ChartData) {
    let block = panel(title);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);
    frame.render_widget(Paragraph::new(chart_legend(chart)), rows[0]);

    let label_width = chart.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0).min(24) as u16;
    let mut bar_chart = BarChart::default()
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1)
        .label_style(Style::default().fg(colors::SILVER))
        .value_style(Style::default().fg(colors::BG_DARK).bold());

    let max = chart.datasets.iter().map(|d| d.max()).fold(0.0, f64::max);
    for (index, label) in chart.labels.iter().enumerate() {
        let bars: Vec<Bar> = chart
            .datasets
            .iter()
            .filter_map(|dataset| {
                let value = *dataset.data.get(index)?;
                let color = dataset.color_at(index).map(hex_color).unwrap_or(colors::SILVER);
                let text = match dataset.kind {
                    SeriesKind::Slice => format!("{}%", display_number(value)),
                    _ => display_number(value),
                };
                Some(
                    Bar::default()
                        .value((value.max(0.0) * BAR_SCALE).round() as u64)
                        .text_value(text)
                        .style(Style::default().fg(color)),
                )
            })
            .collect();
        let short: String = label.chars().take(label_width as usize).collect();
        bar_chart = bar_chart.data(BarGroup::default().label(Line::from(short)).bars(&bars));
    }
    if max > 0.0 {
        bar_chart = bar_chart.max((max * BAR_SCALE).round() as u64);
    }

    frame.render_widget(bar_chart, rows[1]);
}

/// Share legend: name, count and whole percent per entity.
pub(super) fn draw_share_legend(frame: &mut Frame, area: Rect, title: &str, legend: &[LegendEntry], palette: &[&str]) {
    let lines: Vec<Line> = legend
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let color = palette.get(index % palette.len().max(1)).map(|c| hex_color(c)).unwrap_or(colors::SILVER);
            Line::from(vec![
                Span::styled("● ", Style::default().fg(color)),
                Span::styled(entry.name.clone(), Style::default().fg(colors::WHITE)),
                Span::styled(
                    format!("  {} ({}%)", entry.count, entry.percentage),
                    Style::default().fg(colors::SILVER),
                ),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(panel(title)), area);
}

fn heat_color(intensity: f64) -> Color {
    let (r0, g0, b0) = (7.0, 30.0, 41.0);
    let (r1, g1, b1) = (255.0, 193.0, 37.0);
    let mix = |from: f64, to: f64| (from + (to - from) * intensity).round() as u8;
    Color::Rgb(mix(r0, r1), mix(g0, g1), mix(b0, b1))
}

/// Repositories down, days across. Each cell shows its PR count shaded by
/// the busiest cell.
pub(super) fn draw_heatmap(frame: &mut Frame, area: Rect, heatmap: &Heatmap, selected: Option<(usize, usize)>) {
    let block = panel("PR Delivery Heatmap");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if heatmap.is_empty() {
        let note = Paragraph::new("No merges in the selected range")
            .style(Style::default().fg(colors::SILVER))
            .alignment(Alignment::Center);
        frame.render_widget(note, inner);
        return;
    }

    let name_width = heatmap.repos.iter().map(|r| r.chars().count()).max().unwrap_or(0).min(28);
    let max = heatmap.max_count();
    let cell_width = 3usize;
    let visible_days = ((inner.width as usize).saturating_sub(name_width + 1) / cell_width).max(1);
    let first_day = heatmap.days.len().saturating_sub(visible_days);

    let mut lines = Vec::with_capacity(heatmap.repos.len() + 1);
    let mut header = vec![Span::raw(" ".repeat(name_width + 1))];
    for day in &heatmap.days[first_day..] {
        let label = day.get(8..10).unwrap_or("??");
        header.push(Span::styled(format!("{:>3}", label), Style::default().fg(colors::SILVER)));
    }
    lines.push(Line::from(header));

    for (y, repo) in heatmap.repos.iter().enumerate() {
        let name: String = repo.chars().take(name_width).collect();
        let mut spans = vec![Span::styled(
            format!("{:<width$} ", name, width = name_width),
            Style::default().fg(colors::WHITE),
        )];
        for x in first_day..heatmap.days.len() {
            let count = heatmap.cell(x, y).map(|cell| cell.count).unwrap_or(0);
            let mut style = Style::default().bg(heat_color(heatmap_intensity(count, max))).fg(colors::WHITE);
            if selected == Some((x, y)) {
                style = style.add_modifier(Modifier::REVERSED);
            }
            let text = if count == 0 { "   ".to_string() } else { format!("{:>2} ", count) };
            spans.push(Span::styled(text, style));
        }
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Loading, error and empty panels. Errors offer the retry key.
pub(super) fn draw_status(frame: &mut Frame, area: Rect, status: ViewStatus, domain: Domain, error: Option<&str>) {
    let lines = match status {
        ViewStatus::Loading => vec![Line::from(Span::styled(
            format!("Loading {} data...", domain.noun()),
            Style::default().fg(colors::GOLD).bold(),
        ))],
        ViewStatus::Error => vec![
            Line::from(Span::styled(
                error.map(str::to_string).unwrap_or_else(|| domain.error_message()),
                Style::default().fg(colors::ERROR).bold(),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(" [T] ", Style::default().fg(colors::BG_DARK).bg(colors::RED)),
                Span::styled(" Retry ", Style::default().fg(colors::SILVER)),
            ]),
        ],
        ViewStatus::Empty => vec![Line::from(Span::styled(
            domain.empty_message(),
            Style::default().fg(colors::SILVER),
        ))],
        ViewStatus::Ready => return,
    };

    let top = area.height.saturating_sub(lines.len() as u16 + 2) / 2;
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(panel(domain.noun().to_uppercase()).padding(Padding::top(top)));
    frame.render_widget(paragraph, area);
}
