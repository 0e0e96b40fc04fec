// services/metrics-dash/src/ui/views.rs
//
// One draw function per view. Transformers run on every frame against the
// hook snapshot; they are pure and the payloads are small.

use ratatui::{prelude::*, widgets::*};
use serde_json::Value;

use super::colors;
use super::widgets::{draw_chart, draw_heatmap, draw_metric_cards, draw_share_legend, draw_status, panel};
use crate::app::App;
use crate::date_range::format_api_timestamp_for_display;
use crate::source::Domain;
use crate::state::{Mounted, PrTableView, ViewStatus};
use crate::table::sort::SORTABLE_COLUMNS;
use crate::table::{SearchField, SortDirection};
use crate::transform::contributors::{self, CountKind};
use crate::transform::format::{display_number, format_duration};
use crate::transform::qe::{self, heatmap_tooltip, repo_display_name, sort_repositories, RepoSortKey};
use crate::transform::{cicd, summary, MetricCard};

pub(super) fn draw_view(frame: &mut Frame, area: Rect, app: &App) {
    let mounted = app.mounted();
    let status = mounted.status();

    match mounted {
        Mounted::PullRequests(view) => draw_pull_requests(frame, area, app, view, status),
        Mounted::Domain { view, inner } => {
            let domain = view.domain();
            let state = inner.snapshot();
            let data = match (status, state.data) {
                (ViewStatus::Ready, Some(data)) => data,
                _ => {
                    draw_status(frame, area, status, domain, state.error.as_deref());
                    return;
                }
            };
            match domain {
                Domain::Summary => draw_dashboard(frame, area, &data),
                Domain::Contributors => draw_contributors(frame, area, &data),
                Domain::Cicd => draw_cicd(frame, area, &data),
                Domain::Qe => draw_qe(frame, area, app, &data),
                Domain::PrTable => {}
            }
        }
    }
}

fn rows(area: Rect, constraints: &[Constraint]) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints.to_vec())
        .split(area)
}

fn columns(area: Rect, constraints: &[Constraint]) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints.to_vec())
        .split(area)
}

fn draw_dashboard(frame: &mut Frame, area: Rect, data: &Value) {
    let layout = rows(area, &[Constraint::Length(5), Constraint::Length(5), Constraint::Min(6)]);

    let cards = summary::transform_for_metric_cards(data).unwrap_or_default();
    let refs: Vec<&MetricCard> = cards.iter().collect();
    let (first, second) = refs.split_at(refs.len().min(4));
    draw_metric_cards(frame, layout[0], first);
    draw_metric_cards(frame, layout[1], second);

    let body = columns(layout[2], &[Constraint::Percentage(65), Constraint::Percentage(35)]);
    let repo_summary = &data["repo_summary"];
    let prepared = summary::prepare_repo_summary_chart(repo_summary);
    draw_chart(frame, body[0], "Repository Summary", &prepared.chart);

    let captions: Vec<ListItem> = repo_summary
        .as_object()
        .map(|repos| {
            repos
                .keys()
                .filter_map(|repo| {
                    let caption = summary::repo_caption(repo_summary, repo)?;
                    Some(ListItem::new(vec![
                        Line::from(Span::styled(repo.clone(), Style::default().fg(colors::WHITE).bold())),
                        Line::from(Span::styled(caption, Style::default().fg(colors::SILVER))),
                    ]))
                })
                .collect()
        })
        .unwrap_or_default();
    frame.render_widget(List::new(captions).block(panel("Repositories")), body[1]);
}

fn draw_contributors(frame: &mut Frame, area: Rect, data: &Value) {
    let layout = rows(area, &[Constraint::Percentage(45), Constraint::Percentage(55)]);

    let boards = [
        ("Top Reviewers", "top_reviewers", CountKind::Reviews),
        ("Impactful Contributors", "impactful_contributors", CountKind::PrsDelivered),
        ("Code Quality Champions", "code_quality_champions", CountKind::PrsFlagged),
        ("Cross-Repo Champions", "cross_repo_champions", CountKind::UniqueReposReviewed),
    ];
    let slots = columns(layout[0], &[Constraint::Ratio(1, 4); 4]);
    for ((title, key, kind), slot) in boards.into_iter().zip(slots.iter()) {
        let entities = contributors::leaderboard(&data[key], kind).unwrap_or_default();
        let share = contributors::prepare_share_chart(&entities, kind);
        let palette = kind.palette();
        if share.has_data {
            draw_share_legend(frame, *slot, &format!("{} ({})", title, kind.label()), &share.legend, palette);
        } else {
            let placeholder = share.chart.labels.first().cloned().unwrap_or_default();
            let note = Paragraph::new(placeholder)
                .style(Style::default().fg(colors::SILVER))
                .block(panel(title));
            frame.render_widget(note, *slot);
        }
    }

    let charts = columns(layout[1], &[Constraint::Percentage(40), Constraint::Percentage(60)]);
    let fastest = contributors::prepare_fastest_reviewers(&data["fastest_reviewers"]);
    draw_chart(frame, charts[0], "Fastest Reviewers", &fastest.chart);
    let speed = contributors::prepare_review_speed_chart(&data["review_speed_chart"]);
    draw_chart(frame, charts[1], "Review Speed", &speed.chart);
}

fn draw_cicd(frame: &mut Frame, area: Rect, data: &Value) {
    let layout = rows(area, &[Constraint::Length(6), Constraint::Percentage(50), Constraint::Min(6)]);

    if let Some(cards) = cicd::transform_for_metric_cards(data) {
        draw_metric_cards(frame, layout[0], &cards.all());
    }

    let durations = columns(layout[1], &[Constraint::Percentage(50), Constraint::Percentage(50)]);
    let build = cicd::transform_for_build_durations_chart(&data["build_durations_by_repo"]).unwrap_or_default();
    draw_chart(frame, durations[0], "Build Durations", &build);
    let pipeline = cicd::transform_for_pipeline_durations_chart(&data["pipeline_durations_by_repo"]).unwrap_or_default();
    draw_chart(frame, durations[1], "Pipeline Durations", &pipeline);

    let stages = columns(
        layout[2],
        &[Constraint::Percentage(45), Constraint::Percentage(25), Constraint::Percentage(30)],
    );
    let stacked = cicd::transform_for_stacked_bar_chart(&data["stage_breakdown"]).unwrap_or_default();
    draw_chart(frame, stages[0], "Stage Breakdown", &stacked);
    let pie = cicd::transform_for_pie_chart(&data["stage_failure_distribution"]).unwrap_or_default();
    draw_chart(frame, stages[1], "Failure Distribution", &pie);

    let worst = &data["stage_causing_most_failures"];
    let stage = worst.get("stage").and_then(Value::as_str).unwrap_or("build");
    let single = cicd::transform_for_horizontal_bar_chart(&data["stage_breakdown"], stage).unwrap_or_default();
    let title = format!(
        "{} ({} failures)",
        cicd::stage_label(stage),
        display_number(worst.get("failure_count").and_then(Value::as_f64).unwrap_or(0.0))
    );
    draw_chart(frame, stages[2], &title, &single);
}

fn draw_qe(frame: &mut Frame, area: Rect, app: &App, data: &Value) {
    let layout = rows(area, &[Constraint::Length(6), Constraint::Percentage(45), Constraint::Min(6)]);

    if let Some(cards) = qe::transform_for_metric_cards(data) {
        draw_metric_cards(frame, layout[0], &[&cards.highest_failures, &cards.longest_automation]);
    }

    let charts = columns(
        layout[1],
        &[Constraint::Percentage(35), Constraint::Percentage(30), Constraint::Percentage(35)],
    );
    let durations = qe::transform_for_automation_duration_chart(&data["repos_with_automation_avg_duration"])
        .unwrap_or_default();
    draw_chart(frame, charts[0], "Avg Automation Duration", &durations);
    let failures = qe::transform_for_failures_chart(&data["repos_with_failures"]).unwrap_or_default();
    draw_chart(frame, charts[1], "Automation Failures", &failures);
    draw_repo_table(frame, charts[2], app, data);

    let inputs = app.controller().inputs();
    let heatmap = qe::transform_for_heatmap(&data["pr_delivery_heatmap"], &inputs.iso_start_date, &inputs.iso_end_date)
        .unwrap_or_default();
    let bottom = columns(layout[2], &[Constraint::Min(40), Constraint::Length(34)]);
    let cursor = app.heatmap_cursor(&heatmap);
    draw_heatmap(frame, bottom[0], &heatmap, cursor);

    let detail: Vec<Line> = cursor
        .and_then(|(x, y)| heatmap.cell(x, y))
        .map(|cell| {
            let mut lines: Vec<Line> = heatmap_tooltip(cell).lines().map(|l| Line::from(l.to_string())).collect();
            for ticket in &cell.tickets {
                lines.push(Line::from(Span::styled(ticket.id.clone(), Style::default().fg(colors::GOLD))));
            }
            lines
        })
        .unwrap_or_else(|| vec![Line::from("Use arrow keys to inspect a day")]);
    let detail = Paragraph::new(detail)
        .style(Style::default().fg(colors::WHITE))
        .wrap(Wrap { trim: true })
        .block(panel("Details"));
    frame.render_widget(detail, bottom[1]);
}

fn draw_repo_table(frame: &mut Frame, area: Rect, app: &App, data: &Value) {
    let (key, direction) = app.qe_sort();
    let failures = data["repos_with_failures"].as_array().cloned().unwrap_or_default();
    let mut repos = data["repos_with_automation_avg_duration"].as_array().cloned().unwrap_or_default();
    for repo in repos.iter_mut() {
        let failure_count = failures
            .iter()
            .find(|f| f.get("repo") == repo.get("repo"))
            .map(|f| f["failure_count"].clone())
            .unwrap_or(Value::from(0));
        if let Some(fields) = repo.as_object_mut() {
            fields.insert("failure_count".to_string(), failure_count);
        }
    }
    let merged = sort_repositories(&Value::Array(repos), key, direction);

    let arrow = |column: RepoSortKey| if column == key { direction.arrow() } else { "" };
    let header = Row::new(vec![
        Cell::from(format!("Repository{}", arrow(RepoSortKey::Name))),
        Cell::from(format!("Duration{}", arrow(RepoSortKey::Duration))),
        Cell::from(format!("Failures{}", arrow(RepoSortKey::Failures))),
    ])
    .style(Style::default().fg(colors::GOLD).bold());

    let body: Vec<Row> = merged
        .iter()
        .map(|repo| {
            Row::new(vec![
                Cell::from(repo_display_name(repo.get("repo").and_then(Value::as_str))),
                Cell::from(format!(
                    "{}m",
                    display_number(repo.get("avg_automation_duration_mins").and_then(Value::as_f64).unwrap_or(0.0))
                )),
                Cell::from(display_number(repo.get("failure_count").and_then(Value::as_f64).unwrap_or(0.0))),
            ])
            .style(Style::default().fg(colors::WHITE))
        })
        .collect();

    let table = Table::new(
        body,
        [Constraint::Percentage(55), Constraint::Percentage(25), Constraint::Percentage(20)],
    )
    .header(header)
    .block(panel("Repositories"));
    frame.render_widget(table, area);
}

fn draw_pull_requests(frame: &mut Frame, area: Rect, app: &App, view: &PrTableView, status: ViewStatus) {
    let state = view.snapshot();
    let table = &view.table;
    let filters = table.filters();
    // A table with rows stays visible while a later request is in flight.
    if filters.total_count() == 0 || status == ViewStatus::Error {
        draw_status(frame, area, status, Domain::PrTable, state.error.as_deref());
        return;
    }

    let show_filters = filters.is_visible() || filters.has_active_filters() || view.editing_search;
    let layout = rows(
        area,
        &[
            Constraint::Length(if show_filters { 3 } else { 0 }),
            Constraint::Min(4),
            Constraint::Length(1),
        ],
    );

    if show_filters {
        let search = &filters.state().search;
        let mut spans = vec![
            Span::styled("State: ", Style::default().fg(colors::SILVER)),
            Span::styled(
                filters.state().state_filter.label().to_string(),
                Style::default().fg(colors::GOLD).bold(),
            ),
        ];
        for field in SearchField::ALL {
            let editing = view.editing_search && view.search_field == field;
            let value = search.get(field);
            let style = if editing {
                Style::default().fg(colors::BG_DARK).bg(colors::GOLD)
            } else {
                Style::default().fg(colors::WHITE)
            };
            spans.push(Span::styled(format!("   {}: ", field.label()), Style::default().fg(colors::SILVER)));
            spans.push(Span::styled(
                if editing { format!("{}_", value) } else { value.to_string() },
                style,
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)).block(panel("Filters")), layout[0]);
    }

    let sort = table.sort_config();
    let selected_key = SORTABLE_COLUMNS.get(app.sort_column()).map(|(key, _)| *key);
    let mut header_cells: Vec<Cell> = SORTABLE_COLUMNS
        .iter()
        .map(|(key, title)| {
            let mut text = title.to_string();
            if sort.key == *key {
                text.push_str(sort.direction.arrow());
            }
            let mut style = Style::default().fg(colors::GOLD).bold();
            if selected_key == Some(*key) {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            Cell::from(text).style(style)
        })
        .collect();
    header_cells.push(Cell::from("Review→Merge").style(Style::default().fg(colors::GOLD).bold()));

    let body: Vec<Row> = table
        .rows()
        .iter()
        .map(|row| {
            Row::new(vec![
                Cell::from(row.row_number.map(|n| n.to_string()).unwrap_or_default()),
                Cell::from(row.jira_id.clone().unwrap_or_default()),
                Cell::from(row.repository.clone().unwrap_or_default()),
                Cell::from(row.pr_number_text()),
                Cell::from(row.state.as_ref().map(|s| s.label().to_string()).unwrap_or_default()),
                Cell::from(format_api_timestamp_for_display(row.created_date.as_deref())),
                Cell::from(format_api_timestamp_for_display(row.merged_date.as_deref())),
                Cell::from(row.author.clone().unwrap_or_default()),
                Cell::from(format_duration(row.review_to_merge_ms())),
            ])
            .style(Style::default().fg(colors::WHITE))
        })
        .collect();

    let widths = [
        Constraint::Length(4),
        Constraint::Length(10),
        Constraint::Min(14),
        Constraint::Length(8),
        Constraint::Length(19),
        Constraint::Length(11),
        Constraint::Length(11),
        Constraint::Min(12),
        Constraint::Length(13),
    ];
    let title = match sort.direction {
        SortDirection::Asc => format!("Pull Requests (by {} ascending)", sort.key),
        SortDirection::Desc => format!("Pull Requests (by {} descending)", sort.key),
    };
    if table.rows().is_empty() {
        let note = Paragraph::new("No pull requests match the current filters")
            .style(Style::default().fg(colors::SILVER))
            .alignment(Alignment::Center)
            .block(panel(title));
        frame.render_widget(note, layout[1]);
    } else {
        let widget = Table::new(body, widths)
            .header(Row::new(header_cells))
            .column_spacing(1)
            .block(panel(title));
        frame.render_widget(widget, layout[1]);
    }

    let mut counts = format!(" Showing {} of {} pull requests", filters.filtered_count(), filters.total_count());
    if status == ViewStatus::Loading {
        counts.push_str("  (updating...)");
    }
    frame.render_widget(
        Paragraph::new(counts).style(Style::default().fg(colors::SILVER)),
        layout[2],
    );
}
