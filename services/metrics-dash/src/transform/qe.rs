// services/metrics-dash/src/transform/qe.rs
//
// QE payload to cards, bar charts and the PR delivery heatmap.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

use super::chart::{ChartData, Dataset, MetricCard};
use super::format::{display_number, Sentiment};
use super::{number, records, text};
use crate::date_range::{format_date_to_iso, parse_api_date};
use crate::table::sort::compare_text;
use crate::table::SortDirection;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QeCards {
    pub highest_failures: MetricCard,
    pub longest_automation: MetricCard,
}

pub fn transform_for_metric_cards(qe: &Value) -> Option<QeCards> {
    if !qe.is_object() {
        return None;
    }
    let failures = &qe["repo_with_highest_automation_failures"];
    let longest = &qe["repo_with_longest_automation"];
    let upper_repo = |section: &Value| {
        text(section, "repo")
            .map(str::to_uppercase)
            .unwrap_or_else(|| "N/A".to_string())
    };

    Some(QeCards {
        highest_failures: MetricCard::new(
            "Repository with Highest Test Failure Rate",
            format!(
                "{} ({}%)",
                upper_repo(failures),
                display_number(number(failures, "failure_percentage"))
            ),
        )
        .subtitle(format!(
            "{} total failures",
            display_number(number(failures, "failure_count"))
        ))
        .trend(Sentiment::Negative),
        longest_automation: MetricCard::new(
            "Repository with Longest Average Test Duration",
            format!(
                "{} ({}m)",
                upper_repo(longest),
                display_number(number(longest, "avg_automation_duration_mins").round())
            ),
        )
        .subtitle("Average automation duration"),
    })
}

pub fn transform_for_automation_duration_chart(repos_with_automation_avg_duration: &Value) -> Option<ChartData> {
    let items = records(repos_with_automation_avg_duration)?;
    let labels = items
        .iter()
        .map(|item| text(item, "repo").unwrap_or_default().to_uppercase())
        .collect();
    let data = items
        .iter()
        .map(|item| number(item, "avg_automation_duration_mins").round())
        .collect();
    Some(ChartData::new(
        labels,
        vec![Dataset::bar("Avg Duration (mins)", data, "#3B82F6")],
    ))
}

pub fn transform_for_failures_chart(repos_with_failures: &Value) -> Option<ChartData> {
    let items = records(repos_with_failures)?;
    let labels = items
        .iter()
        .map(|item| text(item, "repo").unwrap_or_default().to_uppercase())
        .collect();
    let data = items.iter().map(|item| number(item, "failure_percentage")).collect();
    Some(ChartData::new(
        labels,
        vec![Dataset::bar("Failure Percentage (%)", data, "#EF4444")],
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TicketRef {
    pub id: String,
    pub url: String,
}

/// One (repository, day) intersection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapCell {
    /// Day index into `Heatmap::days`.
    pub x: usize,
    /// Repository index into `Heatmap::repos`.
    pub y: usize,
    pub repo: String,
    pub date: NaiveDate,
    pub count: usize,
    pub tickets: Vec<TicketRef>,
    pub developers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Heatmap {
    /// ISO dates, every day of the window.
    pub days: Vec<String>,
    /// Repositories seen in the window, alphabetical.
    pub repos: Vec<String>,
    /// Row-major by repository, then day.
    pub cells: Vec<HeatmapCell>,
}

impl Heatmap {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn max_count(&self) -> usize {
        self.cells.iter().map(|cell| cell.count).max().unwrap_or(0)
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&HeatmapCell> {
        self.cells.get(y * self.days.len() + x)
    }
}

struct MergeEvent<'a> {
    repo: &'a str,
    date: NaiveDate,
    raw: &'a Value,
}

/// Repository-by-day matrix of merge events inside `[start, end]`, both
/// ends inclusive. Every day of the window gets a column, event or not.
pub fn transform_for_heatmap(events: &Value, iso_start_date: &str, iso_end_date: &str) -> Option<Heatmap> {
    let items = records(events)?;
    let start = parse_api_date(iso_start_date)?;
    let end = parse_api_date(iso_end_date)?;

    let in_window: Vec<MergeEvent<'_>> = items
        .iter()
        .filter_map(|raw| {
            let repo = text(raw, "repo")?;
            let date = parse_api_date(text(raw, "merged_date")?)?;
            (start <= date && date <= end).then_some(MergeEvent { repo, date, raw })
        })
        .collect();

    if in_window.is_empty() {
        return Some(Heatmap::default());
    }

    let days: Vec<NaiveDate> = start.iter_days().take_while(|day| *day <= end).collect();

    let mut repos: Vec<&str> = in_window.iter().map(|event| event.repo).collect();
    repos.sort_unstable();
    repos.dedup();

    let mut cells = Vec::with_capacity(repos.len() * days.len());
    for (y, repo) in repos.iter().enumerate() {
        for (x, day) in days.iter().enumerate() {
            let matching: Vec<&MergeEvent<'_>> = in_window
                .iter()
                .filter(|event| event.repo == *repo && event.date == *day)
                .collect();

            let tickets = matching
                .iter()
                .filter_map(|event| {
                    Some(TicketRef {
                        id: text(event.raw, "jira_id")?.to_string(),
                        url: text(event.raw, "jira_url")?.to_string(),
                    })
                })
                .collect();

            let mut developers: Vec<String> = Vec::new();
            for event in &matching {
                if let Some(author) = text(event.raw, "author") {
                    if !developers.iter().any(|d| d == author) {
                        developers.push(author.to_string());
                    }
                }
            }

            cells.push(HeatmapCell {
                x,
                y,
                repo: repo.to_string(),
                date: *day,
                count: matching.len(),
                tickets,
                developers,
            });
        }
    }

    Some(Heatmap {
        days: days.into_iter().map(format_date_to_iso).collect(),
        repos: repos.into_iter().map(str::to_string).collect(),
        cells,
    })
}

/// Shade in `[0, 1]` relative to the busiest cell.
pub fn heatmap_intensity(value: usize, max_value: usize) -> f64 {
    if value == 0 || max_value == 0 {
        return 0.0;
    }
    (value as f64 / max_value as f64).min(1.0)
}

pub fn heatmap_tooltip(cell: &HeatmapCell) -> String {
    let plural = if cell.count == 1 { "" } else { "s" };
    let mut tooltip = format!(
        "{}\n{}\n{} PR{}",
        cell.repo.to_uppercase(),
        cell.date.format("%a, %b %-d"),
        cell.count,
        plural
    );
    if !cell.developers.is_empty() {
        tooltip.push_str(&format!("\nDevelopers: {}", cell.developers.join(", ")));
    }
    tooltip
}

pub fn repo_display_name(repo: Option<&str>) -> String {
    match repo.filter(|name| !name.is_empty()) {
        Some(name) => name.to_uppercase().replace('-', " "),
        None => "Unknown Repository".to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepoSortKey {
    #[default]
    Name,
    Duration,
    Failures,
}

/// Copy of `repos` ordered by name, automation duration or failure count.
/// Anything but an array gives an empty list.
pub fn sort_repositories(repos: &Value, by: RepoSortKey, direction: SortDirection) -> Vec<Value> {
    let Some(items) = records(repos) else {
        return Vec::new();
    };
    let mut sorted = items.clone();
    sorted.sort_by(|a, b| {
        let ordering = match by {
            RepoSortKey::Name => compare_text(
                a.get("repo").and_then(Value::as_str).unwrap_or_default(),
                b.get("repo").and_then(Value::as_str).unwrap_or_default(),
            ),
            RepoSortKey::Duration => number(a, "avg_automation_duration_mins")
                .partial_cmp(&number(b, "avg_automation_duration_mins"))
                .unwrap_or(Ordering::Equal),
            RepoSortKey::Failures => number(a, "failure_count")
                .partial_cmp(&number(b, "failure_count"))
                .unwrap_or(Ordering::Equal),
        };
        direction.apply(ordering)
    });
    sorted
}
