// services/metrics-dash/src/transform/contributors.rs
//
// Contributor leaderboards and charts.

use serde::Serialize;
use serde_json::Value;

use super::chart::{ChartData, Dataset, PreparedChart};
use super::{number, records, text};
use crate::date_range::parse_api_date;

pub const CONTRIBUTOR_COLORS: [&str; 5] = ["#4169E1", "#E9963C", "#5CB85C", "#5BC0DE", "#F0AD4E"];
pub const COLLABORATOR_COLORS: [&str; 5] = ["#5C6BC0", "#42A5F5", "#26A69A", "#66BB6A", "#FFCA28"];

const MERGED_COLOR: &str = "#26A69A";
const CHANGES_REQUESTED_COLOR: &str = "#8E44AD";
const REVIEW_TIME_COLOR: &str = "#4285F4";
const RESPONSE_TIME_COLOR: &str = "#4169E1";

/// Which count a leaderboard ranks by. Each kind reads exactly one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CountKind {
    Reviews,
    PrsDelivered,
    UniqueReposReviewed,
    PrsFlagged,
}

impl CountKind {
    pub fn field(&self) -> &'static str {
        match self {
            CountKind::Reviews => "reviews",
            CountKind::PrsDelivered => "prs_delivered",
            CountKind::UniqueReposReviewed => "unique_repos_reviewed",
            CountKind::PrsFlagged => "prs_flagged",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CountKind::Reviews => "reviews",
            CountKind::PrsDelivered => "PRs delivered",
            CountKind::UniqueReposReviewed => "repos reviewed",
            CountKind::PrsFlagged => "PRs flagged",
        }
    }

    pub fn palette(&self) -> &'static [&'static str] {
        match self {
            CountKind::UniqueReposReviewed => &COLLABORATOR_COLORS,
            _ => &CONTRIBUTOR_COLORS,
        }
    }

    fn placeholder(&self) -> &'static str {
        match self {
            CountKind::UniqueReposReviewed => "No collaborator data available",
            _ => "No contributor data available",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CountedEntity {
    pub name: String,
    pub kind: CountKind,
    pub count: u64,
}

/// Rows of `raw` counted by `kind`, in payload order.
pub fn leaderboard(raw: &Value, kind: CountKind) -> Option<Vec<CountedEntity>> {
    let items = records(raw)?;
    Some(
        items
            .iter()
            .map(|item| CountedEntity {
                name: text(item, "name").unwrap_or("Unknown").to_string(),
                kind,
                count: number(item, kind.field()).max(0.0).round() as u64,
            })
            .collect(),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub name: String,
    pub count: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShareChart {
    pub chart: ChartData,
    pub legend: Vec<LegendEntry>,
    pub has_data: bool,
}

/// Doughnut of each entity's share plus a legend with whole percentages.
/// An empty board gives a single placeholder slice.
pub fn prepare_share_chart(entities: &[CountedEntity], kind: CountKind) -> ShareChart {
    let palette = kind.palette();
    if entities.is_empty() {
        return ShareChart {
            chart: ChartData::new(
                vec![kind.placeholder().to_string()],
                vec![Dataset::slices(vec![1.0], palette)],
            ),
            legend: Vec::new(),
            has_data: false,
        };
    }

    let total: u64 = entities.iter().map(|e| e.count).sum();
    let legend = entities
        .iter()
        .map(|entity| LegendEntry {
            name: entity.name.clone(),
            count: entity.count,
            percentage: if total > 0 {
                (entity.count as f64 / total as f64 * 100.0).round() as u32
            } else {
                0
            },
        })
        .collect();

    ShareChart {
        chart: ChartData::new(
            entities.iter().map(|e| e.name.clone()).collect(),
            vec![Dataset::slices(entities.iter().map(|e| e.count as f64).collect(), palette)],
        ),
        legend,
        has_data: true,
    }
}

pub fn prepare_fastest_reviewers(fastest_reviewers: &Value) -> PreparedChart {
    const LABEL: &str = "Avg. Response Time (hrs)";
    match records(fastest_reviewers).filter(|items| !items.is_empty()) {
        Some(items) => PreparedChart {
            chart: ChartData::new(
                items
                    .iter()
                    .map(|item| text(item, "name").unwrap_or("Unknown").to_string())
                    .collect(),
                vec![Dataset::bar(
                    LABEL,
                    items.iter().map(|item| number(item, "avg_response_time_hrs")).collect(),
                    RESPONSE_TIME_COLOR,
                )],
            ),
            has_data: true,
        },
        None => PreparedChart {
            chart: ChartData::new(
                vec!["No data available".to_string()],
                vec![Dataset::bar(LABEL, vec![0.0], RESPONSE_TIME_COLOR)],
            ),
            has_data: false,
        },
    }
}

/// `2025-04-15` reads `Apr 15`. Unparseable input is returned as is.
pub fn format_chart_date(date: &str) -> String {
    parse_api_date(date)
        .map(|d| d.format("%b %-d").to_string())
        .unwrap_or_else(|| date.to_string())
}

fn review_speed_datasets(merged: Vec<f64>, changes: Vec<f64>, review_time: Vec<f64>) -> Vec<Dataset> {
    vec![
        Dataset::bar("PRs Merged", merged, MERGED_COLOR),
        Dataset::bar("PRs with Changes Requested", changes, CHANGES_REQUESTED_COLOR),
        Dataset::line("Avg. Review Time (hrs)", review_time, REVIEW_TIME_COLOR),
    ]
}

/// Daily PR volume split into merged (70%) and changes-requested (30%)
/// bars, with the average review time as a line.
pub fn prepare_review_speed_chart(review_speed_chart: &Value) -> PreparedChart {
    let Some(items) = records(review_speed_chart).filter(|items| !items.is_empty()) else {
        return PreparedChart {
            chart: ChartData::new(
                vec!["No data available".to_string()],
                review_speed_datasets(vec![0.0], vec![0.0], vec![0.0]),
            ),
            has_data: false,
        };
    };

    let labels = items
        .iter()
        .map(|item| format_chart_date(text(item, "date").unwrap_or_default()))
        .collect();
    let volume: Vec<f64> = items.iter().map(|item| number(item, "pr_volume")).collect();

    PreparedChart {
        chart: ChartData::new(
            labels,
            review_speed_datasets(
                volume.iter().map(|v| (v * 0.7).round()).collect(),
                volume.iter().map(|v| (v * 0.3).round()).collect(),
                items.iter().map(|item| number(item, "avg_review_time_hrs")).collect(),
            ),
        ),
        has_data: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMetricsSource;
    use crate::source::Domain;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_leaderboard_reads_only_its_kind() {
        let raw = json!([
            {"name": "Jordan", "reviews": 28, "prs_delivered": 3},
            {"name": "Morgan", "prs_delivered": 25}
        ]);
        let board = leaderboard(&raw, CountKind::Reviews).unwrap();
        assert_eq!(board[0].count, 28);
        assert_eq!(board[1].count, 0);
        assert_eq!(board[1].kind, CountKind::Reviews);
        assert!(leaderboard(&Value::Null, CountKind::Reviews).is_none());
    }

    #[test]
    fn test_share_chart_percentages() {
        let payload = MockMetricsSource::payload(Domain::Contributors, "2025-04-30");
        let board = leaderboard(&payload["impactful_contributors"], CountKind::PrsDelivered).unwrap();
        let share = prepare_share_chart(&board, CountKind::PrsDelivered);

        assert!(share.has_data);
        assert_eq!(share.chart.labels, vec!["Alex Kim", "Morgan Chen", "Taylor Jones", "Jordan Smith"]);
        let percentages: Vec<u32> = share.legend.iter().map(|l| l.percentage).collect();
        assert_eq!(percentages, vec![33, 26, 22, 19]);
    }

    #[test]
    fn test_share_chart_placeholder() {
        let share = prepare_share_chart(&[], CountKind::UniqueReposReviewed);
        assert!(!share.has_data);
        assert_eq!(share.chart.labels, vec!["No collaborator data available"]);
        assert_eq!(share.chart.datasets[0].data, vec![1.0]);
        assert_eq!(share.chart.datasets[0].colors, vec![COLLABORATOR_COLORS[0]]);
    }

    #[test]
    fn test_review_speed_split() {
        let raw = json!([
            {"date": "2025-04-15", "pr_volume": 10, "avg_review_time_hrs": 6.1},
            {"date": "2025-04-16", "pr_volume": 18, "avg_review_time_hrs": 5.5}
        ]);
        let prepared = prepare_review_speed_chart(&raw);
        assert!(prepared.has_data);
        assert_eq!(prepared.chart.labels, vec!["Apr 15", "Apr 16"]);
        assert_eq!(prepared.chart.datasets[0].data, vec![7.0, 13.0]);
        assert_eq!(prepared.chart.datasets[1].data, vec![3.0, 5.0]);
        assert_eq!(prepared.chart.datasets[2].data, vec![6.1, 5.5]);

        let empty = prepare_review_speed_chart(&json!([]));
        assert!(!empty.has_data);
        assert_eq!(empty.chart.labels, vec!["No data available"]);
        assert_eq!(empty.chart.datasets.len(), 3);
    }

    #[test]
    fn test_fastest_reviewers() {
        let prepared = prepare_fastest_reviewers(&json!([{"name": "Taylor", "avg_response_time_hrs": 3.2}]));
        assert!(prepared.has_data);
        assert_eq!(prepared.chart.datasets[0].data, vec![3.2]);
        assert!(!prepare_fastest_reviewers(&Value::Null).has_data);
    }

    #[test]
    fn test_format_chart_date() {
        assert_eq!(format_chart_date("2025-04-05"), "Apr 5");
        assert_eq!(format_chart_date("soon"), "soon");
    }
}
