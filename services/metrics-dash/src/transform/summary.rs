// services/metrics-dash/src/transform/summary.rs
//
// Headline cards and the per-repository chart for the dashboard view.

use serde_json::Value;

use super::chart::{ChartData, Dataset, MetricCard, PreparedChart};
use super::format::{display_number, format_cycle_time, format_number};
use super::number;

/// Falsy values (null, 0, empty string) read as the placeholder.
fn card_value(summary: &Value, key: &str, placeholder: &str) -> String {
    match summary.get(key) {
        Some(Value::Number(n)) if n.as_f64().unwrap_or(0.0) != 0.0 => {
            format_number(n.as_f64(), false)
        }
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => placeholder.to_string(),
    }
}

/// The seven headline cards of the overview, in display order.
pub fn transform_for_metric_cards(summary: &Value) -> Option<Vec<MetricCard>> {
    if !summary.is_object() {
        return None;
    }

    let cycle_time = match summary.get("avg_cycle_time") {
        Some(Value::Number(n)) if n.as_f64().unwrap_or(0.0) != 0.0 => format_cycle_time(n.as_f64()),
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => "--".to_string(),
    };

    Some(vec![
        MetricCard::new("Total PRs", card_value(summary, "total_prs", "0")),
        MetricCard::new("PRs Merged", card_value(summary, "merged_prs", "0")),
        MetricCard::new("Avg PR Size", card_value(summary, "avg_pr_size", "0")),
        MetricCard::new("Avg Review Time", card_value(summary, "avg_review_time", "--")),
        MetricCard::new("Avg Cycle Time", cycle_time),
        MetricCard::new("PRs to Production", card_value(summary, "pr_to_prod", "--")),
        MetricCard::new("LoC to Production", card_value(summary, "loc_to_prod", "--")),
    ])
}

const PR_COUNT_COLOR: &str = "#26A69A";
const PR_SIZE_COLOR: &str = "#EF5350";
const CYCLE_TIME_COLOR: &str = "#4285F4";

fn repo_datasets(counts: Vec<f64>, sizes: Vec<f64>, cycle_times: Vec<f64>) -> Vec<Dataset> {
    vec![
        Dataset::bar("PR Count", counts, PR_COUNT_COLOR),
        Dataset::bar("Avg PR Size", sizes, PR_SIZE_COLOR),
        Dataset::line("Avg Cycle Time (hrs)", cycle_times, CYCLE_TIME_COLOR),
    ]
}

/// Per-repository counts, sizes and cycle times. Repositories keep their
/// payload order.
pub fn prepare_repo_summary_chart(repo_summary: &Value) -> PreparedChart {
    let Some(repos) = repo_summary.as_object().filter(|repos| !repos.is_empty()) else {
        return PreparedChart {
            chart: ChartData::new(
                vec!["No data available".to_string()],
                repo_datasets(vec![0.0], vec![0.0], vec![0.0]),
            ),
            has_data: false,
        };
    };

    PreparedChart {
        chart: ChartData::new(
            repos.keys().cloned().collect(),
            repo_datasets(
                repos.values().map(|r| number(r, "pr_count")).collect(),
                repos.values().map(|r| number(r, "avg_pr_size")).collect(),
                repos.values().map(|r| number(r, "avg_cycle_time")).collect(),
            ),
        ),
        has_data: true,
    }
}

/// One-line caption for a repository row of the overview.
pub fn repo_caption(repo_summary: &Value, repo: &str) -> Option<String> {
    let entry = repo_summary.get(repo)?;
    Some(format!(
        "{} PRs, avg size {}, cycle {}h",
        display_number(number(entry, "pr_count")),
        display_number(number(entry, "avg_pr_size")),
        display_number(number(entry, "avg_cycle_time"))
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMetricsSource;
    use crate::source::Domain;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_metric_cards_from_fixture() {
        let payload = MockMetricsSource::payload(Domain::Summary, "2025-04-30");
        let cards = transform_for_metric_cards(&payload).unwrap();
        let values: Vec<&str> = cards.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(
            values,
            vec!["145", "122", "154", "1 d 17 h", "60 h 0 m", "98", "12,340"]
        );
    }

    #[test]
    fn test_metric_cards_placeholders() {
        let cards = transform_for_metric_cards(&json!({"total_prs": 0, "avg_review_time": null})).unwrap();
        assert_eq!(cards[0].value, "0");
        assert_eq!(cards[3].value, "--");
        assert_eq!(cards[4].value, "--");
        assert!(transform_for_metric_cards(&json!([])).is_none());
    }

    #[test]
    fn test_repo_summary_keeps_payload_order() {
        let raw = json!({
            "zeta": {"avg_pr_size": 10, "pr_count": 2, "avg_cycle_time": 5.5},
            "alpha": {"avg_pr_size": 20, "pr_count": 4, "avg_cycle_time": 1.0}
        });
        let prepared = prepare_repo_summary_chart(&raw);
        assert!(prepared.has_data);
        assert_eq!(prepared.chart.labels, vec!["zeta", "alpha"]);
        assert_eq!(prepared.chart.datasets[0].data, vec![2.0, 4.0]);
        assert_eq!(prepared.chart.datasets[2].data, vec![5.5, 1.0]);
        assert_eq!(repo_caption(&raw, "zeta").as_deref(), Some("2 PRs, avg size 10, cycle 5.5h"));

        let empty = prepare_repo_summary_chart(&json!({}));
        assert!(!empty.has_data);
        assert_eq!(empty.chart.labels, vec!["No data available"]);
    }
}
