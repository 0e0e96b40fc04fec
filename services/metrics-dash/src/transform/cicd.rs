// services/metrics-dash/src/transform/cicd.rs
//
// CI/CD payload to charts and cards.

use serde::Serialize;
use serde_json::Value;

use super::chart::{ChartData, Dataset, MetricCard};
use super::format::{display_number, failure_rate_sentiment, success_rate_sentiment, Sentiment};
use super::{number, records, text};

const PIE_PALETTE: [&str; 5] = ["#8B5CF6", "#3B82F6", "#10B981", "#F59E0B", "#EF4444"];
const UNKNOWN_STAGE_COLOR: &str = "#6B7280";

fn stage_color(stage: &str) -> &'static str {
    match stage {
        "build" => "#3B82F6",
        "sonar" => "#10B981",
        "unit_test" => "#8B5CF6",
        "deploy" => "#F59E0B",
        _ => UNKNOWN_STAGE_COLOR,
    }
}

/// `unit_test` reads as `UNIT TEST`.
pub fn stage_label(stage: &str) -> String {
    stage.replacen('_', " ", 1).to_uppercase()
}

fn repo_labels(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| text(item, "repo").unwrap_or_default().to_uppercase())
        .collect()
}

/// Failure share per stage, each rounded to a whole percent. A zero total
/// yields all zeros.
pub fn transform_for_pie_chart(stage_failure_distribution: &Value) -> Option<ChartData> {
    let items = records(stage_failure_distribution)?;

    let labels = items
        .iter()
        .map(|item| stage_label(text(item, "stage").unwrap_or_default()))
        .collect();
    let failures: Vec<f64> = items.iter().map(|item| number(item, "failures")).collect();
    let total: f64 = failures.iter().sum();
    let percentages = failures
        .iter()
        .map(|value| if total > 0.0 { (value / total * 100.0).round() } else { 0.0 })
        .collect();

    Some(ChartData::new(labels, vec![Dataset::slices(percentages, &PIE_PALETTE)]))
}

fn duration_chart(items: &Value, key: &str, label: &str, color: &str) -> Option<ChartData> {
    let items = records(items)?;
    let data = items.iter().map(|item| number(item, key)).collect();
    Some(ChartData::new(repo_labels(items), vec![Dataset::bar(label, data, color)]))
}

pub fn transform_for_build_durations_chart(build_durations_by_repo: &Value) -> Option<ChartData> {
    duration_chart(
        build_durations_by_repo,
        "avg_build_duration_mins",
        "Avg Build Duration (mins)",
        "#F59E0B",
    )
}

pub fn transform_for_pipeline_durations_chart(pipeline_durations_by_repo: &Value) -> Option<ChartData> {
    duration_chart(
        pipeline_durations_by_repo,
        "avg_pipeline_duration_mins",
        "Avg Pipeline Duration (mins)",
        "#3B82F6",
    )
}

/// Time spent in one `stage` per repository.
pub fn transform_for_horizontal_bar_chart(stage_breakdown: &Value, stage: &str) -> Option<ChartData> {
    let items = records(stage_breakdown)?;
    let data = items
        .iter()
        .map(|item| item.get("stages").map(|stages| number(stages, stage)).unwrap_or(0.0))
        .collect();
    Some(ChartData::new(
        repo_labels(items),
        vec![Dataset::bar(format!("{} Time (mins)", stage_label(stage)), data, "#8B5CF6")],
    ))
}

/// One dataset per stage seen in any repository, in order of first
/// appearance. Every dataset has a value for every repository.
pub fn transform_for_stacked_bar_chart(stage_breakdown: &Value) -> Option<ChartData> {
    let items = records(stage_breakdown)?;

    let mut stages: Vec<&str> = Vec::new();
    for item in items {
        if let Some(object) = item.get("stages").and_then(Value::as_object) {
            for key in object.keys() {
                if !stages.contains(&key.as_str()) {
                    stages.push(key);
                }
            }
        }
    }

    let datasets = stages
        .iter()
        .map(|stage| {
            let data = items
                .iter()
                .map(|item| item.get("stages").map(|s| number(s, stage)).unwrap_or(0.0))
                .collect();
            Dataset::bar(stage_label(stage), data, stage_color(stage))
        })
        .collect();

    Some(ChartData::new(repo_labels(items), datasets))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CicdCards {
    pub slowest_build: MetricCard,
    pub longest_pipeline: MetricCard,
    pub success_rate: MetricCard,
    pub failure_rate: MetricCard,
}

impl CicdCards {
    pub fn all(&self) -> [&MetricCard; 4] {
        [
            &self.slowest_build,
            &self.longest_pipeline,
            &self.success_rate,
            &self.failure_rate,
        ]
    }
}

fn repo_with_minutes(section: &Value, key: &str) -> String {
    let repo = text(section, "repo")
        .map(str::to_uppercase)
        .unwrap_or_else(|| "N/A".to_string());
    format!("{} ({}m)", repo, display_number(number(section, key)))
}

pub fn transform_for_metric_cards(cicd: &Value) -> Option<CicdCards> {
    if !cicd.is_object() {
        return None;
    }
    let success = &cicd["pipeline_success_rate"];
    let failure = &cicd["build_failure_rate"];

    let success_trend = success
        .get("success_percentage")
        .and_then(Value::as_f64)
        .map(success_rate_sentiment)
        .unwrap_or(Sentiment::Negative);
    let failure_trend = failure
        .get("failure_percentage")
        .and_then(Value::as_f64)
        .map(failure_rate_sentiment)
        .unwrap_or(Sentiment::Negative);

    Some(CicdCards {
        slowest_build: MetricCard::new(
            "Slowest Building Repo",
            repo_with_minutes(&cicd["slowest_build_repo"], "avg_build_time_mins"),
        )
        .subtitle("Average build duration"),
        longest_pipeline: MetricCard::new(
            "Longest Running Pipeline",
            repo_with_minutes(&cicd["longest_pipeline_repo"], "avg_total_pipeline_time_mins"),
        )
        .subtitle("Average pipeline duration"),
        success_rate: MetricCard::new(
            "Pipeline Success Rate",
            format!("{}%", display_number(number(success, "success_percentage"))),
        )
        .subtitle(format!(
            "{}/{} runs",
            display_number(number(success, "successful_runs")),
            display_number(number(success, "total_runs"))
        ))
        .trend(success_trend),
        failure_rate: MetricCard::new(
            "Build Failure Rate",
            format!("{}%", display_number(number(failure, "failure_percentage"))),
        )
        .subtitle(format!(
            "{}/{} builds",
            display_number(number(failure, "failed_builds")),
            display_number(number(failure, "total_builds"))
        ))
        .trend(failure_trend),
    })
}
