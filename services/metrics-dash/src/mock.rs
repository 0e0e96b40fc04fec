// services/metrics-dash/src/mock.rs
//
// Fixture source for demo mode. Serves canned payloads for every domain
// after a configurable delay, so the dashboard runs without a backend.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Duration as DayDelta;
use serde_json::{json, Value};
use svckit::{ApiError, CancellationHandle, FetchOutcome};
use tracing::debug;

use crate::date_range::{format_date_to_iso, parse_api_date};
use crate::source::{Domain, MetricsSource};

pub struct MockMetricsSource {
    delay: Duration,
}

impl MockMetricsSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn payload(domain: Domain, iso_end_date: &str) -> Value {
        match domain {
            Domain::Summary => summary(),
            Domain::Contributors => contributors(),
            Domain::PrTable => pr_table(),
            Domain::Cicd => cicd(),
            Domain::Qe => qe(iso_end_date),
        }
    }
}

#[async_trait]
impl MetricsSource for MockMetricsSource {
    async fn fetch(
        &self,
        domain: Domain,
        iso_start_date: &str,
        iso_end_date: &str,
        cancel: &CancellationHandle,
    ) -> Result<FetchOutcome<Value>, ApiError> {
        debug!(?domain, "Serving mock payload for {} .. {}", iso_start_date, iso_end_date);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Ok(FetchOutcome::Canceled),
            _ = tokio::time::sleep(self.delay) => {
                Ok(FetchOutcome::Completed(Self::payload(domain, iso_end_date)))
            }
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn summary() -> Value {
    json!({
        "total_prs": 145,
        "merged_prs": 122,
        "avg_pr_size": 154,
        "avg_review_time": "1 d 17 h",
        "avg_cycle_time": 2.5,
        "pr_to_prod": 98,
        "loc_to_prod": 12340,
        "repo_summary": {
            "it-web-aem-website": {"avg_pr_size": 136, "pr_count": 17, "avg_cycle_time": 118.98},
            "it-web-cart-checkout": {"avg_pr_size": 257, "pr_count": 3, "avg_cycle_time": 35.99},
            "it-web-payment-service": {"avg_pr_size": 4, "pr_count": 1, "avg_cycle_time": 12.84},
            "it-web-sap-commerce": {"avg_pr_size": 270, "pr_count": 3, "avg_cycle_time": 37.61},
            "it-web-services": {"avg_pr_size": 88, "pr_count": 3, "avg_cycle_time": 161.15}
        }
    })
}

#[allow(clippy::too_many_arguments)]
fn pr_row(
    row: u64,
    jira: &str,
    repo: &str,
    number: u64,
    state: &str,
    created: &str,
    requested: &str,
    merged: Option<&str>,
    author: &str,
) -> Value {
    json!({
        "rowNumber": row,
        "Jira_ID": jira,
        "Jira_URL": format!("https://example.atlassian.net/browse/{jira}"),
        "repository": repo,
        "PRNumber": format!("PR-{number}"),
        "PR_URL": format!("https://github.com/example/{repo}/pull/{number}"),
        "State": state,
        "CreatedDate": created,
        "ReviewRequestedTime": requested,
        "MergedDate": merged,
        "Author": author
    })
}

fn pr_table() -> Value {
    Value::Array(vec![
        pr_row(1, "ENG-123", "frontend-app", 456, "Merged", "2025-04-15T08:00:00Z", "2025-04-15T10:30:00Z", Some("2025-04-16T14:45:00Z"), "Alex Kim"),
        pr_row(2, "ENG-124", "backend-service", 457, "Review In Progress", "2025-04-16T08:40:00Z", "2025-04-16T09:15:00Z", None, "Jordan Smith"),
        pr_row(3, "ENG-125", "api-gateway", 458, "Changes Requested", "2025-04-17T09:05:00Z", "2025-04-17T11:45:00Z", None, "Taylor Jones"),
        pr_row(4, "ENG-126", "data-pipeline", 459, "Merged", "2025-04-18T13:10:00Z", "2025-04-18T14:30:00Z", Some("2025-04-19T09:20:00Z"), "Morgan Chen"),
        pr_row(5, "ENG-127", "frontend-app", 460, "Open", "2025-04-19T09:30:00Z", "2025-04-19T10:00:00Z", None, "Alex Kim"),
    ])
}

fn contributors() -> Value {
    json!({
        "top_reviewers": [
            {"name": "Jordan Smith", "reviews": 28},
            {"name": "Morgan Chen", "reviews": 25},
            {"name": "Alex Kim", "reviews": 22},
            {"name": "Taylor Jones", "reviews": 19}
        ],
        "impactful_contributors": [
            {"name": "Alex Kim", "prs_delivered": 35},
            {"name": "Morgan Chen", "prs_delivered": 28},
            {"name": "Taylor Jones", "prs_delivered": 24},
            {"name": "Jordan Smith", "prs_delivered": 20}
        ],
        "code_quality_champions": [
            {"name": "Morgan Chen", "prs_flagged": 12},
            {"name": "Jordan Smith", "prs_flagged": 10},
            {"name": "Taylor Jones", "prs_flagged": 8},
            {"name": "Alex Kim", "prs_flagged": 6}
        ],
        "fastest_reviewers": [
            {"name": "Taylor Jones", "avg_response_time_hrs": 3.2},
            {"name": "Morgan Chen", "avg_response_time_hrs": 4.1},
            {"name": "Jordan Smith", "avg_response_time_hrs": 4.8},
            {"name": "Alex Kim", "avg_response_time_hrs": 5.3}
        ],
        "cross_repo_champions": [
            {"name": "Morgan Chen", "unique_repos_reviewed": 8},
            {"name": "Jordan Smith", "unique_repos_reviewed": 6},
            {"name": "Taylor Jones", "unique_repos_reviewed": 5},
            {"name": "Alex Kim", "unique_repos_reviewed": 3}
        ],
        "review_speed_chart": [
            {"date": "2025-04-13", "pr_volume": 12, "avg_review_time_hrs": 5.2},
            {"date": "2025-04-14", "pr_volume": 15, "avg_review_time_hrs": 4.8},
            {"date": "2025-04-15", "pr_volume": 10, "avg_review_time_hrs": 6.1},
            {"date": "2025-04-16", "pr_volume": 18, "avg_review_time_hrs": 5.5},
            {"date": "2025-04-17", "pr_volume": 14, "avg_review_time_hrs": 4.9},
            {"date": "2025-04-18", "pr_volume": 16, "avg_review_time_hrs": 5.3},
            {"date": "2025-04-19", "pr_volume": 12, "avg_review_time_hrs": 4.7}
        ]
    })
}

fn cicd() -> Value {
    json!({
        "slowest_build_repo": {"repo": "SAP Commerce", "avg_build_time_mins": 14},
        "longest_pipeline_repo": {"repo": "AEM", "avg_total_pipeline_time_mins": 34},
        "pipeline_success_rate": {"total_runs": 200, "successful_runs": 190, "success_percentage": 95.0},
        "build_failure_rate": {"total_builds": 200, "failed_builds": 16, "failure_percentage": 8.0},
        "build_durations_by_repo": [
            {"repo": "AEM", "avg_build_duration_mins": 5},
            {"repo": "React", "avg_build_duration_mins": 9},
            {"repo": "Services", "avg_build_duration_mins": 12},
            {"repo": "SAP Commerce", "avg_build_duration_mins": 14}
        ],
        "pipeline_durations_by_repo": [
            {"repo": "AEM", "avg_pipeline_duration_mins": 34},
            {"repo": "React", "avg_pipeline_duration_mins": 28},
            {"repo": "Services", "avg_pipeline_duration_mins": 32}
        ],
        "stage_breakdown": [
            {"repo": "AEM", "stages": {"build": 5.2, "deploy": 3.1, "automation": 12.0}},
            {"repo": "React", "stages": {"build": 6.5, "deploy": 4.8, "automation": 10.3}}
        ],
        "stage_causing_most_failures": {"stage": "build", "failure_count": 42, "failure_percentage": 78.0},
        "stage_failure_distribution": [
            {"stage": "build", "failures": 42},
            {"stage": "automation", "failures": 12}
        ]
    })
}

/// Merge events are placed on the last days of the requested window so the
/// heatmap always has something to draw.
fn qe(iso_end_date: &str) -> Value {
    const EVENTS: [(&str, i64, &str); 12] = [
        ("it-web-api-automation", 1, "09:42:55"),
        ("it-web-services", 1, "18:11:23"),
        ("it-web-aem-website", 0, "02:15:49"),
        ("it-web-aem-website", 0, "14:48:23"),
        ("it-web-cart-checkout", 0, "14:57:41"),
        ("it-web-aem-website", 0, "10:07:58"),
        ("it-web-website-automation", 0, "14:52:56"),
        ("it-web-services", 2, "16:30:12"),
        ("it-web-api-automation", 2, "11:22:33"),
        ("it-web-cart-checkout", 3, "13:45:18"),
        ("it-web-aem-website", 3, "09:15:27"),
        ("it-web-website-automation", 4, "15:33:44"),
    ];

    let heatmap: Vec<Value> = match parse_api_date(iso_end_date) {
        Some(end) => EVENTS
            .iter()
            .map(|(repo, days_back, time)| {
                let day = format_date_to_iso(end - DayDelta::days(*days_back));
                json!({"repo": repo, "merged_date": format!("{day}T{time}Z")})
            })
            .collect(),
        None => Vec::new(),
    };

    json!({
        "repos_with_automation_avg_duration": [
            {"repo": "it-web-sap-commerce", "avg_automation_duration_mins": 0},
            {"repo": "it-web-aem-website", "avg_automation_duration_mins": 79.04},
            {"repo": "it-web-services", "avg_automation_duration_mins": 126.48},
            {"repo": "it-web-api-automation", "avg_automation_duration_mins": 45.32},
            {"repo": "it-web-cart-checkout", "avg_automation_duration_mins": 67.89}
        ],
        "repos_with_failures": [
            {"repo": "it-web-aem-website", "failure_count": 8, "failure_percentage": 100},
            {"repo": "it-web-services", "failure_count": 1, "failure_percentage": 100},
            {"repo": "it-web-cart-checkout", "failure_count": 3, "failure_percentage": 75}
        ],
        "repo_with_longest_automation": {"repo": "it-web-services", "avg_automation_duration_mins": 126.48},
        "repo_with_highest_automation_failures": {"repo": "it-web-aem-website", "failure_count": 8, "failure_percentage": 100},
        "pr_delivery_heatmap": heatmap
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::validate_payload;
    use svckit::create_cancellation_token;

    #[test]
    fn test_every_fixture_carries_required_fields() {
        for domain in Domain::ALL {
            let payload = MockMetricsSource::payload(domain, "2025-06-19");
            assert!(validate_payload(domain, &payload), "{domain:?} fixture incomplete");
        }
    }

    #[test]
    fn test_heatmap_follows_requested_end_date() {
        let payload = MockMetricsSource::payload(Domain::Qe, "2025-06-19");
        let events = payload["pr_delivery_heatmap"].as_array().unwrap();
        assert_eq!(events.len(), 12);
        assert_eq!(events[2]["merged_date"], "2025-06-19T02:15:49Z");
        assert_eq!(events[11]["merged_date"], "2025-06-15T15:33:44Z");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_waits_for_delay() {
        let source = MockMetricsSource::new(Duration::from_millis(100));
        let handle = create_cancellation_token();
        let outcome = source
            .fetch(Domain::PrTable, "2025-04-01", "2025-04-30", &handle)
            .await
            .unwrap();
        let rows = outcome.completed().unwrap();
        assert_eq!(rows.as_array().map(Vec::len), Some(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_honors_cancellation() {
        let source = MockMetricsSource::new(Duration::from_secs(5));
        let handle = create_cancellation_token();
        handle.cancel();
        let outcome = source
            .fetch(Domain::Summary, "2025-04-01", "2025-04-30", &handle)
            .await
            .unwrap();
        assert!(outcome.is_canceled());
    }
}
