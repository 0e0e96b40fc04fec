// services/metrics-dash/src/source.rs
//
// Metric domains and the source seam the fetch hooks call through.
// HttpMetricsSource talks to the backend; MockMetricsSource (mock.rs)
// serves fixtures.
//

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use svckit::config::{ApiConfig, Endpoints, RequestTypes};
use svckit::{ApiClient, ApiError, CancellationHandle, FetchOutcome};

use crate::config::DashConfig;
use crate::date_range::format_date_to_compact;
use crate::errors::DashError;

/// One metric category with its own payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Summary,
    Contributors,
    PrTable,
    Cicd,
    Qe,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Summary,
        Domain::Contributors,
        Domain::PrTable,
        Domain::Cicd,
        Domain::Qe,
    ];

    /// Noun used in user-facing copy.
    pub fn noun(&self) -> &'static str {
        match self {
            Domain::Summary => "dashboard",
            Domain::Contributors => "contributor",
            Domain::PrTable => "PR",
            Domain::Cicd => "CICD",
            Domain::Qe => "QE",
        }
    }

    pub fn error_message(&self) -> String {
        format!("Failed to fetch {} data. Please try again later.", self.noun())
    }

    pub fn empty_message(&self) -> String {
        format!("No {} data available for the selected date range", self.noun())
    }

    /// Top-level keys a payload must carry to be rendered at all.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            Domain::Summary => &[
                "total_prs",
                "merged_prs",
                "avg_pr_size",
                "avg_review_time",
                "avg_cycle_time",
                "pr_to_prod",
                "loc_to_prod",
                "repo_summary",
            ],
            Domain::Contributors => &[
                "top_reviewers",
                "impactful_contributors",
                "code_quality_champions",
                "fastest_reviewers",
                "cross_repo_champions",
                "review_speed_chart",
            ],
            Domain::PrTable => &[],
            Domain::Cicd => &[
                "slowest_build_repo",
                "longest_pipeline_repo",
                "pipeline_success_rate",
                "build_failure_rate",
                "build_durations_by_repo",
                "pipeline_durations_by_repo",
                "stage_breakdown",
                "stage_causing_most_failures",
                "stage_failure_distribution",
            ],
            Domain::Qe => &[
                "repo_with_highest_automation_failures",
                "repo_with_longest_automation",
                "repos_with_automation_avg_duration",
                "repos_with_failures",
                "pr_delivery_heatmap",
            ],
        }
    }

    pub fn endpoint<'a>(&self, endpoints: &'a Endpoints) -> &'a str {
        match self {
            Domain::Summary => &endpoints.summary,
            Domain::Contributors => &endpoints.contributors,
            Domain::PrTable => &endpoints.pr_table,
            Domain::Cicd => &endpoints.cicd,
            Domain::Qe => &endpoints.qe,
        }
    }

    pub fn request_type<'a>(&self, request_types: &'a RequestTypes) -> &'a str {
        match self {
            Domain::Summary => &request_types.summary,
            Domain::Contributors => &request_types.contributors,
            Domain::PrTable => &request_types.pr_details,
            Domain::Cicd => &request_types.cicd_metrics,
            Domain::Qe => &request_types.qe_metrics,
        }
    }
}

/// Where a hook gets its raw JSON from.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn fetch(
        &self,
        domain: Domain,
        iso_start_date: &str,
        iso_end_date: &str,
        cancel: &CancellationHandle,
    ) -> Result<FetchOutcome<Value>, ApiError>;

    fn name(&self) -> &str;
}

/// Backend source. URLs and request types come from configuration.
pub struct HttpMetricsSource {
    client: ApiClient,
    api: ApiConfig,
}

impl HttpMetricsSource {
    pub fn new(config: &DashConfig) -> Result<Self, DashError> {
        let client = ApiClient::new(&config.api.base_url, config.api_timeout())?;
        Ok(Self {
            client,
            api: config.api.clone(),
        })
    }

    pub fn query_params(&self, domain: Domain, iso_start_date: &str, iso_end_date: &str) -> Vec<(&'static str, String)> {
        vec![
            ("startDate", format_date_to_compact(iso_start_date)),
            ("endDate", format_date_to_compact(iso_end_date)),
            ("reqType", domain.request_type(&self.api.request_types).to_string()),
        ]
    }
}

#[async_trait]
impl MetricsSource for HttpMetricsSource {
    async fn fetch(
        &self,
        domain: Domain,
        iso_start_date: &str,
        iso_end_date: &str,
        cancel: &CancellationHandle,
    ) -> Result<FetchOutcome<Value>, ApiError> {
        let params = self.query_params(domain, iso_start_date, iso_end_date);
        self.client
            .get_json(domain.endpoint(&self.api.endpoints), &params, cancel)
            .await
    }

    fn name(&self) -> &str {
        self.client.base_url()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted sources for exercising hooks without a backend.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub domain: Domain,
        pub iso_start_date: String,
        pub iso_end_date: String,
    }

    /// Answers every call immediately with `respond(call_index)`.
    pub struct CountingSource {
        calls: Mutex<Vec<RecordedCall>>,
        respond: Box<dyn Fn(usize) -> Result<Value, u16> + Send + Sync>,
    }

    impl CountingSource {
        pub fn new(respond: impl Fn(usize) -> Result<Value, u16> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                respond: Box::new(respond),
            })
        }

        pub fn returning(value: Value) -> Arc<Self> {
            Self::new(move |_| Ok(value.clone()))
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl MetricsSource for CountingSource {
        async fn fetch(
            &self,
            domain: Domain,
            iso_start_date: &str,
            iso_end_date: &str,
            cancel: &CancellationHandle,
        ) -> Result<FetchOutcome<Value>, ApiError> {
            let index = {
                let mut calls = self.calls.lock();
                calls.push(RecordedCall {
                    domain,
                    iso_start_date: iso_start_date.to_string(),
                    iso_end_date: iso_end_date.to_string(),
                });
                calls.len() - 1
            };
            if cancel.is_cancelled() {
                return Ok(FetchOutcome::Canceled);
            }
            match (self.respond)(index) {
                Ok(value) => Ok(FetchOutcome::Completed(value)),
                Err(status) => Err(ApiError::Server { status }),
            }
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    /// Each call parks until the test releases it, so resolution order is
    /// fully controlled. Cancellation is honored while parked unless the
    /// gate was created with `ignore_cancel`.
    pub struct GatedSource {
        gates: Mutex<VecDeque<Gate>>,
        started: AtomicUsize,
    }

    struct Gate {
        rx: oneshot::Receiver<Result<Value, u16>>,
        ignore_cancel: bool,
    }

    pub struct Release(oneshot::Sender<Result<Value, u16>>);

    impl Release {
        pub fn ok(self, value: Value) {
            let _ = self.0.send(Ok(value));
        }

        pub fn fail(self, status: u16) {
            let _ = self.0.send(Err(status));
        }
    }

    impl GatedSource {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                gates: Mutex::new(VecDeque::new()),
                started: AtomicUsize::new(0),
            })
        }

        /// Queue the gate for the next call.
        pub fn gate(&self) -> Release {
            self.push_gate(false)
        }

        /// Gate for a request that resolves even after being cancelled,
        /// like a transport that cannot abort its socket.
        pub fn stubborn_gate(&self) -> Release {
            self.push_gate(true)
        }

        fn push_gate(&self, ignore_cancel: bool) -> Release {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().push_back(Gate { rx, ignore_cancel });
            Release(tx)
        }

        pub fn started(&self) -> usize {
            self.started.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl MetricsSource for GatedSource {
        async fn fetch(
            &self,
            _domain: Domain,
            _iso_start_date: &str,
            _iso_end_date: &str,
            cancel: &CancellationHandle,
        ) -> Result<FetchOutcome<Value>, ApiError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let gate = self
                .gates
                .lock()
                .pop_front()
                .expect("no gate queued for this call");

            let result = if gate.ignore_cancel {
                gate.rx.await
            } else {
                tokio::select! {
                    _ = cancel.cancelled() => return Ok(FetchOutcome::Canceled),
                    result = gate.rx => result,
                }
            };

            match result {
                Ok(Ok(value)) => Ok(FetchOutcome::Completed(value)),
                Ok(Err(status)) => Err(ApiError::Server { status }),
                Err(_) => Ok(FetchOutcome::Canceled),
            }
        }

        fn name(&self) -> &str {
            "gated"
        }
    }
}
