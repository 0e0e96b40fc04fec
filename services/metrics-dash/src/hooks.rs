// services/metrics-dash/src/hooks.rs
//
// Per-domain data fetching: FetchHook owns the {data, loading, error} state
// of one view, FetchDriver re-fetches it whenever the date range inputs
// change, AutoRefresh silently re-polls the PR table.
//

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use svckit::{create_cancellation_token, CancellationHandle, FetchOutcome};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::date_range::FetchInputs;
use crate::source::{Domain, MetricsSource};

pub const MISSING_DATES_MESSAGE: &str = "Start date and end date are required";

/// `{data, loading, error}` as a view renders it.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
        }
    }
}

impl<T> FetchState<T> {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Shows the loading state while in flight.
    Visible,
    /// Background refresh: no loading state, raises the "just refreshed"
    /// indicator on success.
    Silent,
}

struct HookInner<T> {
    state: FetchState<T>,
    generation: u64,
    in_flight: Option<CancellationHandle>,
    last_inputs: Option<FetchInputs>,
    refreshed_at: Option<Instant>,
    data_version: u64,
}

/// Fetch state for one domain. Clones share the same state.
pub struct FetchHook<T> {
    domain: Domain,
    source: Arc<dyn MetricsSource>,
    decode: fn(Value) -> T,
    inner: Arc<Mutex<HookInner<T>>>,
}

impl<T> Clone for FetchHook<T> {
    fn clone(&self) -> Self {
        Self {
            domain: self.domain,
            source: Arc::clone(&self.source),
            decode: self.decode,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl FetchHook<Value> {
    /// Hook keeping the raw JSON payload.
    pub fn new(domain: Domain, source: Arc<dyn MetricsSource>) -> Self {
        Self::with_decoder(domain, source, |value| value)
    }
}

impl<T: Clone + Send + 'static> FetchHook<T> {
    pub fn with_decoder(domain: Domain, source: Arc<dyn MetricsSource>, decode: fn(Value) -> T) -> Self {
        Self {
            domain,
            source,
            decode,
            inner: Arc::new(Mutex::new(HookInner {
                state: FetchState::default(),
                generation: 0,
                in_flight: None,
                last_inputs: None,
                refreshed_at: None,
                data_version: 0,
            })),
        }
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    pub fn snapshot(&self) -> FetchState<T> {
        self.inner.lock().state.clone()
    }

    /// Bumped every time `data` is replaced.
    pub fn data_version(&self) -> u64 {
        self.inner.lock().data_version
    }

    pub fn last_inputs(&self) -> Option<FetchInputs> {
        self.inner.lock().last_inputs.clone()
    }

    /// Issue one request for `inputs`, superseding any request in flight.
    ///
    /// Only the most recently started request may touch the state; an older
    /// one that resolves later is discarded.
    pub async fn fetch(&self, inputs: &FetchInputs, mode: FetchMode) {
        let (generation, handle) = {
            let mut inner = self.inner.lock();
            if let Some(previous) = inner.in_flight.take() {
                previous.cancel();
            }
            inner.generation += 1;
            inner.last_inputs = Some(inputs.clone());

            if !inputs.has_dates() {
                warn!(domain = ?self.domain, "Fetch skipped: missing start or end date");
                inner.state.data = None;
                inner.state.error = Some(MISSING_DATES_MESSAGE.to_string());
                inner.state.loading = false;
                return;
            }

            let handle = create_cancellation_token();
            inner.in_flight = Some(handle.clone());
            if mode == FetchMode::Visible {
                inner.state.loading = true;
            }
            (inner.generation, handle)
        };

        debug!(
            domain = ?self.domain,
            generation,
            "Fetching {} .. {} (refresh key {})",
            inputs.iso_start_date,
            inputs.iso_end_date,
            inputs.refresh_key
        );

        let result = self
            .source
            .fetch(self.domain, &inputs.iso_start_date, &inputs.iso_end_date, &handle)
            .await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!(domain = ?self.domain, generation, "Discarding superseded response");
            return;
        }
        inner.in_flight = None;

        match result {
            Ok(FetchOutcome::Canceled) => {
                debug!(domain = ?self.domain, generation, "Request canceled");
            }
            Ok(FetchOutcome::Completed(raw)) => {
                inner.state.data = Some((self.decode)(raw));
                inner.state.error = None;
                inner.data_version += 1;
                if mode == FetchMode::Silent {
                    inner.refreshed_at = Some(Instant::now());
                    info!(domain = ?self.domain, "Background refresh completed");
                }
            }
            Err(err) => {
                warn!(domain = ?self.domain, error = ?err, "Error fetching {} data: {}", self.domain.noun(), err);
                inner.state.data = None;
                inner.state.error = Some(self.domain.error_message());
            }
        }
        inner.state.loading = false;
    }

    /// Re-run the last fetch with the same inputs (retry affordance).
    pub async fn refresh(&self) {
        let inputs = self.last_inputs().unwrap_or_default();
        self.fetch(&inputs, FetchMode::Visible).await;
    }

    /// Cancel the request in flight, if any. Its resolution leaves `data`
    /// and `error` untouched.
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.lock().in_flight.as_ref() {
            handle.cancel();
        }
    }

    /// Whether a silent refresh finished within `window`.
    pub fn just_refreshed(&self, window: Duration) -> bool {
        self.inner
            .lock()
            .refreshed_at
            .map(|at| at.elapsed() < window)
            .unwrap_or(false)
    }
}

impl<R: Clone + Send + 'static> FetchHook<Vec<R>> {
    /// Evaluated at fire time: refresh only a healthy, non-empty table.
    pub fn should_auto_refresh(&self) -> bool {
        let inner = self.inner.lock();
        inner.state.error.is_none()
            && !inner.state.loading
            && inner.state.data.as_ref().map(|rows| !rows.is_empty()).unwrap_or(false)
    }
}

/// Keeps a hook in sync with the date range: one fetch on mount, then one per
/// observed change of the inputs. Dropping the driver is the unmount.
pub struct FetchDriver {
    task: JoinHandle<()>,
    cancel_in_flight: Box<dyn Fn() + Send + Sync>,
}

impl FetchDriver {
    pub fn mount<T: Clone + Send + 'static>(hook: FetchHook<T>, mut rx: watch::Receiver<FetchInputs>) -> Self {
        let task_hook = hook.clone();
        let task = tokio::spawn(async move {
            let inputs = rx.borrow_and_update().clone();
            spawn_fetch(&task_hook, inputs);

            while rx.changed().await.is_ok() {
                let inputs = rx.borrow_and_update().clone();
                spawn_fetch(&task_hook, inputs);
            }
        });

        Self {
            task,
            cancel_in_flight: Box::new(move || hook.cancel()),
        }
    }
}

fn spawn_fetch<T: Clone + Send + 'static>(hook: &FetchHook<T>, inputs: FetchInputs) {
    let hook = hook.clone();
    tokio::spawn(async move {
        hook.fetch(&inputs, FetchMode::Visible).await;
    });
}

impl Drop for FetchDriver {
    fn drop(&mut self) {
        self.task.abort();
        (self.cancel_in_flight)();
    }
}

/// Background poll for a table hook. Owned by exactly one view; the timer
/// dies with it.
pub struct AutoRefresh {
    task: JoinHandle<()>,
}

impl AutoRefresh {
    pub fn start<R: Clone + Send + Sync + 'static>(
        hook: FetchHook<Vec<R>>,
        mut rx: watch::Receiver<FetchInputs>,
        period: Duration,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !hook.should_auto_refresh() {
                            debug!(domain = ?hook.domain(), "Auto-refresh skipped");
                            continue;
                        }
                        let inputs = rx.borrow().clone();
                        hook.fetch(&inputs, FetchMode::Silent).await;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let _ = rx.borrow_and_update();
                        ticker.reset();
                    }
                }
            }
        });

        Self { task }
    }
}

impl Drop for AutoRefresh {
    fn drop(&mut self) {
        self.task.abort();
    }
}
