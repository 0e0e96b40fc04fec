// services/metrics-dash/src/state.rs
//
// Session state the UI renders: the activity log, the view selector and
// the currently mounted view with its hook, driver and timers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde_json::Value;
use tokio::sync::watch;

use crate::date_range::FetchInputs;
use crate::hooks::{AutoRefresh, FetchDriver, FetchHook, FetchState};
use crate::source::{Domain, MetricsSource};
use crate::table::{decode_pr_rows, PrRecord, PrTable, SearchField};

const ACTIVITY_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

/// In-app activity log; keeps the last 100 entries.
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
}

impl ActivityLog {
    pub fn add(&mut self, level: LogLevel, message: impl Into<String>) {
        self.entries.push_back(LogEntry {
            timestamp: Local::now(),
            level,
            message: message.into(),
        });
        if self.entries.len() > ACTIVITY_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.add(LogLevel::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.add(LogLevel::Warn, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.add(LogLevel::Error, message);
    }

    /// Newest first.
    pub fn recent(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Top-level screens, one per metric domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum View {
    #[default]
    Dashboard,
    Contributors,
    #[value(name = "pullrequests")]
    PullRequests,
    Cicd,
    Qe,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Dashboard,
        View::Contributors,
        View::PullRequests,
        View::Cicd,
        View::Qe,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Contributors => "Contributors",
            View::PullRequests => "Pull Requests",
            View::Cicd => "CI/CD",
            View::Qe => "QE",
        }
    }

    pub fn domain(&self) -> Domain {
        match self {
            View::Dashboard => Domain::Summary,
            View::Contributors => Domain::Contributors,
            View::PullRequests => Domain::PrTable,
            View::Cicd => Domain::Cicd,
            View::Qe => Domain::Qe,
        }
    }

    pub fn index(&self) -> usize {
        View::ALL.iter().position(|v| v == self).unwrap_or(0)
    }

    pub fn next(&self) -> View {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn prev(&self) -> View {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

/// What a view shows right now, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    Loading,
    Error,
    Empty,
    Ready,
}

/// Summary, contributors, CICD and QE: one raw payload each.
pub struct DomainView {
    pub hook: FetchHook<Value>,
    _driver: FetchDriver,
}

impl DomainView {
    pub fn mount(domain: Domain, source: Arc<dyn MetricsSource>, inputs: watch::Receiver<FetchInputs>) -> Self {
        let hook = FetchHook::new(domain, source);
        let driver = FetchDriver::mount(hook.clone(), inputs);
        Self { hook, _driver: driver }
    }

    pub fn snapshot(&self) -> FetchState<Value> {
        self.hook.snapshot()
    }
}

/// The PR table with its own background refresh.
pub struct PrTableView {
    pub hook: FetchHook<Vec<PrRecord>>,
    pub table: PrTable,
    pub search_field: SearchField,
    pub editing_search: bool,
    seen_version: u64,
    _driver: FetchDriver,
    _auto_refresh: AutoRefresh,
}

impl PrTableView {
    pub fn mount(
        source: Arc<dyn MetricsSource>,
        inputs: watch::Receiver<FetchInputs>,
        refresh_period: Duration,
    ) -> Self {
        let hook = FetchHook::with_decoder(Domain::PrTable, source, decode_pr_rows);
        let driver = FetchDriver::mount(hook.clone(), inputs.clone());
        let auto_refresh = AutoRefresh::start(hook.clone(), inputs, refresh_period);
        Self {
            hook,
            table: PrTable::default(),
            search_field: SearchField::JiraId,
            editing_search: false,
            seen_version: 0,
            _driver: driver,
            _auto_refresh: auto_refresh,
        }
    }

    /// Pull newly fetched rows into the table. Filters and sort survive.
    pub fn sync(&mut self) {
        let version = self.hook.data_version();
        if version == self.seen_version {
            return;
        }
        self.seen_version = version;
        let rows = self.hook.snapshot().data.unwrap_or_default();
        self.table.set_rows(rows);
    }

    pub fn snapshot(&self) -> FetchState<Vec<PrRecord>> {
        self.hook.snapshot()
    }
}

/// Exactly one view is mounted at a time; dropping it cancels its requests
/// and stops its timers.
pub enum Mounted {
    Domain { view: View, inner: DomainView },
    PullRequests(PrTableView),
}

impl Mounted {
    pub fn mount(
        view: View,
        source: Arc<dyn MetricsSource>,
        inputs: watch::Receiver<FetchInputs>,
        refresh_period: Duration,
    ) -> Self {
        match view {
            View::PullRequests => Mounted::PullRequests(PrTableView::mount(source, inputs, refresh_period)),
            other => Mounted::Domain {
                view: other,
                inner: DomainView::mount(other.domain(), source, inputs),
            },
        }
    }

    pub fn view(&self) -> View {
        match self {
            Mounted::Domain { view, .. } => *view,
            Mounted::PullRequests(_) => View::PullRequests,
        }
    }

    pub fn status(&self) -> ViewStatus {
        match self {
            Mounted::Domain { view, inner } => {
                let state = inner.snapshot();
                status_of(&state, |data| crate::transform::validate_payload(view.domain(), data))
            }
            Mounted::PullRequests(inner) => {
                let state = inner.snapshot();
                status_of(&state, |rows| !rows.is_empty())
            }
        }
    }

    /// Retry affordance: the same dates again, in the background.
    pub fn retry(&self) {
        match self {
            Mounted::Domain { inner, .. } => spawn_refresh(inner.hook.clone()),
            Mounted::PullRequests(inner) => spawn_refresh(inner.hook.clone()),
        }
    }

    pub fn error(&self) -> Option<String> {
        match self {
            Mounted::Domain { inner, .. } => inner.snapshot().error,
            Mounted::PullRequests(inner) => inner.snapshot().error,
        }
    }
}

fn spawn_refresh<T: Clone + Send + 'static>(hook: FetchHook<T>) {
    tokio::spawn(async move {
        hook.refresh().await;
    });
}

fn status_of<T>(state: &FetchState<T>, usable: impl Fn(&T) -> bool) -> ViewStatus {
    if state.loading {
        ViewStatus::Loading
    } else if state.error.is_some() {
        ViewStatus::Error
    } else if state.data.as_ref().map(usable).unwrap_or(false) {
        ViewStatus::Ready
    } else {
        ViewStatus::Empty
    }
}
