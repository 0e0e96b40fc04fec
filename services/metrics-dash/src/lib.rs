// services/metrics-dash/src/lib.rs
//
// Engineering metrics dashboard: date range, cancellable per-domain fetch
// hooks, pure payload transformers, the PR table engine and a terminal UI.
//

pub mod app;
pub mod config;
pub mod date_range;
pub mod errors;
pub mod hooks;
pub mod mock;
pub mod source;
pub mod state;
pub mod table;
pub mod transform;
pub mod ui;

pub use app::App;
pub use config::{load_config, DashConfig};
pub use date_range::{DateRange, DateRangeController, FetchInputs};
pub use errors::DashError;
pub use hooks::{AutoRefresh, FetchDriver, FetchHook, FetchMode, FetchState};
pub use mock::MockMetricsSource;
pub use source::{Domain, HttpMetricsSource, MetricsSource};
pub use state::View;
