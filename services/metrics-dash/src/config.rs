use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use svckit::config::{ApiConfig, EnvironmentProfile, ObservabilityConfig};

use crate::errors::DashError;

const DEFAULT_MOCK_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashConfig {
    pub environment: EnvironmentProfile,
    pub api: ApiConfig,
    /// Serve built-in fixtures instead of calling the backend.
    pub mock_responses: bool,
    pub mock_delay_ms: u64,
    pub auto_refresh: AutoRefreshConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AutoRefreshConfig {
    pub interval_secs: u64,
    pub indicator_secs: u64,
}

impl Default for AutoRefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: 600,
            indicator_secs: 3,
        }
    }
}

impl AutoRefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn indicator(&self) -> Duration {
        Duration::from_secs(self.indicator_secs)
    }
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            environment: EnvironmentProfile::default(),
            api: ApiConfig::default(),
            mock_responses: false,
            mock_delay_ms: DEFAULT_MOCK_DELAY_MS,
            auto_refresh: AutoRefreshConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl DashConfig {
    pub fn api_timeout(&self) -> Duration {
        self.api.timeout(self.environment)
    }

    pub fn mock_delay(&self) -> Duration {
        Duration::from_millis(self.mock_delay_ms)
    }
}

/// Layered load: optional YAML file, then `METRICS_DASH__*` environment
/// variables (e.g. `METRICS_DASH__API__BASE_URL`).
pub fn load_config(path: &str) -> Result<DashConfig, DashError> {
    let config = Config::builder()
        .set_default("mock_delay_ms", DEFAULT_MOCK_DELAY_MS)?
        .add_source(File::with_name(path).required(false))
        .add_source(
            Environment::with_prefix("METRICS_DASH")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    Ok(config.try_deserialize()?)
}
