use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deployment profile. Each carries its own request timeout and debug
/// logging default.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentProfile {
    #[default]
    Development,
    Staging,
    Production,
}

impl EnvironmentProfile {
    pub fn name(&self) -> &'static str {
        match self {
            EnvironmentProfile::Development => "development",
            EnvironmentProfile::Staging => "staging",
            EnvironmentProfile::Production => "production",
        }
    }

    pub fn api_timeout(&self) -> Duration {
        match self {
            EnvironmentProfile::Development => Duration::from_secs(30),
            EnvironmentProfile::Staging => Duration::from_secs(45),
            EnvironmentProfile::Production => Duration::from_secs(60),
        }
    }

    pub fn debug_logs(&self) -> bool {
        !matches!(self, EnvironmentProfile::Production)
    }
}

/// Endpoint paths, relative to `ApiConfig::base_url`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Endpoints {
    pub summary: String,
    pub contributors: String,
    pub pr_table: String,
    pub cicd: String,
    pub qe: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            summary: "/api/pr-metrics/summary".to_string(),
            contributors: "/api/pr-metrics/contributors".to_string(),
            pr_table: "/api/pr-metrics/table".to_string(),
            cicd: "/api/cicd-metrics".to_string(),
            qe: "/api/qe-metrics".to_string(),
        }
    }
}

/// Values sent as the `reqType` query parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RequestTypes {
    pub summary: String,
    pub contributors: String,
    pub pr_details: String,
    pub cicd_metrics: String,
    pub qe_metrics: String,
}

impl Default for RequestTypes {
    fn default() -> Self {
        Self {
            summary: "summary".to_string(),
            contributors: "contributors".to_string(),
            pr_details: "prdetails".to_string(),
            cicd_metrics: "cicdmetrics".to_string(),
            qe_metrics: "qemetrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Overrides the environment profile's timeout when set.
    pub timeout_ms: Option<u64>,
    pub endpoints: Endpoints,
    pub request_types: RequestTypes,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_ms: None,
            endpoints: Endpoints::default(),
            request_types: RequestTypes::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self, profile: EnvironmentProfile) -> Duration {
        self.timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| profile.api_timeout())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_file: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: "metrics-dash.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_timeouts() {
        assert_eq!(EnvironmentProfile::Development.api_timeout(), Duration::from_secs(30));
        assert_eq!(EnvironmentProfile::Staging.api_timeout(), Duration::from_secs(45));
        assert_eq!(EnvironmentProfile::Production.api_timeout(), Duration::from_secs(60));
        assert!(!EnvironmentProfile::Production.debug_logs());
    }

    #[test]
    fn test_explicit_timeout_wins() {
        let config = ApiConfig {
            timeout_ms: Some(1500),
            ..ApiConfig::default()
        };
        assert_eq!(
            config.timeout(EnvironmentProfile::Production),
            Duration::from_millis(1500)
        );
        assert_eq!(
            ApiConfig::default().timeout(EnvironmentProfile::Staging),
            Duration::from_secs(45)
        );
    }
}
