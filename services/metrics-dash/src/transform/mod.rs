// services/metrics-dash/src/transform/mod.rs
//
// Pure functions from raw payloads to render-ready shapes. Every
// transformer answers None for null, missing or mis-shaped input.

pub mod chart;
pub mod cicd;
pub mod contributors;
pub mod format;
pub mod qe;
pub mod summary;

pub use chart::{ChartData, Dataset, MetricCard, PreparedChart, SeriesKind};

use serde_json::Value;

use crate::source::Domain;

/// Presence-only gate run before any transformer: every required key must
/// exist, even if its value is null. The PR table must be an array.
pub fn validate_payload(domain: Domain, payload: &Value) -> bool {
    match domain {
        Domain::PrTable => payload.is_array(),
        _ => match payload.as_object() {
            Some(object) => domain.required_fields().iter().all(|key| object.contains_key(*key)),
            None => false,
        },
    }
}

pub(crate) fn records(value: &Value) -> Option<&Vec<Value>> {
    value.as_array()
}

/// Numeric field, 0 when missing or not a number.
pub(crate) fn number(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

pub(crate) fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}
