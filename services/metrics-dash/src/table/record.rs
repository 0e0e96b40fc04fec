// services/metrics-dash/src/table/record.rs
//
// PR table row as the backend sends it, plus typed field access for the
// filter and sort engines.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::date_range::parse_api_timestamp;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PrState {
    Open,
    ReviewInProgress,
    ChangesRequested,
    Merged,
    Closed,
    /// Any state label the dashboard has no name for.
    Other(String),
}

impl PrState {
    /// The states offered by the state filter, in menu order.
    pub const KNOWN: [PrState; 5] = [
        PrState::Open,
        PrState::ReviewInProgress,
        PrState::ChangesRequested,
        PrState::Merged,
        PrState::Closed,
    ];

    pub fn label(&self) -> &str {
        match self {
            PrState::Open => "Open",
            PrState::ReviewInProgress => "Review In Progress",
            PrState::ChangesRequested => "Changes Requested",
            PrState::Merged => "Merged",
            PrState::Closed => "Closed",
            PrState::Other(label) => label,
        }
    }
}

impl From<String> for PrState {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Open" => PrState::Open,
            "Review In Progress" => PrState::ReviewInProgress,
            "Changes Requested" => PrState::ChangesRequested,
            "Merged" => PrState::Merged,
            "Closed" => PrState::Closed,
            _ => PrState::Other(label),
        }
    }
}

impl From<PrState> for String {
    fn from(state: PrState) -> Self {
        state.label().to_string()
    }
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One pull request. Identity is `(repository, PRNumber)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrRecord {
    #[serde(rename = "rowNumber", default)]
    pub row_number: Option<u64>,
    #[serde(rename = "Jira_ID", default)]
    pub jira_id: Option<String>,
    #[serde(rename = "Jira_URL", default)]
    pub jira_url: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    /// `PR-456` or a bare number, depending on the backend.
    #[serde(rename = "PRNumber", default)]
    pub pr_number: Value,
    #[serde(rename = "PR_URL", default)]
    pub pr_url: Option<String>,
    #[serde(rename = "State", default)]
    pub state: Option<PrState>,
    #[serde(rename = "CreatedDate", default)]
    pub created_date: Option<String>,
    #[serde(rename = "ReviewRequestedTime", default)]
    pub review_requested_time: Option<String>,
    #[serde(rename = "MergedDate", default)]
    pub merged_date: Option<String>,
    #[serde(rename = "Author", default)]
    pub author: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A cell reduced to what the comparator needs.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// Epoch milliseconds.
    Timestamp(i64),
    Empty,
}

impl FieldValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Empty,
            Value::String(s) if s.is_empty() => FieldValue::Empty,
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Empty),
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            other => FieldValue::Text(other.to_string()),
        }
    }

    fn from_text(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => FieldValue::Text(s.to_string()),
            _ => FieldValue::Empty,
        }
    }

    fn from_timestamp(value: Option<&str>) -> Self {
        match value {
            Some(s) if !s.is_empty() => parse_api_timestamp(s)
                .map(|ts| FieldValue::Timestamp(ts.timestamp_millis()))
                .unwrap_or_else(|| FieldValue::Text(s.to_string())),
            _ => FieldValue::Empty,
        }
    }

    /// Stringified form used for searching and for mixed-type comparison.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(n) => {
                if n.fract() == 0.0 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            FieldValue::Timestamp(ms) => ms.to_string(),
            FieldValue::Empty => String::new(),
        }
    }
}

impl PrRecord {
    /// Value of the column with wire name `key`.
    pub fn field(&self, key: &str) -> FieldValue {
        match key {
            "rowNumber" => self
                .row_number
                .map(|n| FieldValue::Number(n as f64))
                .unwrap_or(FieldValue::Empty),
            "Jira_ID" => FieldValue::from_text(self.jira_id.as_deref()),
            "Jira_URL" => FieldValue::from_text(self.jira_url.as_deref()),
            "repository" => FieldValue::from_text(self.repository.as_deref()),
            "PRNumber" => FieldValue::from_json(&self.pr_number),
            "PR_URL" => FieldValue::from_text(self.pr_url.as_deref()),
            "State" => FieldValue::from_text(self.state.as_ref().map(PrState::label)),
            "CreatedDate" => FieldValue::from_timestamp(self.created_date.as_deref()),
            "ReviewRequestedTime" => FieldValue::from_timestamp(self.review_requested_time.as_deref()),
            "MergedDate" => FieldValue::from_timestamp(self.merged_date.as_deref()),
            "Author" => FieldValue::from_text(self.author.as_deref()),
            other => self
                .extra
                .get(other)
                .map(FieldValue::from_json)
                .unwrap_or(FieldValue::Empty),
        }
    }

    /// Text a search term is matched against. Timestamps search their raw
    /// string, not epoch millis.
    pub fn search_text(&self, key: &str) -> String {
        match key {
            "CreatedDate" => self.created_date.clone().unwrap_or_default(),
            "ReviewRequestedTime" => self.review_requested_time.clone().unwrap_or_default(),
            "MergedDate" => self.merged_date.clone().unwrap_or_default(),
            _ => self.field(key).as_text(),
        }
    }

    pub fn pr_number_text(&self) -> String {
        FieldValue::from_json(&self.pr_number).as_text()
    }

    /// Milliseconds from review request to merge, when both are known.
    pub fn review_to_merge_ms(&self) -> Option<f64> {
        let requested = parse_api_timestamp(self.review_requested_time.as_deref()?)?;
        let merged = parse_api_timestamp(self.merged_date.as_deref()?)?;
        let elapsed = (merged - requested).num_milliseconds();
        (elapsed >= 0).then_some(elapsed as f64)
    }
}

/// Rows that fail to decode are dropped with a warning rather than failing
/// the whole table.
pub fn decode_pr_rows(payload: Value) -> Vec<PrRecord> {
    let Value::Array(rows) = payload else {
        return Vec::new();
    };
    rows.into_iter()
        .enumerate()
        .filter_map(|(index, row)| match serde_json::from_value::<PrRecord>(row) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!("Skipping malformed PR row {}: {}", index, err);
                None
            }
        })
        .collect()
}
