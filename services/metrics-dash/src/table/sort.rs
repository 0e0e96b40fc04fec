// services/metrics-dash/src/table/sort.rs
//
// Column sorting for the PR table.

use std::cmp::Ordering;

use super::record::{FieldValue, PrRecord};

pub const DEFAULT_SORT_KEY: &str = "CreatedDate";

/// Sortable columns as (wire name, header), in display order.
pub const SORTABLE_COLUMNS: [(&str, &str); 8] = [
    ("rowNumber", "#"),
    ("Jira_ID", "Jira ID"),
    ("repository", "Repository"),
    ("PRNumber", "PR"),
    ("State", "State"),
    ("CreatedDate", "Created"),
    ("MergedDate", "Merged"),
    ("Author", "Author"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "▲",
            SortDirection::Desc => "▼",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortConfig {
    pub key: String,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_SORT_KEY.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    /// Header click: the same column flips direction, a new column starts
    /// ascending.
    pub fn handle_sort(&mut self, key: &str) {
        self.direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        self.key = key.to_string();
    }
}

/// Case-insensitive order first; among case variants lowercase sorts first.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

pub fn compare_values(a: &FieldValue, b: &FieldValue) -> Ordering {
    match (a, b) {
        (FieldValue::Text(a), FieldValue::Text(b)) => compare_text(a, b),
        (FieldValue::Number(a), FieldValue::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
        (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
        (FieldValue::Empty, FieldValue::Empty) => Ordering::Equal,
        _ => compare_text(&a.as_text(), &b.as_text()),
    }
}

/// Stable sort by `config.key`; rows that compare equal keep their order.
pub fn sort_rows(rows: &[PrRecord], config: &SortConfig) -> Vec<PrRecord> {
    let mut keyed: Vec<(FieldValue, &PrRecord)> = rows.iter().map(|row| (row.field(&config.key), row)).collect();
    keyed.sort_by(|(a, _), (b, _)| config.direction.apply(compare_values(a, b)));
    keyed.into_iter().map(|(_, row)| row.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMetricsSource;
    use crate::source::Domain;
    use crate::table::record::decode_pr_rows;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fixture_rows() -> Vec<PrRecord> {
        decode_pr_rows(MockMetricsSource::payload(Domain::PrTable, "2025-04-30"))
    }

    fn numbers(rows: &[PrRecord]) -> Vec<String> {
        rows.iter().map(PrRecord::pr_number_text).collect()
    }

    #[test]
    fn test_default_is_created_date_descending() {
        let rows = sort_rows(&fixture_rows(), &SortConfig::default());
        assert_eq!(numbers(&rows), vec!["PR-460", "PR-459", "PR-458", "PR-457", "PR-456"]);
    }

    #[test]
    fn test_handle_sort() {
        let mut config = SortConfig::default();
        config.handle_sort("CreatedDate");
        assert_eq!(config.direction, SortDirection::Asc);
        config.handle_sort("CreatedDate");
        assert_eq!(config.direction, SortDirection::Desc);
        config.handle_sort("Author");
        assert_eq!(config, SortConfig { key: "Author".into(), direction: SortDirection::Asc });
    }

    #[test]
    fn test_descending_reverses_ascending_for_distinct_keys() {
        let rows = fixture_rows();
        for key in ["rowNumber", "Jira_ID", "PRNumber", "CreatedDate"] {
            let asc = sort_rows(&rows, &SortConfig { key: key.into(), direction: SortDirection::Asc });
            let mut desc = sort_rows(&rows, &SortConfig { key: key.into(), direction: SortDirection::Desc });
            desc.reverse();
            assert_eq!(asc, desc, "sorting by {key}");
        }
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let rows = fixture_rows();
        let sorted = sort_rows(&rows, &SortConfig { key: "repository".into(), direction: SortDirection::Asc });
        assert_eq!(numbers(&sorted), vec!["PR-458", "PR-457", "PR-459", "PR-456", "PR-460"]);
    }

    #[test]
    fn test_compare_values() {
        use FieldValue::*;
        assert_eq!(compare_values(&Text("apple".into()), &Text("Banana".into())), Ordering::Less);
        assert_eq!(compare_values(&Text("a".into()), &Text("A".into())), Ordering::Less);
        assert_eq!(compare_values(&Number(10.0), &Number(9.0)), Ordering::Greater);
        assert_eq!(compare_values(&Timestamp(1), &Timestamp(2)), Ordering::Less);
        assert_eq!(compare_values(&Empty, &Text("x".into())), Ordering::Less);
        assert_eq!(compare_values(&Number(10.0), &Text("9".into())), Ordering::Less);
    }

    #[test]
    fn test_missing_values_sort_as_empty() {
        let rows = decode_pr_rows(json!([
            {"PRNumber": "b", "MergedDate": "2025-04-19T09:20:00Z"},
            {"PRNumber": "a"},
            {"PRNumber": "c", "MergedDate": "2025-04-16T14:45:00Z"}
        ]));
        let sorted = sort_rows(&rows, &SortConfig { key: "MergedDate".into(), direction: SortDirection::Asc });
        assert_eq!(numbers(&sorted)[0], "a");
    }
}
