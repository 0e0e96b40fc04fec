// services/metrics-dash/src/table/mod.rs
//
// PR table engine: raw rows -> filters -> sort -> rendered rows.

pub mod filter;
pub mod record;
pub mod sort;

pub use filter::{apply_filters, FilterState, SearchField, SearchFilters, StateFilter, TableFilters};
pub use record::{decode_pr_rows, FieldValue, PrRecord, PrState};
pub use sort::{compare_values, sort_rows, SortConfig, SortDirection};

/// Filters and sort order for one table, with the rendered rows cached.
#[derive(Debug, Clone, Default)]
pub struct PrTable {
    filters: TableFilters,
    sort: SortConfig,
    rendered: Vec<PrRecord>,
}

impl PrTable {
    pub fn new(rows: Vec<PrRecord>) -> Self {
        let mut table = Self {
            filters: TableFilters::new(rows),
            ..Self::default()
        };
        table.rerender();
        table
    }

    /// Swap in freshly fetched rows; filters and sort order are kept.
    pub fn set_rows(&mut self, rows: Vec<PrRecord>) {
        self.filters.set_rows(rows);
        self.rerender();
    }

    pub fn rows(&self) -> &[PrRecord] {
        &self.rendered
    }

    pub fn filters(&self) -> &TableFilters {
        &self.filters
    }

    pub fn sort_config(&self) -> &SortConfig {
        &self.sort
    }

    pub fn handle_sort(&mut self, key: &str) {
        self.sort.handle_sort(key);
        self.rerender();
    }

    pub fn cycle_state_filter(&mut self) {
        self.filters.cycle_state_filter();
        self.rerender();
    }

    pub fn set_search(&mut self, field: SearchField, value: impl Into<String>) {
        self.filters.set_search(field, value);
        self.rerender();
    }

    pub fn reset_filters(&mut self) {
        self.filters.reset();
        self.rerender();
    }

    pub fn toggle_filters(&mut self) {
        self.filters.toggle_visibility();
    }

    fn rerender(&mut self) {
        self.rendered = sort_rows(self.filters.filtered(), &self.sort);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockMetricsSource;
    use crate::source::Domain;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_filters_then_sort() {
        let rows = decode_pr_rows(MockMetricsSource::payload(Domain::PrTable, "2025-04-30"));
        let mut table = PrTable::new(rows);
        assert_eq!(table.rows().len(), 5);

        table.set_search(SearchField::Repository, "frontend");
        let numbers: Vec<String> = table.rows().iter().map(PrRecord::pr_number_text).collect();
        assert_eq!(numbers, vec!["PR-460", "PR-456"]);

        table.handle_sort("PRNumber");
        let numbers: Vec<String> = table.rows().iter().map(PrRecord::pr_number_text).collect();
        assert_eq!(numbers, vec!["PR-456", "PR-460"]);

        table.reset_filters();
        assert_eq!(table.rows().len(), 5);
        assert_eq!(table.sort_config().key, "PRNumber");
    }

    #[test]
    fn test_new_rows_keep_filters() {
        let rows = decode_pr_rows(MockMetricsSource::payload(Domain::PrTable, "2025-04-30"));
        let mut table = PrTable::new(Vec::new());
        table.cycle_state_filter();
        table.set_rows(rows);
        assert_eq!(table.filters().state().state_filter, StateFilter::Only(PrState::Open));
        assert_eq!(table.rows().len(), 1);
    }
}
