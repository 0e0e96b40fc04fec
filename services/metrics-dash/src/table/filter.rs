// services/metrics-dash/src/table/filter.rs
//
// Row filtering for the PR table: one state predicate plus free-text
// search terms, all of which must hold.
//

use tracing::debug;

use super::record::{PrRecord, PrState};

/// Row predicate.
pub trait RowFilter {
    fn matches(&self, row: &PrRecord) -> bool;
    fn is_active(&self) -> bool;
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StateFilter {
    #[default]
    All,
    Only(PrState),
}

impl StateFilter {
    pub fn label(&self) -> &str {
        match self {
            StateFilter::All => "All",
            StateFilter::Only(state) => state.label(),
        }
    }

    /// Next entry of the menu: All, then each known state, then All again.
    pub fn cycle(&self) -> StateFilter {
        match self {
            StateFilter::All => StateFilter::Only(PrState::KNOWN[0].clone()),
            StateFilter::Only(current) => PrState::KNOWN
                .iter()
                .position(|state| state == current)
                .and_then(|index| PrState::KNOWN.get(index + 1))
                .map(|state| StateFilter::Only(state.clone()))
                .unwrap_or(StateFilter::All),
        }
    }
}

impl RowFilter for StateFilter {
    fn matches(&self, row: &PrRecord) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Only(state) => row.state.as_ref() == Some(state),
        }
    }

    fn is_active(&self) -> bool {
        *self != StateFilter::All
    }

    fn name(&self) -> &str {
        "StateFilter"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    JiraId,
    Repository,
    Author,
    PrNumber,
}

impl SearchField {
    pub const ALL: [SearchField; 4] = [
        SearchField::JiraId,
        SearchField::Repository,
        SearchField::Author,
        SearchField::PrNumber,
    ];

    /// Wire name of the column searched.
    pub fn key(&self) -> &'static str {
        match self {
            SearchField::JiraId => "Jira_ID",
            SearchField::Repository => "repository",
            SearchField::Author => "Author",
            SearchField::PrNumber => "PRNumber",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SearchField::JiraId => "Jira ID",
            SearchField::Repository => "Repository",
            SearchField::Author => "Author",
            SearchField::PrNumber => "PR Number",
        }
    }

    pub fn next(&self) -> SearchField {
        match self {
            SearchField::JiraId => SearchField::Repository,
            SearchField::Repository => SearchField::Author,
            SearchField::Author => SearchField::PrNumber,
            SearchField::PrNumber => SearchField::JiraId,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilters {
    pub jira_id: String,
    pub repository: String,
    pub author: String,
    pub pr_number: String,
}

impl SearchFilters {
    pub fn get(&self, field: SearchField) -> &str {
        match field {
            SearchField::JiraId => &self.jira_id,
            SearchField::Repository => &self.repository,
            SearchField::Author => &self.author,
            SearchField::PrNumber => &self.pr_number,
        }
    }

    pub fn get_mut(&mut self, field: SearchField) -> &mut String {
        match field {
            SearchField::JiraId => &mut self.jira_id,
            SearchField::Repository => &mut self.repository,
            SearchField::Author => &mut self.author,
            SearchField::PrNumber => &mut self.pr_number,
        }
    }
}

impl RowFilter for SearchFilters {
    /// Every non-empty term must be a case-insensitive substring of its
    /// column. Missing columns read as empty.
    fn matches(&self, row: &PrRecord) -> bool {
        SearchField::ALL.iter().all(|field| {
            let term = self.get(*field);
            term.is_empty() || row.search_text(field.key()).to_lowercase().contains(&term.to_lowercase())
        })
    }

    fn is_active(&self) -> bool {
        SearchField::ALL.iter().any(|field| !self.get(*field).is_empty())
    }

    fn name(&self) -> &str {
        "SearchFilters"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub state_filter: StateFilter,
    pub search: SearchFilters,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        self.state_filter.is_active() || self.search.is_active()
    }
}

/// Rows passing every filter, source order kept.
pub fn apply_filters(rows: &[PrRecord], filters: &FilterState) -> Vec<PrRecord> {
    let predicates: [&dyn RowFilter; 2] = [&filters.state_filter, &filters.search];
    let active: Vec<&dyn RowFilter> = predicates.into_iter().filter(|p| p.is_active()).collect();

    rows.iter()
        .filter(|row| active.iter().all(|predicate| predicate.matches(row)))
        .cloned()
        .collect()
}

/// Source rows plus filter state, with the filtered view kept current.
#[derive(Debug, Clone, Default)]
pub struct TableFilters {
    rows: Vec<PrRecord>,
    state: FilterState,
    filtered: Vec<PrRecord>,
    visible: bool,
}

impl TableFilters {
    pub fn new(rows: Vec<PrRecord>) -> Self {
        let mut filters = Self {
            rows,
            ..Self::default()
        };
        filters.recompute();
        filters
    }

    pub fn set_rows(&mut self, rows: Vec<PrRecord>) {
        self.rows = rows;
        self.recompute();
    }

    pub fn set_state_filter(&mut self, state_filter: StateFilter) {
        self.state.state_filter = state_filter;
        self.recompute();
    }

    pub fn cycle_state_filter(&mut self) {
        let next = self.state.state_filter.cycle();
        self.set_state_filter(next);
    }

    pub fn set_search(&mut self, field: SearchField, value: impl Into<String>) {
        *self.state.search.get_mut(field) = value.into();
        self.recompute();
    }

    pub fn reset(&mut self) {
        self.state = FilterState::default();
        self.recompute();
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn state(&self) -> &FilterState {
        &self.state
    }

    pub fn rows(&self) -> &[PrRecord] {
        &self.rows
    }

    pub fn filtered(&self) -> &[PrRecord] {
        &self.filtered
    }

    pub fn total_count(&self) -> usize {
        self.rows.len()
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }

    pub fn has_active_filters(&self) -> bool {
        self.state.is_active()
    }

    fn recompute(&mut self) {
        self.filtered = apply_filters(&self.rows, &self.state);
        debug!(
            "PR filters applied: {} of {} rows",
            self.filtered.len(),
            self.rows.len()
        );
    }
}
