// services/metrics-dash/src/app.rs
//
// Session controller: owns the date range, the mounted view and the
// activity log, and turns key presses into range changes, view switches
// and table operations.

use std::sync::Arc;

use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{info, warn};

use crate::config::DashConfig;
use crate::date_range::{format_date_range_for_display, DateRangeController};
use crate::source::MetricsSource;
use crate::state::{ActivityLog, Mounted, View, ViewStatus};
use crate::table::sort::SORTABLE_COLUMNS;
use crate::table::SortDirection;
use crate::transform::qe::{transform_for_heatmap, Heatmap, RepoSortKey};

/// Preset windows offered by `p`, in days.
pub const RANGE_PRESETS: [i64; 3] = [7, 30, 90];
const SHIFT_DAYS: i64 = 7;

pub struct App {
    controller: DateRangeController,
    source: Arc<dyn MetricsSource>,
    config: DashConfig,
    mounted: Mounted,
    log: ActivityLog,
    demo: bool,
    today: NaiveDate,
    should_quit: bool,
    last_status: Option<ViewStatus>,
    refresh_logged: bool,
    preset_index: usize,
    sort_column: usize,
    qe_sort: (RepoSortKey, SortDirection),
    heatmap_cursor: Option<(usize, usize)>,
}

impl App {
    pub fn new(
        config: DashConfig,
        source: Arc<dyn MetricsSource>,
        controller: DateRangeController,
        view: View,
        today: NaiveDate,
    ) -> Self {
        let demo = config.mock_responses;
        let mounted = Mounted::mount(view, source.clone(), controller.subscribe(), config.auto_refresh.interval());
        let mut log = ActivityLog::default();
        log.info(format!("Connected to {} source", source.name()));
        log.info(format!("Opened {} view", view.title()));
        let sort_column = SORTABLE_COLUMNS
            .iter()
            .position(|(key, _)| *key == crate::table::sort::DEFAULT_SORT_KEY)
            .unwrap_or(0);

        Self {
            controller,
            source,
            config,
            mounted,
            log,
            demo,
            today,
            should_quit: false,
            last_status: None,
            refresh_logged: false,
            preset_index: 1,
            sort_column,
            qe_sort: (RepoSortKey::Name, SortDirection::Asc),
            heatmap_cursor: None,
        }
    }

    pub fn view(&self) -> View {
        self.mounted.view()
    }

    pub fn mounted(&self) -> &Mounted {
        &self.mounted
    }

    pub fn controller(&self) -> &DateRangeController {
        &self.controller
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    pub fn is_demo(&self) -> bool {
        self.demo
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn sort_column(&self) -> usize {
        self.sort_column
    }

    pub fn qe_sort(&self) -> (RepoSortKey, SortDirection) {
        self.qe_sort
    }

    pub fn is_editing_search(&self) -> bool {
        matches!(&self.mounted, Mounted::PullRequests(view) if view.editing_search)
    }

    /// True for a few seconds after a background table refresh lands.
    pub fn refresh_indicator(&self) -> bool {
        match &self.mounted {
            Mounted::PullRequests(view) => view.hook.just_refreshed(self.config.auto_refresh.indicator()),
            Mounted::Domain { .. } => false,
        }
    }

    /// Selected heatmap cell, clamped to `heatmap`.
    pub fn heatmap_cursor(&self, heatmap: &Heatmap) -> Option<(usize, usize)> {
        if heatmap.is_empty() {
            return None;
        }
        let (x, y) = self.heatmap_cursor?;
        Some((x.min(heatmap.days.len() - 1), y.min(heatmap.repos.len() - 1)))
    }

    /// Called once per redraw: pulls table rows and logs status changes.
    pub fn on_tick(&mut self) {
        if let Mounted::PullRequests(view) = &mut self.mounted {
            view.sync();
        }

        let status = self.mounted.status();
        if self.last_status != Some(status) {
            let view = self.view();
            match status {
                ViewStatus::Ready => self.log.info(format!("{} data loaded", view.title())),
                ViewStatus::Error => {
                    let message = self.mounted.error().unwrap_or_else(|| view.domain().error_message());
                    self.log.error(message);
                }
                ViewStatus::Empty => self.log.warn(view.domain().empty_message()),
                ViewStatus::Loading => {}
            }
            self.last_status = Some(status);
        }

        let refreshed = self.refresh_indicator();
        if refreshed && !self.refresh_logged {
            self.log.info("PR table refreshed in background");
        }
        self.refresh_logged = refreshed;
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.is_editing_search() {
            self.handle_search_key(key);
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => self.switch_view(self.view().next()),
            KeyCode::BackTab => self.switch_view(self.view().prev()),
            KeyCode::Char(digit @ '1'..='5') => {
                let index = digit as usize - '1' as usize;
                self.switch_view(View::ALL[index]);
            }
            KeyCode::Char('r') => {
                self.controller.refresh();
                self.log.info("Refreshing all data");
            }
            KeyCode::Char('t') => self.retry(),
            KeyCode::Char('[') => self.shift_range(-SHIFT_DAYS),
            KeyCode::Char(']') => self.shift_range(SHIFT_DAYS),
            KeyCode::Char('p') => self.next_preset(),
            _ => match self.view() {
                View::PullRequests => self.handle_table_key(key.code),
                View::Qe => self.handle_qe_key(key.code),
                _ => {}
            },
        }
    }

    /// Unmounts the current view (cancelling its requests and timers) and
    /// mounts `view` against the same date range.
    pub fn switch_view(&mut self, view: View) {
        if view == self.view() {
            return;
        }
        self.mounted = Mounted::mount(
            view,
            self.source.clone(),
            self.controller.subscribe(),
            self.config.auto_refresh.interval(),
        );
        self.last_status = None;
        self.refresh_logged = false;
        self.heatmap_cursor = None;
        info!("Switched to {} view", view.title());
        self.log.info(format!("Opened {} view", view.title()));
    }

    fn retry(&mut self) {
        if self.mounted.status() != ViewStatus::Error {
            return;
        }
        self.mounted.retry();
        self.log.info(format!("Retrying {} data", self.view().domain().noun()));
    }

    fn shift_range(&mut self, days: i64) {
        match self.controller.shift(days) {
            Ok(()) => self.log_range(),
            Err(err) => {
                warn!("Range shift rejected: {}", err);
                self.log.warn(err.to_string());
            }
        }
    }

    fn next_preset(&mut self) {
        self.preset_index = (self.preset_index + 1) % RANGE_PRESETS.len();
        let days = RANGE_PRESETS[self.preset_index];
        match self.controller.apply_preset(self.today, days) {
            Ok(()) => self.log_range(),
            Err(err) => self.log.warn(err.to_string()),
        }
    }

    fn log_range(&mut self) {
        let range = self.controller.range();
        self.log.info(format!(
            "Date range {}",
            format_date_range_for_display(range.start(), range.end())
        ));
    }

    fn handle_table_key(&mut self, code: KeyCode) {
        let Mounted::PullRequests(view) = &mut self.mounted else {
            return;
        };
        let table = &mut view.table;
        match code {
            KeyCode::Char('s') => table.cycle_state_filter(),
            KeyCode::Char('c') | KeyCode::Right => {
                self.sort_column = (self.sort_column + 1) % SORTABLE_COLUMNS.len();
                table.handle_sort(SORTABLE_COLUMNS[self.sort_column].0);
            }
            KeyCode::Char('C') | KeyCode::Left => {
                self.sort_column = (self.sort_column + SORTABLE_COLUMNS.len() - 1) % SORTABLE_COLUMNS.len();
                table.handle_sort(SORTABLE_COLUMNS[self.sort_column].0);
            }
            KeyCode::Char('o') => {
                let key = table.sort_config().key.clone();
                table.handle_sort(&key);
            }
            KeyCode::Char('/') => {
                view.editing_search = true;
                if !table.filters().is_visible() {
                    table.toggle_filters();
                }
            }
            KeyCode::Char('x') => table.reset_filters(),
            KeyCode::Char('f') => table.toggle_filters(),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Mounted::PullRequests(view) = &mut self.mounted else {
            return;
        };
        let field = view.search_field;
        let mut value = view.table.filters().state().search.get(field).to_string();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                view.editing_search = false;
                return;
            }
            KeyCode::Tab => {
                view.search_field = field.next();
                return;
            }
            KeyCode::Backspace => {
                value.pop();
            }
            KeyCode::Char(c) => value.push(c),
            _ => return,
        }
        view.table.set_search(field, value);
    }

    fn handle_qe_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('n') => {
                self.qe_sort.0 = match self.qe_sort.0 {
                    RepoSortKey::Name => RepoSortKey::Duration,
                    RepoSortKey::Duration => RepoSortKey::Failures,
                    RepoSortKey::Failures => RepoSortKey::Name,
                };
            }
            KeyCode::Char('o') => {
                self.qe_sort.1 = match self.qe_sort.1 {
                    SortDirection::Asc => SortDirection::Desc,
                    SortDirection::Desc => SortDirection::Asc,
                };
            }
            KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => self.move_heatmap_cursor(code),
            _ => {}
        }
    }

    fn move_heatmap_cursor(&mut self, code: KeyCode) {
        let Some(heatmap) = self.current_heatmap() else {
            return;
        };
        if heatmap.is_empty() {
            return;
        }
        let last_day = heatmap.days.len() - 1;
        let last_repo = heatmap.repos.len() - 1;
        let (x, y) = self.heatmap_cursor(&heatmap).unwrap_or((last_day, 0));
        self.heatmap_cursor = Some(match code {
            KeyCode::Left => (x.saturating_sub(1), y),
            KeyCode::Right => ((x + 1).min(last_day), y),
            KeyCode::Up => (x, y.saturating_sub(1)),
            KeyCode::Down => (x, (y + 1).min(last_repo)),
            _ => (x, y),
        });
    }

    fn current_heatmap(&self) -> Option<Heatmap> {
        let Mounted::Domain { inner, .. } = &self.mounted else {
            return None;
        };
        let data = inner.snapshot().data?;
        let inputs = self.controller.inputs();
        transform_for_heatmap(&data["pr_delivery_heatmap"], &inputs.iso_start_date, &inputs.iso_end_date)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 19).unwrap()
    }

    pub fn demo_app(view: View, source: impl MetricsSource + 'static) -> App {
        let config = DashConfig {
            mock_responses: true,
            ..DashConfig::default()
        };
        App::new(config, Arc::new(source), DateRangeController::new(today()), view, today())
    }
}

#[cfg(test)]
mod tests {
    use super::testing::demo_app;
    use super::*;
    use crate::mock::MockMetricsSource;
    use crate::source::testing::CountingSource;
    use crate::table::{PrState, StateFilter};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn mock() -> MockMetricsSource {
        MockMetricsSource::new(Duration::from_millis(100))
    }

    async fn settle(app: &mut App) {
        tokio::time::sleep(Duration::from_millis(150)).await;
        app.on_tick();
    }

    fn table_numbers(app: &App) -> Vec<String> {
        match app.mounted() {
            Mounted::PullRequests(view) => view.table.rows().iter().map(|r| r.pr_number_text()).collect(),
            Mounted::Domain { .. } => panic!("PR view not mounted"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_view_switching() {
        let mut app = demo_app(View::Dashboard, mock());
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view(), View::Contributors);
        press(&mut app, KeyCode::BackTab);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.view(), View::Qe);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.view(), View::PullRequests);
        assert_eq!(app.log().recent().next().map(|e| e.message.as_str()), Some("Opened Pull Requests view"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_range_keys_move_the_window() {
        let mut app = demo_app(View::Dashboard, mock());
        let before = app.controller().range();

        press(&mut app, KeyCode::Char('['));
        let after = app.controller().range();
        assert_eq!(before.start() - after.start(), chrono::Duration::days(7));
        assert_eq!(after.days(), before.days());

        press(&mut app, KeyCode::Char('p'));
        assert_eq!(app.controller().range().days(), 90);
        assert_eq!(app.controller().range().end(), testing::today());

        let key = app.controller().refresh_key();
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.controller().refresh_key(), key + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_table_keys() {
        let mut app = demo_app(View::PullRequests, mock());
        settle(&mut app).await;
        assert_eq!(table_numbers(&app).len(), 5);

        press(&mut app, KeyCode::Char('s'));
        assert_eq!(table_numbers(&app).len(), 1);
        let Mounted::PullRequests(view) = app.mounted() else {
            panic!("PR view not mounted");
        };
        assert_eq!(view.table.filters().state().state_filter, StateFilter::Only(PrState::Open));

        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Char('c'));
        let Mounted::PullRequests(view) = app.mounted() else {
            panic!("PR view not mounted");
        };
        assert_eq!(view.table.sort_config().key, "MergedDate");
        assert_eq!(view.table.sort_config().direction, SortDirection::Asc);

        press(&mut app, KeyCode::Char('o'));
        let Mounted::PullRequests(view) = app.mounted() else {
            panic!("PR view not mounted");
        };
        assert_eq!(view.table.sort_config().direction, SortDirection::Desc);
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_editing() {
        let mut app = demo_app(View::PullRequests, mock());
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('/'));
        assert!(app.is_editing_search());
        press(&mut app, KeyCode::Tab);
        for c in "FRONTENDx".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(table_numbers(&app), vec!["PR-460", "PR-456"]);

        // q is text while editing
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit());
        assert!(table_numbers(&app).is_empty());

        press(&mut app, KeyCode::Esc);
        assert!(!app.is_editing_search());
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(table_numbers(&app).len(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_failure() {
        let source = CountingSource::new(|call| {
            if call == 0 {
                Err(500)
            } else {
                Ok(MockMetricsSource::payload(crate::source::Domain::Cicd, "2025-06-19"))
            }
        });
        let config = DashConfig::default();
        let mut app = App::new(
            config,
            source.clone(),
            DateRangeController::new(testing::today()),
            View::Cicd,
            testing::today(),
        );
        settle(&mut app).await;
        assert_eq!(app.mounted().status(), ViewStatus::Error);
        assert_eq!(
            app.log().recent().next().map(|e| e.message.clone()),
            Some("Failed to fetch CICD data. Please try again later.".to_string())
        );

        press(&mut app, KeyCode::Char('t'));
        settle(&mut app).await;
        assert_eq!(app.mounted().status(), ViewStatus::Ready);
        assert_eq!(source.call_count(), 2);
        assert!(!app.is_demo());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_is_ignored_without_an_error() {
        let source = CountingSource::returning(json!([]));
        let config = DashConfig::default();
        let mut app = App::new(
            config,
            source.clone(),
            DateRangeController::new(testing::today()),
            View::PullRequests,
            testing::today(),
        );
        settle(&mut app).await;
        assert_eq!(app.mounted().status(), ViewStatus::Empty);

        press(&mut app, KeyCode::Char('t'));
        settle(&mut app).await;
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_qe_keys() {
        let mut app = demo_app(View::Qe, mock());
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Char('o'));
        assert_eq!(app.qe_sort(), (RepoSortKey::Duration, SortDirection::Desc));

        let heatmap = app.current_heatmap().unwrap();
        assert_eq!(app.heatmap_cursor(&heatmap), None);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.heatmap_cursor(&heatmap), Some((heatmap.days.len() - 2, 1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_keys() {
        let mut app = demo_app(View::Dashboard, mock());
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit());

        let mut app = demo_app(View::Dashboard, mock());
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit());
    }
}
