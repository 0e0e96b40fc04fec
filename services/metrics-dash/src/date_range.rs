// services/metrics-dash/src/date_range.rs
//
// Date range ownership and the inputs every fetch hook observes.
// One controller per session; views only ever see a watch::Receiver.
//

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use crate::errors::DashError;

pub const DEFAULT_RANGE_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DashError> {
        if start > end {
            return Err(DashError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive length in days.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn iso_start(&self) -> String {
        format_date_to_iso(self.start)
    }

    pub fn iso_end(&self) -> String {
        format_date_to_iso(self.end)
    }
}

/// Everything a fetch hook depends on. Published atomically, so the ISO
/// strings always match the range they were derived from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FetchInputs {
    pub iso_start_date: String,
    pub iso_end_date: String,
    pub refresh_key: u64,
}

impl FetchInputs {
    pub fn new(iso_start_date: impl Into<String>, iso_end_date: impl Into<String>, refresh_key: u64) -> Self {
        Self {
            iso_start_date: iso_start_date.into(),
            iso_end_date: iso_end_date.into(),
            refresh_key,
        }
    }

    pub fn has_dates(&self) -> bool {
        !self.iso_start_date.is_empty() && !self.iso_end_date.is_empty()
    }
}

/// Owns the active date range and the refresh key.
pub struct DateRangeController {
    range: DateRange,
    refresh_key: u64,
    tx: watch::Sender<FetchInputs>,
}

impl DateRangeController {
    /// Starts at the default range ending `today`.
    pub fn new(today: NaiveDate) -> Self {
        let range = default_date_range(today);
        Self::with_range(range)
    }

    pub fn with_range(range: DateRange) -> Self {
        let (tx, _rx) = watch::channel(FetchInputs::new(range.iso_start(), range.iso_end(), 0));
        Self {
            range,
            refresh_key: 0,
            tx,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    pub fn inputs(&self) -> FetchInputs {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchInputs> {
        self.tx.subscribe()
    }

    /// Replace both dates in one transition.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<(), DashError> {
        let range = DateRange::new(start, end)?;
        if range == self.range {
            return Ok(());
        }
        self.range = range;
        info!("Date range set to {}", format_date_range_for_display(start, end));
        self.publish();
        Ok(())
    }

    /// Bump the refresh key; dates stay as they are.
    pub fn refresh(&mut self) {
        self.refresh_key += 1;
        info!("Refresh requested (key {})", self.refresh_key);
        self.publish();
    }

    /// Move the window by `days`, keeping its length.
    pub fn shift(&mut self, days: i64) -> Result<(), DashError> {
        let delta = Duration::days(days);
        self.set_range(self.range.start + delta, self.range.end + delta)
    }

    /// Window of `days` calendar days ending on `today`.
    pub fn apply_preset(&mut self, today: NaiveDate, days: i64) -> Result<(), DashError> {
        let start = today - Duration::days(days.max(1) - 1);
        self.set_range(start, today)
    }

    fn publish(&self) {
        self.tx.send_replace(FetchInputs::new(
            self.range.iso_start(),
            self.range.iso_end(),
            self.refresh_key,
        ));
    }
}

pub fn default_date_range(today: NaiveDate) -> DateRange {
    DateRange {
        start: today - Duration::days(DEFAULT_RANGE_DAYS),
        end: today,
    }
}

/// `YYYY-MM-DD`
pub fn format_date_to_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// `MM/DD/YYYY`
pub fn format_date_for_display(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

pub fn format_date_range_for_display(start: NaiveDate, end: NaiveDate) -> String {
    format!("{} – {}", format_date_for_display(start), format_date_for_display(end))
}

/// Accepts a plain `YYYY-MM-DD` date or an RFC 3339 timestamp.
pub fn parse_api_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if input.contains('T') {
        return parse_api_timestamp(input).map(|ts| ts.date_naive());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

pub fn parse_api_timestamp(input: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input.trim())
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

pub fn format_api_timestamp_for_display(timestamp: Option<&str>) -> String {
    timestamp
        .and_then(parse_api_date)
        .map(format_date_for_display)
        .unwrap_or_else(|| "-".to_string())
}

/// `YYYYMMDD` as the backend expects. Empty or unparseable input gives an
/// empty string.
pub fn format_date_to_compact(input: &str) -> String {
    parse_api_date(input)
        .map(|date| date.format("%Y%m%d").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_default_range_is_thirty_days_back() {
        let controller = DateRangeController::new(date(2025, 5, 14));
        assert_eq!(controller.range().start(), date(2025, 4, 14));
        assert_eq!(controller.range().end(), date(2025, 5, 14));
        assert_eq!(
            controller.inputs(),
            FetchInputs::new("2025-04-14", "2025-05-14", 0)
        );
    }

    #[test]
    fn test_set_range_publishes_matching_iso_dates_once() {
        let mut controller = DateRangeController::new(date(2025, 5, 14));
        let mut rx = controller.subscribe();
        let _ = rx.borrow_and_update();

        controller.set_range(date(2025, 1, 1), date(2025, 1, 31)).unwrap();

        assert!(rx.has_changed().unwrap());
        let inputs = rx.borrow_and_update().clone();
        assert_eq!(inputs, FetchInputs::new("2025-01-01", "2025-01-31", 0));
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_set_range_rejects_inverted_range() {
        let mut controller = DateRangeController::new(date(2025, 5, 14));
        let before = controller.inputs();

        let err = controller.set_range(date(2025, 2, 1), date(2025, 1, 1)).unwrap_err();

        assert!(matches!(err, DashError::InvalidRange { .. }));
        assert_eq!(controller.inputs(), before);
    }

    #[test]
    fn test_refresh_keeps_dates() {
        let mut controller = DateRangeController::new(date(2025, 5, 14));
        let mut rx = controller.subscribe();
        let before = rx.borrow_and_update().clone();

        controller.refresh();

        assert!(rx.has_changed().unwrap());
        let after = rx.borrow_and_update().clone();
        assert_eq!(after.iso_start_date, before.iso_start_date);
        assert_eq!(after.iso_end_date, before.iso_end_date);
        assert_eq!(after.refresh_key, before.refresh_key + 1);
    }

    #[test]
    fn test_shift_and_preset() {
        let mut controller = DateRangeController::new(date(2025, 5, 14));
        controller.shift(-7).unwrap();
        assert_eq!(controller.range().start(), date(2025, 4, 7));
        assert_eq!(controller.range().end(), date(2025, 5, 7));

        controller.apply_preset(date(2025, 5, 14), 7).unwrap();
        assert_eq!(controller.range().start(), date(2025, 5, 8));
        assert_eq!(controller.range().days(), 7);
    }

    #[test]
    fn test_date_formatting() {
        assert_eq!(format_date_to_iso(date(2025, 4, 1)), "2025-04-01");
        assert_eq!(format_date_for_display(date(2025, 4, 1)), "04/01/2025");
        assert_eq!(
            format_date_range_for_display(date(2025, 4, 1), date(2025, 4, 30)),
            "04/01/2025 – 04/30/2025"
        );
        assert_eq!(format_date_to_compact("2025-05-14"), "20250514");
        assert_eq!(format_date_to_compact("2025-05-14T23:10:00Z"), "20250514");
        assert_eq!(format_date_to_compact(""), "");
        assert_eq!(format_api_timestamp_for_display(Some("2024-04-01T10:00:00Z")), "04/01/2024");
        assert_eq!(format_api_timestamp_for_display(None), "-");
    }
}
