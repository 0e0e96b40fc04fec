// services/metrics-dash/src/transform/format.rs
//
// Number, time and trend formatting shared by the views.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Whether a value is good news for the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// `Stable` within 5% either way, or when either side is zero.
pub fn trend_direction(current: f64, previous: f64) -> TrendDirection {
    if current == 0.0 || previous == 0.0 || !current.is_finite() || !previous.is_finite() {
        return TrendDirection::Stable;
    }
    let change = (current - previous) / previous * 100.0;
    if change.abs() < 5.0 {
        TrendDirection::Stable
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    }
}

pub fn success_rate_sentiment(percentage: f64) -> Sentiment {
    if percentage >= 90.0 {
        Sentiment::Positive
    } else {
        Sentiment::Negative
    }
}

pub fn failure_rate_sentiment(percentage: f64) -> Sentiment {
    if percentage <= 10.0 {
        Sentiment::Positive
    } else {
        Sentiment::Negative
    }
}

/// Minutes as `< 1m`, `45m`, `1h` or `1h 30m`.
pub fn format_time(minutes: f64) -> String {
    if !(minutes >= 1.0) {
        return "< 1m".to_string();
    }
    if minutes < 60.0 {
        return format!("{}m", minutes.round() as i64);
    }
    // Round the total first so 119.7 reads "2h", not "1h 60m".
    let total = minutes.round() as i64;
    let (hours, rest) = (total / 60, total % 60);
    if rest == 0 {
        format!("{hours}h")
    } else {
        format!("{hours}h {rest}m")
    }
}

/// Percentage with one decimal place; 0 when `total` is 0.
pub fn calculate_percentage(value: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }
    (value / total * 1000.0).round() / 10.0
}

/// Days as `H h M m`.
pub fn format_cycle_time(days: Option<f64>) -> String {
    let Some(days) = days else {
        return "-- h -- m".to_string();
    };
    let total_hours = days * 24.0;
    let mut hours = total_hours.floor() as i64;
    let mut minutes = ((total_hours - total_hours.floor()) * 60.0).round() as i64;
    if minutes == 60 {
        hours += 1;
        minutes = 0;
    }
    format!("{hours} h {minutes} m")
}

/// Thousands separators, at most three fraction digits.
pub fn format_number(value: Option<f64>, add_plus: bool) -> String {
    let Some(value) = value else {
        return "--".to_string();
    };
    let rounded = (value * 1000.0).round() / 1000.0;
    let sign = if rounded < 0.0 {
        "-"
    } else if add_plus && rounded > 0.0 {
        "+"
    } else {
        ""
    };

    let magnitude = rounded.abs();
    let whole = magnitude.trunc() as u64;
    let fraction = format!("{:.3}", magnitude - magnitude.trunc());
    let fraction = fraction.trim_start_matches('0').trim_end_matches('0');

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if fraction == "." {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}{fraction}")
    }
}

/// Ratios (`0.75`) and percentages (`75`) both print as `75%`.
pub fn format_percentage(value: Option<f64>, add_plus: bool) -> String {
    let Some(value) = value else {
        return "--%".to_string();
    };
    let percent = if value > 1.0 { value } else { value * 100.0 };
    let rounded = percent.round() as i64;
    let prefix = if add_plus && rounded > 0 { "+" } else { "" };
    format!("{prefix}{rounded}%")
}

/// Milliseconds as `2d 5h 30m`. Hours show once a day is reached.
pub fn format_duration(milliseconds: Option<f64>) -> String {
    let Some(ms) = milliseconds else {
        return "--".to_string();
    };
    let minutes_total = (ms / 1000.0).floor() as i64 / 60;
    let hours_total = minutes_total / 60;
    let days = hours_total / 24;
    let hours = hours_total % 24;
    let minutes = minutes_total % 60;

    let mut parts = Vec::with_capacity(3);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 || days > 0 {
        parts.push(format!("{hours}h"));
    }
    parts.push(format!("{minutes}m"));
    parts.join(" ")
}

/// Integral values without a trailing `.0`.
pub fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "< 1m");
        assert_eq!(format_time(0.4), "< 1m");
        assert_eq!(format_time(f64::NAN), "< 1m");
        assert_eq!(format_time(45.4), "45m");
        assert_eq!(format_time(90.0), "1h 30m");
        assert_eq!(format_time(60.0), "1h");
        assert_eq!(format_time(119.7), "2h");
    }

    #[test]
    fn test_calculate_percentage() {
        assert_eq!(calculate_percentage(1.0, 3.0), 33.3);
        assert_eq!(calculate_percentage(1.0, 6.0), 16.7);
        assert_eq!(calculate_percentage(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_trend_direction() {
        assert_eq!(trend_direction(104.0, 100.0), TrendDirection::Stable);
        assert_eq!(trend_direction(110.0, 100.0), TrendDirection::Up);
        assert_eq!(trend_direction(90.0, 100.0), TrendDirection::Down);
        assert_eq!(trend_direction(0.0, 100.0), TrendDirection::Stable);
        assert_eq!(trend_direction(50.0, 0.0), TrendDirection::Stable);
    }

    #[test]
    fn test_rate_sentiment_cutoffs() {
        assert_eq!(success_rate_sentiment(90.0), Sentiment::Positive);
        assert_eq!(success_rate_sentiment(89.9), Sentiment::Negative);
        assert_eq!(failure_rate_sentiment(10.0), Sentiment::Positive);
        assert_eq!(failure_rate_sentiment(10.1), Sentiment::Negative);
    }

    #[test]
    fn test_format_cycle_time() {
        assert_eq!(format_cycle_time(None), "-- h -- m");
        assert_eq!(format_cycle_time(Some(2.5)), "60 h 0 m");
        assert_eq!(format_cycle_time(Some(0.25)), "6 h 0 m");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(None, false), "--");
        assert_eq!(format_number(Some(12340.0), false), "12,340");
        assert_eq!(format_number(Some(1234567.5), false), "1,234,567.5");
        assert_eq!(format_number(Some(42.0), true), "+42");
        assert_eq!(format_number(Some(-1500.0), true), "-1,500");
        assert_eq!(format_number(Some(0.0), true), "0");
    }

    #[test]
    fn test_format_percentage() {
        assert_eq!(format_percentage(Some(0.75), false), "75%");
        assert_eq!(format_percentage(Some(78.0), true), "+78%");
        assert_eq!(format_percentage(None, false), "--%");
    }

    #[test]
    fn test_format_duration() {
        let minute = 60_000.0;
        assert_eq!(format_duration(Some(30.0 * minute)), "30m");
        assert_eq!(format_duration(Some(90.0 * minute)), "1h 30m");
        assert_eq!(format_duration(Some((2.0 * 24.0 * 60.0 + 5.0 * 60.0 + 30.0) * minute)), "2d 5h 30m");
        assert_eq!(format_duration(Some(24.0 * 60.0 * minute)), "1d 0h 0m");
        assert_eq!(format_duration(None), "--");
    }

    #[test]
    fn test_display_number() {
        assert_eq!(display_number(95.0), "95");
        assert_eq!(display_number(2.5), "2.5");
    }
}
