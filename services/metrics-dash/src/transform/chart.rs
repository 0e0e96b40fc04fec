// services/metrics-dash/src/transform/chart.rs
//
// Render-ready shapes shared by every transformer. Views build widgets
// from these each frame; nothing here knows about the terminal.

use serde::Serialize;

use super::format::Sentiment;

/// How a series is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SeriesKind {
    Bar,
    Line,
    Slice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub kind: SeriesKind,
    pub data: Vec<f64>,
    /// One `#RRGGBB` per point for slices, a single entry otherwise.
    pub colors: Vec<String>,
}

impl Dataset {
    pub fn bar(label: impl Into<String>, data: Vec<f64>, color: &str) -> Self {
        Self {
            label: label.into(),
            kind: SeriesKind::Bar,
            data,
            colors: vec![color.to_string()],
        }
    }

    pub fn line(label: impl Into<String>, data: Vec<f64>, color: &str) -> Self {
        Self {
            label: label.into(),
            kind: SeriesKind::Line,
            data,
            colors: vec![color.to_string()],
        }
    }

    pub fn slices(data: Vec<f64>, palette: &[&str]) -> Self {
        let colors = palette.iter().take(data.len()).map(|c| c.to_string()).collect();
        Self {
            label: String::new(),
            kind: SeriesKind::Slice,
            data,
            colors,
        }
    }

    /// Color for point `index`, falling back to the first color.
    pub fn color_at(&self, index: usize) -> Option<&str> {
        self.colors
            .get(index)
            .or_else(|| self.colors.first())
            .map(String::as_str)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }
}

/// Labels plus one or more datasets aligned to them.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn new(labels: Vec<String>, datasets: Vec<Dataset>) -> Self {
        Self { labels, datasets }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A chart with the flag that tells a placeholder from real data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedChart {
    pub chart: ChartData,
    pub has_data: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: String,
    pub value: String,
    pub subtitle: Option<String>,
    pub trend: Sentiment,
}

impl MetricCard {
    pub fn new(title: &str, value: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            value: value.into(),
            subtitle: None,
            trend: Sentiment::Neutral,
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn trend(mut self, trend: Sentiment) -> Self {
        self.trend = trend;
        self
    }
}

/// `#RRGGBB` to its components.
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
