use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The window the chart is looking at.
///
/// Exactly one timeframe is active at a time. An event anchor stays active
/// until the user picks one of the symbolic windows again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeFrame {
    SixMonths,
    #[default]
    OneYear,
    FiveYears,
    TenYears,
    /// Explicit dates taken from a historical market event
    EventAnchor { start: NaiveDate, end: NaiveDate },
}

impl TimeFrame {
    /// Parse a button label (`6M`, `1Y`, `5Y`, `10Y`).
    ///
    /// Anything else falls back to `OneYear`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "6M" => TimeFrame::SixMonths,
            "1Y" => TimeFrame::OneYear,
            "5Y" => TimeFrame::FiveYears,
            "10Y" => TimeFrame::TenYears,
            _ => TimeFrame::OneYear,
        }
    }

    /// Button label for symbolic windows, `None` for event anchors.
    pub fn label(&self) -> Option<&'static str> {
        match self {
            TimeFrame::SixMonths => Some("6M"),
            TimeFrame::OneYear => Some("1Y"),
            TimeFrame::FiveYears => Some("5Y"),
            TimeFrame::TenYears => Some("10Y"),
            TimeFrame::EventAnchor { .. } => None,
        }
    }

    /// How many calendar months a symbolic window looks back.
    pub fn months_back(&self) -> Option<u32> {
        match self {
            TimeFrame::SixMonths => Some(6),
            TimeFrame::OneYear => Some(12),
            TimeFrame::FiveYears => Some(60),
            TimeFrame::TenYears => Some(120),
            TimeFrame::EventAnchor { .. } => None,
        }
    }

    pub fn is_event_anchor(&self) -> bool {
        matches!(self, TimeFrame::EventAnchor { .. })
    }
}

/// A closed interval of calendar days. `start_date <= end_date` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// Build a range, swapping the bounds if they arrive reversed.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start_date: a, end_date: b }
        } else {
            Self { start_date: b, end_date: a }
        }
    }

    /// Number of days between start and end (0 for a single-day range).
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}..{}",
            self.start_date.format("%Y-%m-%d"),
            self.end_date.format("%Y-%m-%d")
        )
    }
}
