use chrono::{Months, NaiveDate, Utc};

use crate::models::timeframe::{DateRange, TimeFrame};

/// Turns the active timeframe into concrete dates.
///
/// Symbolic windows end today (UTC) at the moment of the call; nothing is
/// cached. Month arithmetic clamps to the last day of the target month, so
/// 2024-02-29 minus one year is 2023-02-28 and 2024-08-31 minus six months
/// is 2024-02-29.
pub struct TimeframeResolver;

impl TimeframeResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve against today's date.
    pub fn resolve(&self, timeframe: &TimeFrame) -> DateRange {
        self.resolve_at(timeframe, Utc::now().date_naive())
    }

    /// Resolve against an explicit "today".
    pub fn resolve_at(&self, timeframe: &TimeFrame, today: NaiveDate) -> DateRange {
        match timeframe {
            TimeFrame::EventAnchor { start, end } => DateRange::new(*start, *end),
            symbolic => {
                let months = symbolic.months_back().unwrap_or(12);
                DateRange::new(Self::months_before(today, months), today)
            }
        }
    }

    /// Resolve a button label; unknown labels resolve as one year.
    pub fn resolve_label(&self, label: &str, today: NaiveDate) -> DateRange {
        self.resolve_at(&TimeFrame::from_label(label), today)
    }

    fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
        date.checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for TimeframeResolver {
    fn default() -> Self {
        Self::new()
    }
}
