use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::models::series::{PortfolioValuePoint, PortfolioValueSeries};
use crate::models::timeframe::DateRange;

/// Value of the first synthetic point.
pub const SYNTHETIC_BASELINE: f64 = 100.0;

/// Largest relative move between two consecutive synthetic points.
pub const MAX_STEP_CHANGE: f64 = 0.02;

/// Produces a plausible-looking value series when real data is unavailable.
///
/// This keeps the chart populated during outages and for portfolios the
/// backend can't price. It is a bounded random walk, not a market model:
/// starting at `SYNTHETIC_BASELINE`, every step moves by at most ±2%.
///
/// Sampling interval depends on the span:
/// - more than 3 years → every 30 days
/// - more than 1 year  → every 14 days
/// - more than 90 days → every 7 days
/// - otherwise         → daily
///
/// A span of `days` yields `ceil(days / interval)` points, and never fewer than one.
pub struct SyntheticSeriesGenerator;

impl SyntheticSeriesGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate with the thread-local RNG. Values differ between calls.
    pub fn generate(&self, range: &DateRange) -> PortfolioValueSeries {
        self.generate_with(range, &mut rand::thread_rng())
    }

    /// Generate with a caller-supplied RNG.
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        range: &DateRange,
        rng: &mut R,
    ) -> PortfolioValueSeries {
        let days = range.span_days().max(0);
        let interval = Self::interval_days(days);

        let mut series = Vec::with_capacity(Self::point_count(days) as usize);
        let mut value = SYNTHETIC_BASELINE;
        let mut offset = 0;

        loop {
            series.push(PortfolioValuePoint {
                date: format_date(
                    range
                        .start_date
                        .checked_add_signed(Duration::days(offset))
                        .unwrap_or(range.end_date),
                ),
                portfolio_value: value,
            });

            offset += interval;
            if offset >= days {
                break;
            }
            value *= 1.0 + rng.gen_range(-MAX_STEP_CHANGE..=MAX_STEP_CHANGE);
        }

        series
    }

    /// Step size in days for a span of `days`.
    pub fn interval_days(days: i64) -> i64 {
        if days > 3 * 365 {
            30
        } else if days > 365 {
            14
        } else if days > 90 {
            7
        } else {
            1
        }
    }

    /// Number of points `generate` produces for a span of `days`.
    pub fn point_count(days: i64) -> i64 {
        let days = days.max(0);
        let interval = Self::interval_days(days);
        ((days + interval - 1) / interval).max(1)
    }
}

impl Default for SyntheticSeriesGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
