use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::timeframe::TimeFrame;

/// A historical market episode the chart can be anchored to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    #[serde(default)]
    pub description: String,
}

impl MarketEvent {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            start_date,
            end_date,
            description: description.into(),
        }
    }

    /// The timeframe that pins the chart to this event's dates.
    pub fn anchor(&self) -> TimeFrame {
        TimeFrame::EventAnchor {
            start: self.start_date,
            end: self.end_date,
        }
    }
}

/// `GET /market-events` response body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketEventsResponse {
    #[serde(default)]
    pub events: Vec<MarketEvent>,
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Events listed before the user searches for anything.
pub fn default_events() -> Vec<MarketEvent> {
    vec![
        MarketEvent::new(
            "COVID-19 Crash",
            ymd(2020, 3, 1),
            ymd(2020, 3, 31),
            "Market dropped 34% but recovered within 6 months, marking the shortest bear market in history.",
        ),
        MarketEvent::new(
            "2008 Financial Crisis",
            ymd(2008, 9, 1),
            ymd(2008, 9, 30),
            "The S&P 500 fell 46.13% and took approximately 4 years to recover to previous levels.",
        ),
        MarketEvent::new(
            "Dot-com Bubble",
            ymd(2000, 3, 1),
            ymd(2000, 3, 31),
            "Tech-heavy market collapse led to a 49.1% decline, taking 7 years to recover fully.",
        ),
    ]
}
