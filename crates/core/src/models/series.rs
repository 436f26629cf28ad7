use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::holding::Holding;
use super::timeframe::DateRange;

/// One position as sent to the graph-data endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRequest {
    pub ticker: String,
    pub purchase_value: f64,
}

/// Body of `POST /graph-data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDataRequest {
    pub holdings: Vec<HoldingRequest>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

impl GraphDataRequest {
    /// Keep only holdings with a ticker; the amount travels as `purchase_value`.
    pub fn from_holdings(holdings: &[Holding], range: &DateRange) -> Self {
        Self {
            holdings: holdings
                .iter()
                .filter(|h| h.has_ticker())
                .map(|h| HoldingRequest {
                    ticker: h.ticker.trim().to_string(),
                    purchase_value: h.amount,
                })
                .collect(),
            start_date: Some(range.start_date),
            end_date: Some(range.end_date),
        }
    }
}

/// A row returned by the price collaborator: a `date` plus one value per ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPricePoint {
    fields: Map<String, Value>,
}

impl RawPricePoint {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// The row's date as sent. Non-string dates are rendered as JSON text.
    pub fn date(&self) -> String {
        match self.fields.get("date") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Sum of every non-`date` field. Values that don't parse count as 0.
    pub fn total_value(&self) -> f64 {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != "date")
            .map(|(_, value)| numeric_value(value))
            .sum()
    }
}

fn numeric_value(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Per-date, per-ticker rows in the order the collaborator sent them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSeries {
    pub rows: Vec<RawPricePoint>,
}

impl RawSeries {
    /// Extract the rows from a `{ "data": [...] }` payload.
    ///
    /// Returns `None` when the payload is null, not an object, or its `data`
    /// is not an array. Rows that are not JSON objects are dropped.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let data = payload.as_object()?.get("data")?.as_array()?;
        let rows = data
            .iter()
            .filter_map(|row| row.as_object().cloned().map(RawPricePoint::new))
            .collect();
        Some(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Collapse every row to its combined value, keeping row order.
    pub fn to_value_series(&self) -> PortfolioValueSeries {
        self.rows
            .iter()
            .map(|row| PortfolioValuePoint {
                date: row.date(),
                portfolio_value: row.total_value(),
            })
            .collect()
    }
}

/// A single point of the combined portfolio series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioValuePoint {
    pub date: String,

    #[serde(rename = "portfolioValue")]
    pub portfolio_value: f64,
}

/// Date-ordered combined valuation series shown on the chart.
pub type PortfolioValueSeries = Vec<PortfolioValuePoint>;
