use log::{debug, warn};
use std::sync::Arc;

use crate::models::holding::Holding;
use crate::models::series::{GraphDataRequest, PortfolioValueSeries, RawSeries};
use crate::models::timeframe::DateRange;
use crate::providers::traits::MarketDataSource;
use crate::services::synthetic_series::SyntheticSeriesGenerator;

/// Where a combined series came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeriesOrigin {
    /// Reduced from the collaborator's rows
    Collaborator,
    /// Generated because the real data path produced nothing usable
    Synthetic(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    NoTickers,
    RequestFailed(String),
    MalformedPayload,
    EmptyData,
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::NoTickers => write!(f, "no holding has a ticker"),
            FallbackReason::RequestFailed(e) => write!(f, "request failed: {e}"),
            FallbackReason::MalformedPayload => write!(f, "malformed payload"),
            FallbackReason::EmptyData => write!(f, "empty data"),
        }
    }
}

/// A combined series plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphFetch {
    pub series: PortfolioValueSeries,
    pub origin: SeriesOrigin,
}

/// Builds the combined portfolio series for a set of holdings and a date range.
///
/// 1. Keep holdings that have a ticker; send each as `{ ticker, purchase_value }`
/// 2. Issue one graph-data request for all of them over the range
/// 3. Sum every ticker field of every returned row into a single value
/// 4. On an empty/malformed payload or a failed request, generate a synthetic
///    series over the same range instead
///
/// Never fails. Rows are kept in the order received; no gap filling.
pub struct GraphDataAggregator {
    source: Arc<dyn MarketDataSource>,
    generator: SyntheticSeriesGenerator,
}

impl GraphDataAggregator {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            source,
            generator: SyntheticSeriesGenerator::new(),
        }
    }

    /// Combined series for `holdings` over `range`.
    pub async fn fetch(&self, holdings: &[Holding], range: &DateRange) -> PortfolioValueSeries {
        self.fetch_detailed(holdings, range).await.series
    }

    /// Same as `fetch`, also reporting whether the fallback was used.
    pub async fn fetch_detailed(&self, holdings: &[Holding], range: &DateRange) -> GraphFetch {
        let request = GraphDataRequest::from_holdings(holdings, range);
        if request.holdings.is_empty() {
            return self.fallback(range, FallbackReason::NoTickers);
        }

        let payload = match self.source.fetch_graph_data(&request).await {
            Ok(payload) => payload,
            Err(e) => return self.fallback(range, FallbackReason::RequestFailed(e.to_string())),
        };

        let Some(raw) = RawSeries::from_payload(&payload) else {
            return self.fallback(range, FallbackReason::MalformedPayload);
        };
        if raw.is_empty() {
            return self.fallback(range, FallbackReason::EmptyData);
        }

        debug!(
            "{} returned {} rows for {} holdings over {range}",
            self.source.name(),
            raw.len(),
            request.holdings.len()
        );
        GraphFetch {
            series: raw.to_value_series(),
            origin: SeriesOrigin::Collaborator,
        }
    }

    fn fallback(&self, range: &DateRange, reason: FallbackReason) -> GraphFetch {
        warn!("Using synthetic series for {range}: {reason}");
        GraphFetch {
            series: self.generator.generate(range),
            origin: SeriesOrigin::Synthetic(reason),
        }
    }
}
