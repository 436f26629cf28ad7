use async_trait::async_trait;
use serde_json::Value;

use crate::errors::CoreError;
use crate::models::holding::Fund;
use crate::models::market_event::MarketEvent;
use crate::models::series::GraphDataRequest;

/// Trait abstraction over the price/fund/event data service.
///
/// The dashboard talks to one backend, but keeping it behind a trait lets the
/// services be driven by in-memory sources in tests and by alternative
/// transports without touching the aggregation or search logic.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait MarketDataSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// List market events matching free text (`GET /market-events?q=`).
    async fn search_market_events(&self, query: &str) -> Result<Vec<MarketEvent>, CoreError>;

    /// Resolve free text to a single market event (`GET /market-event?query=`).
    ///
    /// Implementations must reject a blank query with `CoreError::EmptyQuery`
    /// without doing any I/O.
    async fn get_market_event(&self, query: &str) -> Result<MarketEvent, CoreError>;

    /// Search funds, ETFs and stocks (`GET /funds?query=`).
    async fn search_funds(&self, query: &str) -> Result<Vec<Fund>, CoreError>;

    /// Fetch the raw per-ticker series (`POST /graph-data`).
    ///
    /// The body is returned undecoded; shape validation belongs to the
    /// aggregator, which falls back instead of failing.
    async fn fetch_graph_data(&self, request: &GraphDataRequest) -> Result<Value, CoreError>;
}
