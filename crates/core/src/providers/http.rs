use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::traits::MarketDataSource;
use crate::errors::CoreError;
use crate::models::holding::{Fund, FundSearchResponse};
use crate::models::market_event::{MarketEvent, MarketEventsResponse};
use crate::models::series::GraphDataRequest;
use crate::models::settings::Settings;

const PROVIDER: &str = "DashboardBackend";

/// JSON-over-HTTP client for the dashboard backend.
///
/// - `GET  /market-events?q=`   → `{ events: [...] }`
/// - `GET  /market-event?query=` → `{ name, start_date, end_date, description }`
/// - `GET  /funds?query=`        → `{ funds: [...] }`
/// - `POST /graph-data`          → `{ data: [{ date, <ticker>: value, ... }] }`
///
/// Every request carries `Content-Type: application/json`. Non-2xx statuses
/// become `CoreError::Api` with the status code in the message.
pub struct HttpMarketDataSource {
    client: Client,
    base_url: String,
}

impl HttpMarketDataSource {
    pub fn new(settings: &Settings) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(settings.request_timeout());
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an endpoint path such as `/funds`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(self.endpoint(path))
            .header(CONTENT_TYPE, "application/json")
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.client
            .post(self.endpoint(path))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, CoreError> {
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!("{PROVIDER} returned {status} for {what}");
            return Err(CoreError::Api {
                provider: PROVIDER.into(),
                message: format!("{what} failed with status {}", status.as_u16()),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            CoreError::Deserialization(format!("Failed to parse {what} response: {e}"))
        })
    }
}

impl Default for HttpMarketDataSource {
    fn default() -> Self {
        Self::new(&Settings::default())
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl MarketDataSource for HttpMarketDataSource {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn search_market_events(&self, query: &str) -> Result<Vec<MarketEvent>, CoreError> {
        let mut request = self.get("/market-events");
        if !query.trim().is_empty() {
            request = request.query(&[("q", query)]);
        }
        debug!("Searching market events for {query:?}");

        let resp: MarketEventsResponse = self.send_json(request, "market event search").await?;
        Ok(resp.events)
    }

    async fn get_market_event(&self, query: &str) -> Result<MarketEvent, CoreError> {
        if query.trim().is_empty() {
            return Err(CoreError::EmptyQuery);
        }
        let request = self.get("/market-event").query(&[("query", query)]);
        debug!("Resolving market event for {query:?}");

        self.send_json(request, "market event lookup").await
    }

    async fn search_funds(&self, query: &str) -> Result<Vec<Fund>, CoreError> {
        let request = self.get("/funds").query(&[("query", query)]);
        debug!("Searching funds for {query:?}");

        let resp: FundSearchResponse = self.send_json(request, "fund search").await?;
        Ok(resp.funds)
    }

    async fn fetch_graph_data(&self, request: &GraphDataRequest) -> Result<Value, CoreError> {
        debug!(
            "Requesting graph data for {} holdings ({:?}..{:?})",
            request.holdings.len(),
            request.start_date,
            request.end_date
        );
        let http_request = self.post("/graph-data").json(request);

        self.send_json(http_request, "graph data").await
    }
}
