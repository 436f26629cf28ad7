pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use chrono::NaiveDate;
use log::{debug, info, warn};
use models::{
    action::DashboardAction,
    holding::{default_funds, Fund, Holding},
    market_event::{default_events, MarketEvent},
    series::PortfolioValueSeries,
    settings::Settings,
    timeframe::{DateRange, TimeFrame},
};
use providers::{http::HttpMarketDataSource, traits::MarketDataSource};
use services::{
    generation::{Generation, GenerationCounter},
    graph_aggregator::GraphDataAggregator,
    portfolio_store::PortfolioStore,
    search_coordinator::{LookupRequest, SearchCoordinator},
    timeframe_resolver::TimeframeResolver,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use errors::CoreError;

/// Snapshot of the inputs a graph refresh was started from.
///
/// Hand it back to `publish_graph` together with the fetched series; the
/// series is only shown if no holding or timeframe change happened since.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphTicket {
    pub generation: Generation,
    pub holdings: Vec<Holding>,
    pub range: DateRange,
}

/// Main entry point for the portfolio timeline core.
///
/// Owns all application state: holdings, the active timeframe, the chart
/// series on display and both search fields. Components never share this
/// state directly; they call methods here or send a `DashboardAction`.
#[must_use]
pub struct PortfolioTimeline {
    settings: Settings,
    source: Arc<dyn MarketDataSource>,
    store: PortfolioStore,
    timeframe: TimeFrame,
    selected_event: Option<MarketEvent>,
    resolver: TimeframeResolver,
    aggregator: GraphDataAggregator,
    graph_generations: GenerationCounter,
    graph: PortfolioValueSeries,
    /// Generation `graph` was computed for; `None` until the first publish
    published: Option<Generation>,
    event_search: SearchCoordinator<MarketEvent>,
    fund_search: SearchCoordinator<Fund>,
    action_tx: UnboundedSender<DashboardAction>,
    action_rx: UnboundedReceiver<DashboardAction>,
}

impl std::fmt::Debug for PortfolioTimeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTimeline")
            .field("source", &self.source.name())
            .field("holdings", &self.store.len())
            .field("timeframe", &self.timeframe)
            .field("graph_points", &self.graph.len())
            .field("graph_generation", &self.graph_generations.current())
            .field("needs_refresh", &self.needs_refresh())
            .finish()
    }
}

impl PortfolioTimeline {
    /// Dashboard backed by the HTTP service described by `settings`.
    pub fn new(settings: Settings) -> Self {
        let source = Arc::new(HttpMarketDataSource::new(&settings));
        Self::with_source(settings, source)
    }

    /// Dashboard configured from environment variables.
    pub fn from_env() -> Self {
        Self::new(Settings::from_env())
    }

    /// Dashboard backed by any data source.
    pub fn with_source(settings: Settings, source: Arc<dyn MarketDataSource>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let debounce = settings.search_debounce();
        let store = PortfolioStore::new().with_new_holding_defaults(
            settings.default_holding_amount,
            settings.default_currency.clone(),
        );
        Self {
            aggregator: GraphDataAggregator::new(Arc::clone(&source)),
            source,
            store,
            timeframe: TimeFrame::default(),
            selected_event: None,
            resolver: TimeframeResolver::new(),
            graph_generations: GenerationCounter::new(),
            graph: Vec::new(),
            published: None,
            event_search: SearchCoordinator::with_debounce(default_events(), debounce),
            fund_search: SearchCoordinator::with_debounce(default_funds(), debounce),
            action_tx,
            action_rx,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ── Holdings ────────────────────────────────────────────────────

    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        self.store.holdings()
    }

    /// Sum of all holding amounts, recomputed on every call.
    #[must_use]
    pub fn total_investment(&self) -> f64 {
        self.store.total_investment()
    }

    /// Add a fund picked from search as a new holding.
    pub fn add_fund(&mut self, fund: &Fund) {
        self.store.add_holding(fund);
        self.invalidate_graph();
    }

    /// Remove the holding at `index`; stale indices are ignored.
    pub fn remove_holding(&mut self, index: usize) -> bool {
        let removed = self.store.remove_holding(index);
        if removed {
            self.invalidate_graph();
        }
        removed
    }

    /// Edit a holding's amount from user text; unusable text stores 0.
    pub fn update_amount(&mut self, index: usize, raw: &str) -> bool {
        let updated = self.store.update_amount(index, raw);
        if updated {
            self.invalidate_graph();
        }
        updated
    }

    pub fn reset_portfolio(&mut self) {
        self.store.reset();
        self.invalidate_graph();
    }

    // ── Timeframe ───────────────────────────────────────────────────

    #[must_use]
    pub fn timeframe(&self) -> TimeFrame {
        self.timeframe
    }

    #[must_use]
    pub fn selected_event(&self) -> Option<&MarketEvent> {
        self.selected_event.as_ref()
    }

    /// Switch the chart window. A symbolic window clears any event anchor.
    pub fn set_timeframe(&mut self, timeframe: TimeFrame) {
        if self.selected_event.as_ref().map(MarketEvent::anchor) != Some(timeframe) {
            self.selected_event = None;
        }
        self.timeframe = timeframe;
        self.invalidate_graph();
    }

    /// Anchor the chart to a market event's dates.
    pub fn select_event(&mut self, event: &MarketEvent) {
        info!("Anchoring timeline to {}", event.name);
        self.timeframe = event.anchor();
        self.selected_event = Some(event.clone());
        self.invalidate_graph();
    }

    /// Concrete dates for the active timeframe, resolved against today.
    #[must_use]
    pub fn date_range(&self) -> DateRange {
        self.resolver.resolve(&self.timeframe)
    }

    /// Concrete dates for the active timeframe, resolved against `today`.
    #[must_use]
    pub fn date_range_at(&self, today: NaiveDate) -> DateRange {
        self.resolver.resolve_at(&self.timeframe, today)
    }

    // ── Graph ───────────────────────────────────────────────────────

    /// The series currently on display.
    #[must_use]
    pub fn graph(&self) -> &PortfolioValueSeries {
        &self.graph
    }

    #[must_use]
    pub fn graph_generation(&self) -> Generation {
        self.graph_generations.current()
    }

    /// Whether the series on display was computed for older inputs, or
    /// nothing has been published yet. Every holding or timeframe change sets it.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        self.published != Some(self.graph_generations.current())
    }

    /// Snapshot the current inputs for a refresh.
    #[must_use]
    pub fn graph_ticket(&self) -> GraphTicket {
        self.graph_ticket_at_range(self.date_range())
    }

    /// Snapshot the current inputs, resolving the timeframe against `today`.
    #[must_use]
    pub fn graph_ticket_at(&self, today: NaiveDate) -> GraphTicket {
        self.graph_ticket_at_range(self.date_range_at(today))
    }

    fn graph_ticket_at_range(&self, range: DateRange) -> GraphTicket {
        GraphTicket {
            generation: self.graph_generations.current(),
            holdings: self.store.holdings().to_vec(),
            range,
        }
    }

    /// Fetch the combined series for a ticket. Does not touch display state.
    pub async fn fetch_graph(&self, ticket: &GraphTicket) -> PortfolioValueSeries {
        self.aggregator.fetch(&ticket.holdings, &ticket.range).await
    }

    /// Show `series` if `ticket` still describes the current inputs.
    /// Returns whether it was applied.
    pub fn publish_graph(&mut self, ticket: &GraphTicket, series: PortfolioValueSeries) -> bool {
        if !self.graph_generations.is_current(ticket.generation) {
            info!(
                "Discarding graph for {} (current {})",
                ticket.generation,
                self.graph_generations.current()
            );
            return false;
        }
        debug!("Publishing {} graph points for {}", series.len(), ticket.range);
        self.graph = series;
        self.published = Some(ticket.generation);
        true
    }

    /// Fetch and publish for the current inputs.
    pub async fn refresh_graph(&mut self) -> &PortfolioValueSeries {
        let ticket = self.graph_ticket();
        let series = self.fetch_graph(&ticket).await;
        self.publish_graph(&ticket, series);
        &self.graph
    }

    /// Refresh only if the inputs changed since the last publish.
    /// Returns whether a fetch was made.
    pub async fn refresh_graph_if_stale(&mut self) -> bool {
        if !self.needs_refresh() {
            return false;
        }
        self.refresh_graph().await;
        true
    }

    /// Chart heading for the current state.
    #[must_use]
    pub fn chart_title(&self) -> String {
        if let Some(event) = &self.selected_event {
            return format!("Portfolio: {} Impact", event.name);
        }
        match self.store.holdings() {
            [only] => format!("{} Historical Performance", only.name),
            [] => "Portfolio Historical Performance".to_string(),
            many => format!("Portfolio ({} holdings) Performance", many.len()),
        }
    }

    fn invalidate_graph(&mut self) {
        let generation = self.graph_generations.advance();
        debug!("Graph inputs changed; now at {generation}");
    }

    // ── Market event search ─────────────────────────────────────────

    #[must_use]
    pub fn event_results(&self) -> &[MarketEvent] {
        self.event_search.results()
    }

    #[must_use]
    pub fn event_search(&self) -> &SearchCoordinator<MarketEvent> {
        &self.event_search
    }

    pub fn type_event_query(&mut self, query: &str, now: Instant) {
        self.event_search.input(query, now);
    }

    pub fn submit_event_query(&mut self, query: &str) -> Option<LookupRequest> {
        self.event_search.submit(query)
    }

    pub fn poll_event_search(&mut self, now: Instant) -> Option<LookupRequest> {
        self.event_search.poll(now)
    }

    /// Run a market event lookup. The single-event endpoint answers with one event.
    pub async fn lookup_events(&self, request: &LookupRequest) -> Result<Vec<MarketEvent>, CoreError> {
        let event = self.source.get_market_event(&request.query).await?;
        Ok(vec![event])
    }

    pub fn complete_event_search(
        &mut self,
        request: &LookupRequest,
        outcome: Result<Vec<MarketEvent>, CoreError>,
    ) -> bool {
        self.event_search.complete(request.generation, outcome)
    }

    /// Issue the debounced event lookup if it is due and apply its result.
    pub async fn drive_event_search(&mut self, now: Instant) -> bool {
        let Some(request) = self.event_search.poll(now) else {
            return false;
        };
        let outcome = self.lookup_events(&request).await;
        self.complete_event_search(&request, outcome)
    }

    /// List events from the browse endpoint, falling back to the built-in list.
    pub async fn browse_market_events(&self, query: &str) -> Vec<MarketEvent> {
        match self.source.search_market_events(query).await {
            Ok(events) => events,
            Err(e) => {
                warn!("Market event listing failed, using defaults: {e}");
                default_events()
            }
        }
    }

    // ── Fund search ─────────────────────────────────────────────────

    #[must_use]
    pub fn fund_results(&self) -> &[Fund] {
        self.fund_search.results()
    }

    #[must_use]
    pub fn fund_search(&self) -> &SearchCoordinator<Fund> {
        &self.fund_search
    }

    pub fn type_fund_query(&mut self, query: &str, now: Instant) {
        self.fund_search.input(query, now);
    }

    pub fn submit_fund_query(&mut self, query: &str) -> Option<LookupRequest> {
        self.fund_search.submit(query)
    }

    pub fn poll_fund_search(&mut self, now: Instant) -> Option<LookupRequest> {
        self.fund_search.poll(now)
    }

    pub async fn lookup_funds(&self, request: &LookupRequest) -> Result<Vec<Fund>, CoreError> {
        self.source.search_funds(&request.query).await
    }

    pub fn complete_fund_search(
        &mut self,
        request: &LookupRequest,
        outcome: Result<Vec<Fund>, CoreError>,
    ) -> bool {
        self.fund_search.complete(request.generation, outcome)
    }

    /// Issue the debounced fund lookup if it is due and apply its result.
    pub async fn drive_fund_search(&mut self, now: Instant) -> bool {
        let Some(request) = self.fund_search.poll(now) else {
            return false;
        };
        let outcome = self.lookup_funds(&request).await;
        self.complete_fund_search(&request, outcome)
    }

    // ── Actions ─────────────────────────────────────────────────────

    /// A handle components use to report user intents.
    #[must_use]
    pub fn action_sender(&self) -> UnboundedSender<DashboardAction> {
        self.action_tx.clone()
    }

    /// Apply one action immediately.
    pub fn dispatch(&mut self, action: DashboardAction) {
        match action {
            DashboardAction::FundSelected(fund) => self.add_fund(&fund),
            DashboardAction::HoldingRemoved(index) => {
                self.remove_holding(index);
            }
            DashboardAction::AmountEdited { index, raw } => {
                self.update_amount(index, &raw);
            }
            DashboardAction::TimeframeSelected(timeframe) => self.set_timeframe(timeframe),
            DashboardAction::EventSelected(event) => self.select_event(&event),
            DashboardAction::PortfolioReset => self.reset_portfolio(),
        }
    }

    /// Apply every queued action in send order. Returns how many were applied.
    pub fn process_actions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.action_rx.try_recv() {
            debug!("Applying {action:?}");
            self.dispatch(action);
            applied += 1;
        }
        applied
    }
}
