use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use portfolio_timeline_core::errors::CoreError;
use portfolio_timeline_core::models::action::DashboardAction;
use portfolio_timeline_core::models::holding::{default_funds, Fund, FundType};
use portfolio_timeline_core::models::market_event::{default_events, MarketEvent};
use portfolio_timeline_core::models::series::{GraphDataRequest, PortfolioValuePoint};
use portfolio_timeline_core::models::settings::Settings;
use portfolio_timeline_core::models::timeframe::{DateRange, TimeFrame};
use portfolio_timeline_core::providers::traits::MarketDataSource;
use portfolio_timeline_core::PortfolioTimeline;

// ═══════════════════════════════════════════════════════════════════
// Mock Backend (for testing without a running dashboard service)
// ═══════════════════════════════════════════════════════════════════

struct MockBackend {
    graph: Option<Value>,
    events: Option<Vec<MarketEvent>>,
    funds: Option<Vec<Fund>>,
    graph_requests: Mutex<Vec<GraphDataRequest>>,
    lookups: Mutex<Vec<String>>,
}

impl MockBackend {
    fn new() -> Self {
        Self {
            graph: Some(json!({
                "data": [
                    { "date": "2024-01-02", "SPY": 10000.0 },
                    { "date": "2024-01-03", "SPY": 10100.0 }
                ]
            })),
            events: Some(vec![flash_crash()]),
            funds: Some(vec![Fund::new("Apple Inc.", "AAPL", FundType::Stock, "")]),
            graph_requests: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    /// Every endpoint fails.
    fn offline() -> Self {
        Self {
            graph: None,
            events: None,
            funds: None,
            ..Self::new()
        }
    }

    fn down() -> CoreError {
        CoreError::Network("backend offline".into())
    }
}

#[async_trait]
impl MarketDataSource for MockBackend {
    fn name(&self) -> &str {
        "MockBackend"
    }

    async fn search_market_events(&self, _query: &str) -> Result<Vec<MarketEvent>, CoreError> {
        self.events.clone().ok_or_else(Self::down)
    }

    async fn get_market_event(&self, query: &str) -> Result<MarketEvent, CoreError> {
        self.lookups.lock().unwrap().push(format!("event:{query}"));
        self.events
            .as_ref()
            .and_then(|events| events.first().cloned())
            .ok_or_else(Self::down)
    }

    async fn search_funds(&self, query: &str) -> Result<Vec<Fund>, CoreError> {
        self.lookups.lock().unwrap().push(format!("fund:{query}"));
        self.funds.clone().ok_or_else(Self::down)
    }

    async fn fetch_graph_data(&self, request: &GraphDataRequest) -> Result<Value, CoreError> {
        self.graph_requests.lock().unwrap().push(request.clone());
        self.graph.clone().ok_or_else(Self::down)
    }
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn flash_crash() -> MarketEvent {
    MarketEvent::new("Flash Crash", d(2010, 5, 6), d(2010, 5, 7), "Intraday drop")
}

fn timeline_with(backend: Arc<MockBackend>) -> PortfolioTimeline {
    PortfolioTimeline::with_source(Settings::default(), backend)
}

fn qqq() -> Fund {
    Fund::new("Invesco QQQ Trust", "QQQ", FundType::Etf, "Nasdaq-100")
}

// ═══════════════════════════════════════════════════════════════════
// Initial state
// ═══════════════════════════════════════════════════════════════════

mod initial_state {
    use super::*;

    #[test]
    fn defaults() {
        let timeline = timeline_with(Arc::new(MockBackend::new()));
        assert_eq!(timeline.holdings().len(), 1);
        assert_eq!(timeline.holdings()[0].ticker, "SPY");
        assert_eq!(timeline.total_investment(), 10_000.0);
        assert_eq!(timeline.timeframe(), TimeFrame::OneYear);
        assert!(timeline.selected_event().is_none());
        assert!(timeline.graph().is_empty());
        assert_eq!(timeline.event_results(), default_events().as_slice());
        assert_eq!(timeline.fund_results(), default_funds().as_slice());
    }

    #[test]
    fn debug_names_source() {
        let timeline = timeline_with(Arc::new(MockBackend::new()));
        assert!(format!("{timeline:?}").contains("MockBackend"));
    }

    #[test]
    fn settings_drive_new_holding_defaults() {
        let settings = Settings {
            default_holding_amount: 42.0,
            default_currency: "EUR".into(),
            ..Settings::default()
        };
        let mut timeline = PortfolioTimeline::with_source(settings, Arc::new(MockBackend::new()));
        timeline.add_fund(&qqq());
        assert_eq!(timeline.holdings()[1].amount, 42.0);
        assert_eq!(timeline.holdings()[1].currency, "EUR");
    }
}

// ═══════════════════════════════════════════════════════════════════
// Graph refresh and last-writer-wins publishing
// ═══════════════════════════════════════════════════════════════════

mod graph {
    use super::*;

    #[tokio::test]
    async fn refresh_publishes_backend_series() {
        let backend = Arc::new(MockBackend::new());
        let mut timeline = timeline_with(backend.clone());

        let series = timeline.refresh_graph().await.clone();
        assert_eq!(
            series,
            vec![
                PortfolioValuePoint { date: "2024-01-02".into(), portfolio_value: 10000.0 },
                PortfolioValuePoint { date: "2024-01-03".into(), portfolio_value: 10100.0 },
            ]
        );
        assert_eq!(timeline.graph(), &series);

        let requests = backend.graph_requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].holdings[0].ticker, "SPY");
        assert_eq!(requests[0].holdings[0].purchase_value, 10_000.0);
    }

    #[tokio::test]
    async fn offline_backend_still_draws_a_chart() {
        let mut timeline = timeline_with(Arc::new(MockBackend::offline()));
        let series = timeline.refresh_graph().await;
        assert!(!series.is_empty());
        assert!(series.iter().all(|p| p.portfolio_value > 0.0));
    }

    #[tokio::test]
    async fn ticket_carries_resolved_range() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        timeline.set_timeframe(TimeFrame::SixMonths);
        let ticket = timeline.graph_ticket_at(d(2024, 10, 15));
        assert_eq!(ticket.range, DateRange::new(d(2024, 4, 15), d(2024, 10, 15)));
        assert_eq!(ticket.holdings, timeline.holdings());
        assert_eq!(ticket.generation, timeline.graph_generation());
    }

    #[tokio::test]
    async fn stale_ticket_is_discarded() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));

        let old = timeline.graph_ticket();
        let old_series = timeline.fetch_graph(&old).await;

        timeline.add_fund(&qqq());
        let new = timeline.graph_ticket();
        let new_series = vec![PortfolioValuePoint { date: "2024-06-01".into(), portfolio_value: 1.0 }];

        assert!(timeline.publish_graph(&new, new_series.clone()));
        assert!(!timeline.publish_graph(&old, old_series));
        assert_eq!(timeline.graph(), &new_series);
    }

    #[tokio::test]
    async fn every_input_change_invalidates_pending_refresh() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let changes: Vec<Box<dyn Fn(&mut PortfolioTimeline)>> = vec![
            Box::new(|t| t.add_fund(&qqq())),
            Box::new(|t| {
                t.update_amount(0, "5");
            }),
            Box::new(|t| {
                t.remove_holding(0);
            }),
            Box::new(|t| t.set_timeframe(TimeFrame::FiveYears)),
            Box::new(|t| t.select_event(&flash_crash())),
            Box::new(|t| t.reset_portfolio()),
        ];

        for change in changes {
            let ticket = timeline.graph_ticket();
            change(&mut timeline);
            assert!(!timeline.publish_graph(&ticket, vec![]));
        }
    }

    #[test]
    fn nothing_published_needs_refresh() {
        let timeline = timeline_with(Arc::new(MockBackend::new()));
        assert!(timeline.needs_refresh());
        assert!(timeline.graph().is_empty());
    }

    #[tokio::test]
    async fn mutations_mark_displayed_graph_stale() {
        let backend = Arc::new(MockBackend::new());
        let mut timeline = timeline_with(backend.clone());

        timeline.refresh_graph().await;
        assert!(!timeline.needs_refresh());

        timeline.set_timeframe(TimeFrame::TenYears);
        assert!(timeline.needs_refresh());
        timeline.add_fund(&qqq());
        assert!(timeline.needs_refresh());

        timeline.refresh_graph().await;
        assert!(!timeline.needs_refresh());

        let requests = backend.graph_requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        let tickers: Vec<&str> = requests[1].holdings.iter().map(|h| h.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["SPY", "QQQ"]);
        let span = (requests[1].end_date.unwrap() - requests[1].start_date.unwrap()).num_days();
        assert!(span > 3600, "{span}");
    }

    #[tokio::test]
    async fn refresh_if_stale_fetches_once_per_change() {
        let backend = Arc::new(MockBackend::new());
        let mut timeline = timeline_with(backend.clone());

        assert!(timeline.refresh_graph_if_stale().await);
        assert!(!timeline.refresh_graph_if_stale().await);

        timeline.update_amount(0, "20000");
        assert!(timeline.refresh_graph_if_stale().await);
        assert!(!timeline.refresh_graph_if_stale().await);

        assert_eq!(backend.graph_requests.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn stale_publish_keeps_refresh_flag() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let old = timeline.graph_ticket();
        timeline.add_fund(&qqq());

        assert!(!timeline.publish_graph(&old, vec![]));
        assert!(timeline.needs_refresh());
    }

    #[test]
    fn ignored_edits_do_not_invalidate() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let generation = timeline.graph_generation();
        assert!(!timeline.remove_holding(7));
        assert!(!timeline.update_amount(7, "1"));
        assert_eq!(timeline.graph_generation(), generation);
        assert!(timeline.needs_refresh());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Timeframe, events and chart title
// ═══════════════════════════════════════════════════════════════════

mod timeframe_and_events {
    use super::*;

    #[test]
    fn selecting_event_anchors_range() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        timeline.select_event(&flash_crash());

        assert_eq!(timeline.timeframe(), flash_crash().anchor());
        assert_eq!(
            timeline.date_range_at(d(2024, 1, 1)),
            DateRange::new(d(2010, 5, 6), d(2010, 5, 7))
        );
        assert_eq!(timeline.chart_title(), "Portfolio: Flash Crash Impact");
    }

    #[test]
    fn symbolic_timeframe_clears_event() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        timeline.select_event(&flash_crash());
        timeline.set_timeframe(TimeFrame::TenYears);

        assert!(timeline.selected_event().is_none());
        assert_eq!(timeline.timeframe(), TimeFrame::TenYears);
    }

    #[test]
    fn reapplying_event_anchor_keeps_event() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        timeline.select_event(&flash_crash());
        timeline.set_timeframe(flash_crash().anchor());
        assert_eq!(timeline.selected_event(), Some(&flash_crash()));
    }

    #[test]
    fn title_reflects_holdings() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let name = timeline.holdings()[0].name.clone();
        assert_eq!(timeline.chart_title(), format!("{name} Historical Performance"));

        timeline.add_fund(&qqq());
        timeline.add_fund(&qqq());
        assert_eq!(timeline.chart_title(), "Portfolio (3 holdings) Performance");
    }

    #[test]
    fn date_range_ends_today() {
        let timeline = timeline_with(Arc::new(MockBackend::new()));
        let range = timeline.date_range();
        let today = chrono::Utc::now().date_naive();
        assert!(range.end_date <= today);
        assert!(range.span_days() >= 365);
    }

    #[tokio::test]
    async fn browse_returns_backend_events() {
        let timeline = timeline_with(Arc::new(MockBackend::new()));
        assert_eq!(timeline.browse_market_events("").await, vec![flash_crash()]);
    }

    #[tokio::test]
    async fn browse_falls_back_to_defaults() {
        let timeline = timeline_with(Arc::new(MockBackend::offline()));
        assert_eq!(timeline.browse_market_events("crash").await, default_events());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Search fields
// ═══════════════════════════════════════════════════════════════════

mod search {
    use super::*;

    #[tokio::test]
    async fn debounced_fund_search_issues_one_lookup() {
        let backend = Arc::new(MockBackend::new());
        let mut timeline = timeline_with(backend.clone());
        let t0 = Instant::now();

        timeline.type_fund_query("a", t0);
        timeline.type_fund_query("ap", t0 + Duration::from_millis(100));
        timeline.type_fund_query("app", t0 + Duration::from_millis(200));
        assert!(!timeline.drive_fund_search(t0 + Duration::from_millis(300)).await);
        assert!(timeline.drive_fund_search(t0 + Duration::from_millis(500)).await);

        assert_eq!(*backend.lookups.lock().unwrap(), vec!["fund:app".to_string()]);
        assert_eq!(timeline.fund_results()[0].ticker, "AAPL");
    }

    #[tokio::test]
    async fn event_search_uses_single_event_lookup() {
        let backend = Arc::new(MockBackend::new());
        let mut timeline = timeline_with(backend.clone());
        let t0 = Instant::now();

        timeline.type_event_query("flash", t0);
        assert!(timeline.drive_event_search(t0 + Duration::from_millis(300)).await);

        assert_eq!(timeline.event_results(), [flash_crash()].as_slice());
        assert_eq!(*backend.lookups.lock().unwrap(), vec!["event:flash".to_string()]);
    }

    #[tokio::test]
    async fn failed_lookup_clears_results() {
        let mut timeline = timeline_with(Arc::new(MockBackend::offline()));
        let request = timeline.submit_event_query("anything").unwrap();
        let outcome = timeline.lookup_events(&request).await;
        assert!(timeline.complete_event_search(&request, outcome));
        assert!(timeline.event_results().is_empty());
    }

    #[tokio::test]
    async fn late_fund_response_is_dropped() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));

        let first = timeline.submit_fund_query("ap").unwrap();
        let second = timeline.submit_fund_query("app").unwrap();

        let second_outcome = timeline.lookup_funds(&second).await;
        assert!(timeline.complete_fund_search(&second, second_outcome));
        assert!(!timeline.complete_fund_search(&first, Ok(vec![qqq()])));
        assert_eq!(timeline.fund_results()[0].ticker, "AAPL");
    }

    #[test]
    fn clearing_field_restores_defaults() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let request = timeline.submit_fund_query("zzz").unwrap();
        assert!(timeline.complete_fund_search(&request, Ok(vec![])));
        assert!(timeline.fund_results().is_empty());

        timeline.type_fund_query("", Instant::now());
        assert_eq!(timeline.fund_results(), default_funds().as_slice());
        assert!(timeline.poll_fund_search(Instant::now() + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn debounce_comes_from_settings() {
        let settings = Settings {
            search_debounce_ms: 50,
            ..Settings::default()
        };
        let mut timeline = PortfolioTimeline::with_source(settings, Arc::new(MockBackend::new()));
        let t0 = Instant::now();
        timeline.type_event_query("covid", t0);
        assert_eq!(timeline.event_search().deadline(), Some(t0 + Duration::from_millis(50)));
        assert!(timeline.poll_event_search(t0 + Duration::from_millis(50)).is_some());
        assert!(timeline.fund_search().deadline().is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Action channel
// ═══════════════════════════════════════════════════════════════════

mod actions {
    use super::*;

    #[test]
    fn actions_apply_in_send_order() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let sender = timeline.action_sender();

        sender.send(DashboardAction::FundSelected(qqq())).unwrap();
        sender
            .send(DashboardAction::AmountEdited { index: 1, raw: "250".into() })
            .unwrap();
        sender.send(DashboardAction::HoldingRemoved(0)).unwrap();
        sender.send(DashboardAction::EventSelected(flash_crash())).unwrap();

        assert_eq!(timeline.holdings().len(), 1);
        assert_eq!(timeline.process_actions(), 4);

        assert_eq!(timeline.holdings().len(), 1);
        assert_eq!(timeline.holdings()[0].ticker, "QQQ");
        assert_eq!(timeline.total_investment(), 250.0);
        assert_eq!(timeline.selected_event(), Some(&flash_crash()));
        assert_eq!(timeline.process_actions(), 0);
    }

    #[test]
    fn senders_from_other_threads() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        let sender = timeline.action_sender();

        std::thread::spawn(move || {
            sender
                .send(DashboardAction::TimeframeSelected(TimeFrame::SixMonths))
                .unwrap();
            sender.send(DashboardAction::PortfolioReset).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(timeline.process_actions(), 2);
        assert_eq!(timeline.timeframe(), TimeFrame::SixMonths);
        assert_eq!(timeline.total_investment(), 500.0);
    }

    #[test]
    fn stale_index_action_is_harmless() {
        let mut timeline = timeline_with(Arc::new(MockBackend::new()));
        timeline.dispatch(DashboardAction::HoldingRemoved(3));
        timeline.dispatch(DashboardAction::AmountEdited { index: 3, raw: "1".into() });
        assert_eq!(timeline.total_investment(), 10_000.0);
    }
}
