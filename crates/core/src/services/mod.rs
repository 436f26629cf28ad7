pub mod generation;
pub mod graph_aggregator;
pub mod portfolio_store;
pub mod search_coordinator;
pub mod synthetic_series;
pub mod timeframe_resolver;
