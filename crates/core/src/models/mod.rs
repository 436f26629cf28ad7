pub mod action;
pub mod holding;
pub mod market_event;
pub mod series;
pub mod settings;
pub mod timeframe;
