use super::holding::Fund;
use super::market_event::MarketEvent;
use super::timeframe::TimeFrame;

/// A user intent sent to the dashboard from a component that doesn't own state.
///
/// Components hold a sender; the dashboard is the only receiver and applies
/// actions in the order they were sent.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardAction {
    FundSelected(Fund),
    HoldingRemoved(usize),
    AmountEdited { index: usize, raw: String },
    TimeframeSelected(TimeFrame),
    EventSelected(MarketEvent),
    PortfolioReset,
}
