use log::debug;

use crate::models::holding::{Fund, Holding, DEFAULT_CURRENCY, DEFAULT_HOLDING_AMOUNT};

/// Amount of the S&P 500 position a fresh portfolio starts with.
pub const INITIAL_HOLDING_AMOUNT: f64 = 10_000.0;

/// Amount of the S&P 500 position restored when the portfolio is reset or emptied.
pub const RECOVERY_HOLDING_AMOUNT: f64 = 500.0;

/// Owns the ordered list of holdings.
///
/// Pure state, no I/O. Every mutation that changes something bumps
/// `revision`, which callers use to tell whether results computed from an
/// earlier snapshot are still valid. The list is never left empty.
#[derive(Debug, Clone)]
pub struct PortfolioStore {
    holdings: Vec<Holding>,
    revision: u64,
    new_holding_amount: f64,
    new_holding_currency: String,
}

impl PortfolioStore {
    pub fn new() -> Self {
        Self::with_holdings(vec![Holding::sp500(INITIAL_HOLDING_AMOUNT)])
    }

    /// Start from an explicit list. An empty list is replaced by the recovery holding.
    pub fn with_holdings(mut holdings: Vec<Holding>) -> Self {
        for holding in &mut holdings {
            holding.amount = sanitize_amount(holding.amount);
        }
        let mut store = Self {
            holdings,
            revision: 0,
            new_holding_amount: DEFAULT_HOLDING_AMOUNT,
            new_holding_currency: DEFAULT_CURRENCY.to_string(),
        };
        store.ensure_not_empty();
        store
    }

    /// Override the amount and currency used by `add_holding`.
    pub fn with_new_holding_defaults(mut self, amount: f64, currency: impl Into<String>) -> Self {
        self.new_holding_amount = sanitize_amount(amount);
        self.new_holding_currency = currency.into();
        self
    }

    pub fn holdings(&self) -> &[Holding] {
        &self.holdings
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Append a fund with the default amount and currency.
    /// Duplicate tickers are allowed.
    pub fn add_holding(&mut self, fund: &Fund) {
        let mut holding = Holding::from_fund(fund);
        holding.amount = self.new_holding_amount;
        holding.currency = self.new_holding_currency.clone();
        debug!("Adding holding {} ({})", holding.ticker, holding.name);
        self.holdings.push(holding);
        self.touch();
    }

    /// Remove the holding at `index`. Out-of-range indices are ignored.
    /// Returns whether anything was removed.
    pub fn remove_holding(&mut self, index: usize) -> bool {
        if index >= self.holdings.len() {
            debug!("Ignoring removal of stale holding index {index}");
            return false;
        }
        let removed = self.holdings.remove(index);
        debug!("Removed holding {} at {index}", removed.ticker);
        self.ensure_not_empty();
        self.touch();
        true
    }

    /// Set the amount at `index` from user text.
    ///
    /// Text that isn't a finite, non-negative decimal stores 0.
    /// Out-of-range indices are ignored. Returns whether a holding was updated.
    pub fn update_amount(&mut self, index: usize, raw: &str) -> bool {
        let Some(holding) = self.holdings.get_mut(index) else {
            debug!("Ignoring amount edit for stale holding index {index}");
            return false;
        };
        holding.amount = parse_amount(raw);
        self.touch();
        true
    }

    /// Replace everything with the single recovery holding.
    pub fn reset(&mut self) {
        self.holdings = vec![Holding::sp500(RECOVERY_HOLDING_AMOUNT)];
        self.touch();
    }

    /// Sum of all holding amounts, computed on every call.
    pub fn total_investment(&self) -> f64 {
        self.holdings.iter().map(|h| h.amount).sum()
    }

    fn ensure_not_empty(&mut self) {
        if self.holdings.is_empty() {
            debug!("Portfolio emptied; restoring default holding");
            self.holdings.push(Holding::sp500(RECOVERY_HOLDING_AMOUNT));
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Default for PortfolioStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Lenient decimal parse used for amount edits: anything unusable becomes 0.
pub fn parse_amount(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(sanitize_amount)
        .unwrap_or(0.0)
}

fn sanitize_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
