use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::holding::{DEFAULT_CURRENCY, DEFAULT_HOLDING_AMOUNT};

/// Runtime configuration for the dashboard core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Base URL of the price/fund/event service, without a trailing slash.
    pub base_url: String,

    /// Per-request HTTP timeout. A timed out request counts as "no data".
    pub request_timeout_secs: u64,

    /// Quiet period before a typed search query is sent.
    pub search_debounce_ms: u64,

    /// Currency label given to new holdings.
    pub default_currency: String,

    /// Amount given to a fund when it is added.
    pub default_holding_amount: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            search_debounce_ms: 300,
            default_currency: DEFAULT_CURRENCY.to_string(),
            default_holding_amount: DEFAULT_HOLDING_AMOUNT,
        }
    }
}

impl Settings {
    /// Defaults overlaid with `BACKEND_URL`, `BACKEND_TIMEOUT_SECS` and
    /// `SEARCH_DEBOUNCE_MS`. Unparseable numbers keep the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` but reads variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(url) = lookup("BACKEND_URL").filter(|u| !u.trim().is_empty()) {
            settings.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("BACKEND_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok()) {
            settings.request_timeout_secs = secs;
        }
        if let Some(ms) = lookup("SEARCH_DEBOUNCE_MS").and_then(|v| v.trim().parse().ok()) {
            settings.search_debounce_ms = ms;
        }

        settings
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}
