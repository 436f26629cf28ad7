use thiserror::Error;

/// Unified error type for the entire portfolio-timeline-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Input ───────────────────────────────────────────────────────
    #[error("Search query must not be empty")]
    EmptyQuery,
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Search text travels in the query string; keep it out of logs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
