use log::{debug, info, warn};
use std::time::{Duration, Instant};

use crate::errors::CoreError;
use crate::services::generation::{Generation, GenerationCounter};

/// Quiet period after the last keystroke before a lookup is issued.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Where a search field is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchState {
    Idle,
    /// Waiting for typing to settle before issuing `query`
    Debouncing { query: String, deadline: Instant },
    /// A lookup for the current generation has been handed out
    InFlight { query: String },
}

/// A lookup the driver should perform, tagged with the generation it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub generation: Generation,
    pub query: String,
}

/// Debounced, last-request-wins search for one input field.
///
/// Every keystroke or submit advances the generation. A response is applied
/// only if it carries the current generation, so a slow answer to an older
/// query can never overwrite the answer to a newer one. A blank query resets
/// the results to `defaults` immediately and makes every in-flight response stale.
///
/// Time is passed in explicitly; the coordinator owns no timer.
#[derive(Debug, Clone)]
pub struct SearchCoordinator<T> {
    debounce: Duration,
    generations: GenerationCounter,
    state: SearchState,
    defaults: Vec<T>,
    results: Vec<T>,
}

impl<T: Clone> SearchCoordinator<T> {
    pub fn new(defaults: Vec<T>) -> Self {
        Self::with_debounce(defaults, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(defaults: Vec<T>, debounce: Duration) -> Self {
        Self {
            debounce,
            generations: GenerationCounter::new(),
            state: SearchState::Idle,
            results: defaults.clone(),
            defaults,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn generation(&self) -> Generation {
        self.generations.current()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// When the pending lookup becomes due, if one is pending.
    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            SearchState::Debouncing { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    /// A keystroke. Restarts the debounce window.
    pub fn input(&mut self, query: &str, now: Instant) {
        self.generations.advance();
        if query.trim().is_empty() {
            self.reset_to_defaults();
            return;
        }
        self.state = SearchState::Debouncing {
            query: query.to_string(),
            deadline: now + self.debounce,
        };
    }

    /// An explicit submit. Skips the debounce and returns the lookup to run,
    /// or `None` when the query is blank (results reset instead).
    pub fn submit(&mut self, query: &str) -> Option<LookupRequest> {
        let generation = self.generations.advance();
        if query.trim().is_empty() {
            self.reset_to_defaults();
            return None;
        }
        self.state = SearchState::InFlight {
            query: query.to_string(),
        };
        debug!("Search {generation} submitted for {query:?}");
        Some(LookupRequest {
            generation,
            query: query.to_string(),
        })
    }

    /// Issue the debounced lookup once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<LookupRequest> {
        let SearchState::Debouncing { query, deadline } = &self.state else {
            return None;
        };
        if now < *deadline {
            return None;
        }

        let query = query.clone();
        let generation = self.generations.current();
        self.state = SearchState::InFlight {
            query: query.clone(),
        };
        debug!("Search {generation} issued for {query:?}");
        Some(LookupRequest { generation, query })
    }

    /// Deliver a lookup result. Returns whether it was applied.
    ///
    /// Failures clear the results. Responses for any generation other than
    /// the current one are dropped without touching state.
    pub fn complete(&mut self, generation: Generation, outcome: Result<Vec<T>, CoreError>) -> bool {
        if !self.generations.is_current(generation) {
            info!(
                "Discarding stale search response {generation} (current {})",
                self.generations.current()
            );
            return false;
        }
        if !matches!(self.state, SearchState::InFlight { .. }) {
            debug!("Ignoring search response {generation}: no lookup in flight");
            return false;
        }

        match outcome {
            Ok(results) => self.results = results,
            Err(e) => {
                warn!("Search {generation} failed: {e}");
                self.results.clear();
            }
        }
        self.state = SearchState::Idle;
        true
    }

    fn reset_to_defaults(&mut self) {
        self.results = self.defaults.clone();
        self.state = SearchState::Idle;
    }
}
