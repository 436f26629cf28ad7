use serde::{Deserialize, Serialize};

/// Tag attached to an asynchronous request so its response can be matched
/// against the inputs that are current when it arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic counter. Only a response tagged with the latest generation
/// may touch display state.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Invalidate everything issued so far and return the new tag.
    pub fn advance(&mut self) -> Generation {
        self.current = Generation(self.current.0.wrapping_add(1));
        self.current
    }

    pub fn current(&self) -> Generation {
        self.current
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current == generation
    }
}
