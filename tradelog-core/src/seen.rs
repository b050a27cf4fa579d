//! SeenKeys: session-scoped dedup store.
//!
//! Append-only: keys are never evicted for the life of a session. A scraper
//! attached to one page visit stays small; long-running hosts should start a
//! fresh session rather than expect eviction here.

use std::collections::HashSet;

#[derive(Debug, Default, Clone)]
pub struct SeenKeys {
    keys: HashSet<String>,
}

impl SeenKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// Record a key; returns true if it was not seen before.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
