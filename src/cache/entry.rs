//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::models::{BilingualAnswer, RevisionItem};

// == Cached Value ==
/// Value shapes the query cache can hold: a single bilingual answer, or a
/// whole revision batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Answer(BilingualAnswer),
    Revision(Vec<RevisionItem>),
}

// == Cache Entry ==
/// A single cached result with its creation timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: CachedValue,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
}

impl CacheEntry {
    /// Creates a new cache entry stamped with the current time.
    pub fn new(value: CachedValue) -> Self {
        Self {
            value,
            created_at: current_timestamp_ms(),
        }
    }

    /// Checks whether the entry has outlived `ttl`.
    ///
    /// Boundary condition: an entry is fresh while `now - created_at <= ttl`
    /// and expired strictly after.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let age_ms = current_timestamp_ms().saturating_sub(self.created_at);
        u128::from(age_ms) > ttl.as_millis()
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub(crate) fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
