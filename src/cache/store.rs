//! Query Cache Store
//!
//! TTL-bounded map from request fingerprints to computed answers, plus the
//! in-flight markers used to coalesce concurrent identical requests. One
//! instance lives behind a single `Arc<RwLock<..>>` in the application
//! state; no per-entry locking.

use std::collections::HashMap;
use std::time::Duration;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheStats, CachedValue};

/// Lifetime of an in-flight marker; a crashed worker's marker lapses after
/// this long and waiters compute the result themselves.
pub const INFLIGHT_TTL_MS: u64 = 30_000;

// == Query Cache ==
/// TTL cache over computed bilingual answers.
///
/// Operations never fail; anything wrong with an entry degrades to a miss.
#[derive(Debug)]
pub struct QueryCache {
    /// Fingerprint-keyed storage
    entries: HashMap<String, CacheEntry>,
    /// Fingerprints currently being computed, by start timestamp (ms)
    inflight: HashMap<String, u64>,
    /// Lookup counters
    stats: CacheStats,
    /// Time-to-live applied to every entry
    ttl: Duration,
}

impl QueryCache {
    /// Creates an empty cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            inflight: HashMap::new(),
            stats: CacheStats::new(),
            ttl,
        }
    }

    // == Get ==
    /// Returns the stored value if present and fresh.
    ///
    /// An expired entry is lazily evicted and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<CachedValue> {
        match self.entries.get(key) {
            Some(entry) if entry.is_expired(self.ttl) => {
                self.entries.remove(key);
                self.stats.record_miss();
                None
            }
            Some(entry) => {
                let value = entry.value.clone();
                self.stats.record_hit();
                Some(value)
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a value under `key` with a fresh creation stamp, overwriting
    /// any prior entry, and releases the key's in-flight marker.
    pub fn set(&mut self, key: impl Into<String>, value: CachedValue) {
        let key = key.into();
        self.inflight.remove(&key);
        self.entries.insert(key, CacheEntry::new(value));
    }

    // == Clear ==
    /// Removes all entries unconditionally. Used after underlying content
    /// updates to force fresh generation.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.inflight.clear();
    }

    // == Stats ==
    /// Returns a read-only snapshot of cache state.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.entries = self.entries.len();
        stats.ttl_seconds = self.ttl.as_secs();
        stats
    }

    // == Sweep Expired ==
    /// Removes all expired entries and lapsed in-flight markers.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(ttl));

        let now = current_timestamp_ms();
        self.inflight
            .retain(|_, started| now.saturating_sub(*started) < INFLIGHT_TTL_MS);

        before - self.entries.len()
    }

    // == Request Coalescing ==
    /// Marks `key` as being computed. Returns true when the caller is now
    /// responsible for computing the result; false when another worker
    /// already holds a live marker.
    pub fn begin_inflight(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        let now = current_timestamp_ms();
        match self.inflight.get(&key) {
            Some(started) if now.saturating_sub(*started) < INFLIGHT_TTL_MS => false,
            _ => {
                self.inflight.insert(key, now);
                true
            }
        }
    }

    /// Releases the in-flight marker for `key`, signalling waiters to stop
    /// polling. Safe to call when no marker exists.
    pub fn end_inflight(&mut self, key: &str) {
        self.inflight.remove(key);
    }

    /// Whether a live in-flight marker exists for `key`.
    pub fn is_inflight(&self, key: &str) -> bool {
        match self.inflight.get(key) {
            Some(started) => {
                current_timestamp_ms().saturating_sub(*started) < INFLIGHT_TTL_MS
            }
            None => false,
        }
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
