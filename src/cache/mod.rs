//! Result cache: bounded LRU with TTL expiry.
//!
//! Keys are BLAKE3 hashes of the normalized query. Only finalized
//! [`MatchResult`]s are stored; the whole cache is invalidated on every
//! index snapshot swap since cached results may reference retired records.

#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use moka::sync::Cache;
use serde::Serialize;

use crate::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL_SECS};
use crate::hashing::hash_query;
use crate::record::MatchResult;

/// Point-in-time cache counters.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub size: u64,
    pub max_capacity: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub hit_rate: f64,
    pub ttl_seconds: u64,
}

/// Memoizes finalized match results keyed by normalized query.
///
/// Eviction is whichever comes first: LRU pressure at `max_capacity`, or the
/// per-entry TTL.
pub struct ResultCache {
    entries: Cache<[u8; 32], Arc<MatchResult>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    /// Creates a cache with the default capacity and TTL.
    pub fn new() -> Self {
        Self::with_settings(
            DEFAULT_CACHE_CAPACITY,
            Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        )
    }

    /// Creates a cache with explicit capacity and TTL.
    pub fn with_settings(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up a normalized query. Counts a hit or miss.
    pub fn get(&self, normalized_query: &str) -> Option<Arc<MatchResult>> {
        let key = hash_query(normalized_query);
        match self.entries.get(&key) {
            Some(result) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Stores a finalized result under its normalized query.
    pub fn put(&self, normalized_query: &str, result: MatchResult) {
        let key = hash_query(normalized_query);
        self.entries.insert(key, Arc::new(result));
    }

    /// Drops every entry. Called on each index snapshot swap.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    /// Returns `true` if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns current counters.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        CacheStats {
            size: self.len(),
            max_capacity: self.entries.policy().max_capacity().unwrap_or(0),
            hit_count: hits,
            miss_count: misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64
            } else {
                0.0
            },
            ttl_seconds: self.ttl.as_secs(),
        }
    }

    /// Runs any pending maintenance tasks in the underlying cache.
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("entries", &self.entries.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}
