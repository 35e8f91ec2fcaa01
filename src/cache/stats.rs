//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and evictions.

use serde::Serialize;

/// Fixed per-entry overhead added to the memory estimate.
pub const ENTRY_OVERHEAD_BYTES: usize = 64;

// == Cache Stats ==
/// Snapshot of cache size and performance counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Physically resident entries, including expired ones not yet swept
    pub size: usize,
    /// Maximum number of resident entries
    pub capacity: usize,
    /// Advisory estimate: keys + serialized values + per-entry overhead
    pub memory_estimate_bytes: usize,
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to capacity pressure
    pub evictions: u64,
    /// Number of expired entries removed, lazily or by the sweeper
    pub expirations: u64,
    /// Number of writes
    pub sets: u64,
    /// Number of explicit deletes that removed an entry
    pub deletes: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Counters ==
    /// Records a get that returned a live value.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Records a get on an absent or expired key.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Records one entry removed under capacity pressure.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Records `count` expired entries removed, lazily or by a purge.
    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    /// Records a write, new key or overwrite.
    pub fn record_set(&mut self) {
        self.sets += 1;
    }

    /// Records an explicit delete that removed a live entry.
    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }
}
