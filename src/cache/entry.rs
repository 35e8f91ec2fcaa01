//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and recency metadata.

use std::time::Duration;

use serde_json::Value;

/// Values held by the cache.
pub type Payload = Value;

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: Payload,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Number of successful reads
    pub access_count: u64,
    /// Last read or write (Unix milliseconds)
    pub last_accessed: u64,
    /// Store-wide sequence stamped on insert and on every read
    pub access_seq: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry living for `ttl` from `now_ms`.
    ///
    /// A zero TTL produces an entry that is already expired.
    pub fn new(value: Payload, now_ms: u64, ttl: Duration, access_seq: u64) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            access_count: 0,
            last_accessed: now_ms,
            access_seq,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once `now_ms >= expires_at`. Lazy reads and the
    /// sweeper both go through this predicate.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Touch ==
    /// Records a read.
    pub fn touch(&mut self, now_ms: u64, access_seq: u64) {
        self.access_count += 1;
        self.last_accessed = now_ms;
        self.access_seq = access_seq;
    }

    // == Time To Live ==
    /// Returns remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(now_ms))
    }
}
