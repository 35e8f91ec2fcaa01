//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU eviction and TTL expiration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cache::hooks::{HookDispatcher, HookEvent, HOOK_QUEUE_CAPACITY};
use crate::cache::{
    CacheEntry, CacheStats, Clock, EvictionPolicy, InstrumentationHook, LeastRecentlyUsed,
    Operation, OperationReport, Payload, SystemClock, ENTRY_OVERHEAD_BYTES,
};
use crate::error::{CacheError, Result};

// == Cache Store ==
/// Main cache storage with LRU eviction and TTL support.
///
/// Not synchronized on its own; the [`Cache`](crate::api::Cache) handle
/// wraps it in a mutex.
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Performance counters
    stats: CacheStats,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL for entries written without one
    default_ttl: Duration,
    /// Monotonic recency counter
    access_seq: u64,
    clock: Arc<dyn Clock>,
    /// Queue to the instrumentation thread, if a hook is installed
    hook: Option<HookDispatcher>,
    policy: Box<dyn EvictionPolicy>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// Uses the system clock, no instrumentation and linear-scan LRU.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries the cache can hold
    /// * `default_ttl` - TTL for entries written without an explicit one
    pub fn new(capacity: usize, default_ttl: Duration) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if default_ttl.is_zero() {
            return Err(CacheError::InvalidConfig(
                "default TTL must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            entries: HashMap::with_capacity(capacity.min(4096)),
            stats: CacheStats::new(),
            capacity,
            default_ttl,
            access_seq: 0,
            clock: Arc::new(SystemClock),
            hook: None,
            policy: Box::new(LeastRecentlyUsed),
        })
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Installs an instrumentation sink.
    ///
    /// The sink runs on its own thread and is fed through a bounded queue,
    /// so the store never waits on it. If the thread cannot be started the
    /// store runs without instrumentation.
    pub fn with_hook(mut self, hook: Arc<dyn InstrumentationHook>) -> Self {
        self.hook = match HookDispatcher::spawn(hook, HOOK_QUEUE_CAPACITY) {
            Ok(dispatcher) => Some(dispatcher),
            Err(e) => {
                warn!("Instrumentation thread failed to start, hook disabled: {}", e);
                None
            }
        };
        self
    }

    /// Replaces the eviction strategy.
    pub fn with_policy(mut self, policy: Box<dyn EvictionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    // == Get ==
    /// Retrieves a clone of the value stored under `key`.
    ///
    /// Expired entries are removed and counted as misses. A hit bumps the
    /// entry's access count and recency.
    pub fn get(&mut self, key: &str) -> Option<Payload> {
        let started = Instant::now();
        let now = self.clock.now_ms();
        self.access_seq += 1;
        let seq = self.access_seq;

        let value = if self.remove_if_expired(key, now) {
            None
        } else {
            self.entries.get_mut(key).map(|entry| {
                entry.touch(now, seq);
                entry.value.clone()
            })
        };

        if value.is_some() {
            self.stats.record_hit();
            self.emit(HookEvent::Hit);
        } else {
            self.stats.record_miss();
            self.emit(HookEvent::Miss);
        }
        self.report(Operation::Get, started, value.is_some());

        value
    }

    // == Set ==
    /// Stores a value, overwriting any existing entry and resetting its TTL.
    ///
    /// If `key` is new and the store is full, one victim chosen by the
    /// eviction policy is removed first.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the default TTL if None)
    pub fn set(&mut self, key: String, value: Payload, ttl: Option<Duration>) {
        let started = Instant::now();

        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            self.evict_one();
        }

        let now = self.clock.now_ms();
        self.access_seq += 1;
        let entry = CacheEntry::new(value, now, ttl.unwrap_or(self.default_ttl), self.access_seq);
        self.entries.insert(key, entry);
        self.stats.record_set();

        self.report(Operation::Set, started, true);
    }

    // == Delete ==
    /// Removes a live entry by key, returning whether one was removed.
    ///
    /// An entry that is resident but already expired is dropped as an
    /// expiration and reported as not removed, so the result matches what
    /// [`has`](Self::has) would have said just before.
    pub fn delete(&mut self, key: &str) -> bool {
        let started = Instant::now();
        let now = self.clock.now_ms();
        let removed = !self.remove_if_expired(key, now) && self.entries.remove(key).is_some();
        if removed {
            self.stats.record_delete();
        }
        self.report(Operation::Delete, started, removed);
        removed
    }

    // == Has ==
    /// Checks whether a live entry exists without touching its recency.
    ///
    /// An expired entry found here is removed, just like in [`get`](Self::get).
    pub fn has(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        !self.remove_if_expired(key, now) && self.entries.contains_key(key)
    }

    // == Clear ==
    /// Drops every entry. Counters are kept.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        debug!("Cache cleared: dropped {} entries", dropped);
    }

    // == Keys ==
    /// Returns the keys of all live entries, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    // == TTL Remaining ==
    /// Returns the remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let now = self.clock.now_ms();
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.ttl_remaining(now))
    }

    // == Invalidate Prefix ==
    /// Deletes every entry whose key starts with `prefix`.
    ///
    /// Intended for namespaced keys such as `user:42:profile`; an empty
    /// prefix matches nothing.
    pub fn invalidate_prefix(&mut self, prefix: &str) -> usize {
        if prefix.is_empty() {
            return 0;
        }
        let matching: Vec<String> = self
            .entries
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();

        matching.iter().filter(|key| self.delete(key)).count()
    }

    // == Purge Expired ==
    /// Removes up to `limit` expired entries.
    ///
    /// Returns the number of entries removed. A result below `limit` means
    /// no expired entries remain.
    pub fn purge_expired(&mut self, limit: usize) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .take(limit)
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            self.entries.remove(&key);
        }

        self.stats.record_expirations(count);
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    pub fn cleanup_expired(&mut self) -> usize {
        self.purge_expired(usize::MAX)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.size = self.entries.len();
        stats.capacity = self.capacity;
        stats.memory_estimate_bytes = self.memory_estimate();
        stats
    }

    // == Memory Estimate ==
    /// Approximates resident bytes. Advisory only.
    ///
    /// A value that fails to serialize contributes only its key and overhead.
    pub fn memory_estimate(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| {
                let value_len = match serde_json::to_vec(&entry.value) {
                    Ok(bytes) => bytes.len(),
                    Err(e) => {
                        warn!("Size estimate failed for key '{}': {}", key, e);
                        0
                    }
                };
                key.len() + value_len + ENTRY_OVERHEAD_BYTES
            })
            .sum()
    }

    // == Length ==
    /// Returns the number of physically resident entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Drops `key` if it is resident but expired. Returns whether it did.
    fn remove_if_expired(&mut self, key: &str, now_ms: u64) -> bool {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now_ms));
        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
        }
        expired
    }

    fn evict_one(&mut self) {
        match self.policy.select_victim(&self.entries) {
            Some(victim) => {
                if self.entries.remove(&victim).is_some() {
                    self.stats.record_eviction();
                    debug!("Evicted '{}' under capacity pressure", victim);
                }
            }
            None => warn!("Eviction policy returned no victim for a full cache"),
        }
    }

    fn report(&self, operation: Operation, started: Instant, success: bool) {
        if self.hook.is_none() {
            return;
        }
        let duration_micros = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.emit(HookEvent::Operation(OperationReport {
            operation,
            duration_micros,
            success,
        }));
    }

    /// Never blocks; the event is dropped if the queue is full.
    fn emit(&self, event: HookEvent) {
        if let Some(dispatcher) = &self.hook {
            dispatcher.send(event);
        }
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("len", &self.entries.len())
            .field("capacity", &self.capacity)
            .field("default_ttl", &self.default_ttl)
            .field("stats", &self.stats)
            .field("hook_events_dropped", &self.hook.as_ref().map(HookDispatcher::dropped))
            .finish_non_exhaustive()
    }
}
