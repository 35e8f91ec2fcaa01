//! Cache Handle
//!
//! The client-facing operation set layered over [`CacheStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

use crate::api::{Invalidating, Invalidation, Memoized};
use crate::cache::{
    CacheStats, CacheStore, Clock, EvictionPolicy, InstrumentationHook, Payload,
};
use crate::config::Config;
use crate::models::BatchEntry;

// == Cache ==
/// Shared handle to one cache instance.
///
/// Cloning is cheap and every clone sees the same entries. Each call locks
/// the store for its own duration; nothing is held across an `.await`.
#[derive(Clone)]
pub struct Cache {
    store: Arc<Mutex<CacheStore>>,
}

impl Cache {
    // == Constructors ==
    /// Creates a cache from configuration, with the system clock and no
    /// instrumentation.
    pub fn new(config: &Config) -> crate::error::Result<Self> {
        Self::builder(config).build()
    }

    /// Starts a builder for injecting a clock, hook or eviction policy.
    pub fn builder(config: &Config) -> CacheBuilder {
        CacheBuilder {
            config: config.clone(),
            clock: None,
            hook: None,
            policy: None,
        }
    }

    /// Wraps an already constructed store.
    pub fn from_store(store: CacheStore) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    // == Get ==
    /// Returns the live value under `key`, refreshing its recency.
    pub fn get(&self, key: &str) -> Option<Payload> {
        self.store.lock().get(key)
    }

    /// Reads and deserializes a value.
    ///
    /// A value of the wrong shape is reported as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let payload = self.get(key)?;
        match serde_json::from_value(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cached value for '{}' failed to decode, treating as miss: {}", key, e);
                None
            }
        }
    }

    // == Set ==
    /// Stores a value for `ttl`, or the configured default TTL when None.
    ///
    /// Writing a new key into a full cache evicts the least recently used
    /// entry first.
    pub fn set(&self, key: impl Into<String>, value: Payload, ttl: Option<Duration>) {
        self.store.lock().set(key.into(), value, ttl);
    }

    /// Serializes and stores a value.
    pub fn set_as<T: Serialize>(
        &self,
        key: impl Into<String>,
        value: &T,
        ttl: Option<Duration>,
    ) -> crate::error::Result<()> {
        let payload = serde_json::to_value(value)?;
        self.set(key, payload, ttl);
        Ok(())
    }

    // == Delete ==
    /// Removes `key`. Returns false if it was absent or already expired.
    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    // == Has ==
    /// Checks for a live entry without refreshing its recency.
    pub fn has(&self, key: &str) -> bool {
        self.store.lock().has(key)
    }

    // == Clear ==
    /// Drops every entry. Statistics counters are kept.
    pub fn clear(&self) {
        self.store.lock().clear();
    }

    // == Keys and Size ==
    /// Keys of live entries, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.store.lock().keys()
    }

    /// Number of resident entries, including expired ones not yet swept.
    pub fn size(&self) -> usize {
        self.store.lock().len()
    }

    // == Stats ==
    /// Snapshot of counters plus current size, capacity and memory estimate.
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        self.store.lock().ttl_remaining(key)
    }

    /// Removes up to `limit` expired entries under a single lock.
    pub fn purge_expired(&self, limit: usize) -> usize {
        self.store.lock().purge_expired(limit)
    }

    // == Tags and Invalidation ==
    /// Stores a value and registers `key` under each tag.
    pub fn set_with_tags<S: AsRef<str>>(
        &self,
        key: impl Into<String>,
        value: Payload,
        tags: &[S],
        ttl: Option<Duration>,
    ) {
        self.store.lock().set_with_tags(key.into(), value, tags, ttl);
    }

    /// Deletes every live key registered under `tag` and the tag itself.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        self.store.lock().invalidate_tag(tag)
    }

    /// Deletes every key starting with `prefix`. An empty prefix matches nothing.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        self.store.lock().invalidate_prefix(prefix)
    }

    /// Applies each target in order and returns the total keys removed.
    pub fn invalidate(&self, targets: &[Invalidation]) -> usize {
        targets
            .iter()
            .map(|target| match target {
                Invalidation::Key(key) => usize::from(self.delete(key)),
                Invalidation::Tag(tag) => self.invalidate_tag(tag),
                Invalidation::Prefix(prefix) => self.invalidate_prefix(prefix),
            })
            .sum()
    }

    // == Batch Operations ==
    /// Looks up each key in order. Not atomic across keys.
    pub fn mget<S: AsRef<str>>(&self, keys: &[S]) -> Vec<Option<Payload>> {
        keys.iter().map(|key| self.get(key.as_ref())).collect()
    }

    /// Writes each entry in order. Not atomic across entries.
    pub fn mset(&self, entries: Vec<BatchEntry>) {
        for entry in entries {
            let ttl = entry.ttl();
            self.set(entry.key, entry.value, ttl);
        }
    }

    /// Deletes each key in order and returns how many were removed.
    pub fn mdel<S: AsRef<str>>(&self, keys: &[S]) -> usize {
        keys.iter().filter(|key| self.delete(key.as_ref())).count()
    }

    // == Get Or Set ==
    /// Cache-aside lookup.
    ///
    /// On a miss `factory` runs and its value is stored. A factory error is
    /// returned as-is and nothing is cached, and so is a value whose JSON
    /// form does not decode back into `T` (a NaN float becomes `null`).
    /// Concurrent misses on the same key each run their own factory; the
    /// last write wins.
    pub async fn get_or_set<T, E, F, Fut>(
        &self,
        key: &str,
        factory: F,
        ttl: Option<Duration>,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(cached) = self.get_as::<T>(key) {
            return Ok(cached);
        }

        let value = factory().await?;
        match serde_json::to_value(&value) {
            Ok(payload) => match serde_json::from_value::<T>(payload.clone()) {
                Ok(_) => self.set(key, payload, ttl),
                Err(e) => warn!("Computed value for '{}' not cached, it does not decode back: {}", key, e),
            },
            Err(e) => warn!("Computed value for '{}' not cached: {}", key, e),
        }
        Ok(value)
    }

    // == Function Wrappers ==
    /// Wraps `func` so results are cached per argument set.
    ///
    /// `name` identifies the function in generated keys
    /// (`memo:<name>:<json args>`).
    pub fn memoize<A, F>(&self, name: impl Into<String>, func: F) -> Memoized<A, F> {
        Memoized::new(self.clone(), name.into(), func)
    }

    /// Wraps `func` so each successful call invalidates `targets`.
    pub fn with_invalidation<F>(&self, func: F, targets: Vec<Invalidation>) -> Invalidating<F> {
        Invalidating::new(self.clone(), func, targets)
    }
}

// == Cache Builder ==
/// Assembles a [`Cache`] with optional collaborators.
pub struct CacheBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    hook: Option<Arc<dyn InstrumentationHook>>,
    policy: Option<Box<dyn EvictionPolicy>>,
}

impl CacheBuilder {
    /// Overrides the time source, mainly for tests.
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Installs an instrumentation sink, fed from a background thread.
    pub fn hook(mut self, hook: Arc<dyn InstrumentationHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    pub fn eviction_policy(mut self, policy: impl EvictionPolicy + 'static) -> Self {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Validates the configuration and creates the cache.
    pub fn build(self) -> crate::error::Result<Cache> {
        self.config.validate()?;

        let mut store = CacheStore::new(self.config.capacity, self.config.default_ttl())?;
        if let Some(clock) = self.clock {
            store = store.with_clock(clock);
        }
        if let Some(hook) = self.hook {
            store = store.with_hook(hook);
        }
        if let Some(policy) = self.policy {
            store = store.with_policy(policy);
        }

        info!(
            "Cache initialized: capacity={}, default_ttl={}s",
            self.config.capacity, self.config.default_ttl_secs
        );
        Ok(Cache::from_store(store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, OperationReport};
    use crate::error::{CacheError, HookError};
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::OnceLock;
    use std::time::Instant;

    fn test_cache(capacity: usize) -> (Cache, ManualClock) {
        let clock = ManualClock::new(0);
        let config = Config {
            capacity,
            default_ttl_secs: 60,
            ..Config::default()
        };
        let cache = Cache::builder(&config)
            .clock(clock.clone())
            .build()
            .unwrap();
        (cache, clock)
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn test_new_rejects_zero_capacity() {
        let config = Config {
            capacity: 0,
            ..Config::default()
        };
        assert!(matches!(Cache::new(&config), Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_clones_share_state() {
        let (cache, _clock) = test_cache(10);
        let other = cache.clone();

        cache.set("a", json!(1), None);
        assert_eq!(other.get("a"), Some(json!(1)));
        assert_eq!(other.size(), 1);
    }

    #[test]
    fn test_typed_round_trip() {
        let (cache, _clock) = test_cache(10);
        let user = User {
            id: 1,
            name: "Ada".to_string(),
        };

        cache.set_as("u:1", &user, None).unwrap();
        assert_eq!(cache.get_as::<User>("u:1"), Some(user));
    }

    #[test]
    fn test_get_as_wrong_shape_is_miss() {
        let (cache, _clock) = test_cache(10);
        cache.set("u:1", json!("not a user"), None);

        assert_eq!(cache.get_as::<User>("u:1"), None);
    }

    #[test]
    fn test_batch_operations() {
        let (cache, _clock) = test_cache(10);

        cache.mset(vec![
            BatchEntry::new("a", json!(1)),
            BatchEntry::new("b", json!(2)),
        ]);

        assert_eq!(
            cache.mget(&["a", "b", "c"]),
            vec![Some(json!(1)), Some(json!(2)), None]
        );
        assert_eq!(cache.mdel(&["a", "c"]), 1);
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
    }

    #[test]
    fn test_mset_per_entry_ttl() {
        let (cache, clock) = test_cache(10);

        cache.mset(vec![
            BatchEntry::new("short", json!(1)).with_ttl_secs(1),
            BatchEntry::new("default", json!(2)),
        ]);
        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.mget(&["short", "default"]), vec![None, Some(json!(2))]);
    }

    #[test]
    fn test_invalidate_targets() {
        let (cache, _clock) = test_cache(20);

        cache.set("k", json!(0), None);
        cache.set_with_tags("m1", json!(1), &["t"], None);
        cache.set("ns:1", json!(2), None);
        cache.set("ns:2", json!(3), None);

        let removed = cache.invalidate(&[
            Invalidation::Key("k".to_string()),
            Invalidation::Tag("t".to_string()),
            Invalidation::Prefix("ns:".to_string()),
        ]);

        assert_eq!(removed, 4);
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_stats_reflect_store() {
        let (cache, _clock) = test_cache(5);

        cache.set("a", json!(1), None);
        cache.get("a");
        cache.get("missing");

        let stats = cache.stats();
        assert_eq!(stats.size, 1);
        assert_eq!(stats.capacity, 5);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!(stats.memory_estimate_bytes > 0);
    }

    #[tokio::test]
    async fn test_get_or_set_runs_factory_once() {
        let (cache, _clock) = test_cache(10);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..2 {
            let user: Result<User, anyhow::Error> = cache
                .get_or_set(
                    "u:1",
                    move || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok(User {
                            id: 1,
                            name: "Ada".to_string(),
                        })
                    },
                    None,
                )
                .await;
            assert_eq!(user.unwrap().id, 1);
        }

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_set_does_not_cache_failures() {
        let (cache, _clock) = test_cache(10);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let first: Result<u32, String> = cache
            .get_or_set(
                "k",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("upstream down".to_string())
                },
                None,
            )
            .await;
        assert_eq!(first, Err("upstream down".to_string()));
        assert!(!cache.has("k"));

        let second: Result<u32, String> = cache
            .get_or_set(
                "k",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                },
                None,
            )
            .await;
        assert_eq!(second, Ok(7));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_or_set_refetches_after_expiry() {
        let (cache, clock) = test_cache(10);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = move || async move { Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst) as u32) };
        let ttl = Some(Duration::from_secs(1));

        assert_eq!(cache.get_or_set("k", fetch, ttl).await, Ok(0));
        assert_eq!(cache.get_or_set("k", fetch, ttl).await, Ok(0));
        clock.advance(Duration::from_secs(1));
        assert_eq!(cache.get_or_set("k", fetch, ttl).await, Ok(1));
    }

    #[tokio::test]
    async fn test_get_or_set_is_not_single_flight() {
        let (cache, _clock) = test_cache(10);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let slow = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok::<_, String>(1u32)
        };

        let (a, b) = tokio::join!(
            cache.get_or_set("k", slow, None),
            cache.get_or_set("k", slow, None)
        );

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_or_set_skips_values_that_do_not_decode() {
        let (cache, _clock) = test_cache(10);
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let ratio = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(f64::NAN)
        };

        assert!(cache.get_or_set("ratio", ratio, None).await.unwrap().is_nan());
        assert!(!cache.has("ratio"), "NaN serializes to null and must not be cached");
        assert!(cache.get_or_set("ratio", ratio, None).await.unwrap().is_nan());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    struct SlowHook;

    impl InstrumentationHook for SlowHook {
        fn record_operation(&self, _report: OperationReport) -> Result<(), HookError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(())
        }

        fn record_hit(&self) -> Result<(), HookError> {
            Ok(())
        }

        fn record_miss(&self) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[test]
    fn test_slow_hook_does_not_delay_callers() {
        let cache = Cache::builder(&Config::default())
            .hook(Arc::new(SlowHook))
            .build()
            .unwrap();
        cache.set("a", json!(1), None);

        let writer = cache.clone();
        let handle = std::thread::spawn(move || {
            let started = Instant::now();
            writer.set("b", json!(2), None);
            started.elapsed()
        });
        std::thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        assert!(cache.has("a"));
        let has_latency = started.elapsed();
        let set_latency = handle.join().unwrap();

        assert!(has_latency < Duration::from_millis(100), "has took {:?}", has_latency);
        assert!(set_latency < Duration::from_millis(100), "set took {:?}", set_latency);
    }

    /// A sink that reads the cache it is attached to.
    #[derive(Default)]
    struct ReentrantHook {
        cache: OnceLock<Cache>,
        observed: AtomicUsize,
    }

    impl InstrumentationHook for ReentrantHook {
        fn record_operation(&self, _report: OperationReport) -> Result<(), HookError> {
            if let Some(cache) = self.cache.get() {
                cache.size();
                self.observed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }

        fn record_hit(&self) -> Result<(), HookError> {
            Ok(())
        }

        fn record_miss(&self) -> Result<(), HookError> {
            Ok(())
        }
    }

    #[test]
    fn test_hook_may_call_back_into_cache() {
        let hook = Arc::new(ReentrantHook::default());
        let cache = Cache::builder(&Config::default())
            .hook(hook.clone())
            .build()
            .unwrap();
        let _ = hook.cache.set(cache.clone());

        cache.set("a", json!(1), None);
        assert_eq!(cache.get("a"), Some(json!(1)));

        for _ in 0..200 {
            if hook.observed.load(Ordering::SeqCst) >= 2 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(hook.observed.load(Ordering::SeqCst), 2);
    }
}
