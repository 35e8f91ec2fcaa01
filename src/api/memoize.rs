//! Function Wrappers
//!
//! Higher-order wrappers that put a cache in front of, or behind, an async
//! function: [`Memoized`] caches results per argument set and
//! [`Invalidating`] drops cached data after a successful write.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::api::Cache;

/// Prefix of keys generated by [`Memoized`].
pub const MEMO_KEY_PREFIX: &str = "memo:";

type KeyFn<A> = Arc<dyn Fn(&A) -> String + Send + Sync>;

// == Memoized ==
/// An async function whose results are cached by argument.
///
/// Without a custom key function the key is `memo:<name>:<json args>`.
/// Errors from the wrapped function are returned and never cached.
pub struct Memoized<A, F> {
    cache: Cache,
    name: String,
    func: F,
    key_fn: Option<KeyFn<A>>,
    ttl: Option<Duration>,
    _args: PhantomData<fn(A)>,
}

impl<A, F> Memoized<A, F> {
    pub(crate) fn new(cache: Cache, name: String, func: F) -> Self {
        Self {
            cache,
            name,
            func,
            key_fn: None,
            ttl: None,
            _args: PhantomData,
        }
    }

    /// Replaces the default key derivation.
    pub fn with_key_fn(mut self, key_fn: impl Fn(&A) -> String + Send + Sync + 'static) -> Self {
        self.key_fn = Some(Arc::new(key_fn));
        self
    }

    /// Caches results for `ttl` instead of the cache's default TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A: Serialize, F> Memoized<A, F> {
    /// Returns the cache key for `args`, or None if they cannot be serialized.
    pub fn cache_key(&self, args: &A) -> Option<String> {
        if let Some(key_fn) = &self.key_fn {
            return Some(key_fn(args));
        }
        match serde_json::to_string(args) {
            Ok(encoded) => Some(format!("{}{}:{}", MEMO_KEY_PREFIX, self.name, encoded)),
            Err(e) => {
                warn!("Arguments for '{}' not serializable, bypassing cache: {}", self.name, e);
                None
            }
        }
    }

    // == Call ==
    /// Invokes the function, or returns the cached result for these arguments.
    pub async fn call<T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize + DeserializeOwned,
    {
        match self.cache_key(&args) {
            Some(key) => {
                self.cache
                    .get_or_set(&key, || (self.func)(args), self.ttl)
                    .await
            }
            None => (self.func)(args).await,
        }
    }
}

// == Invalidation ==
/// Something to drop from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invalidation {
    /// A single key
    Key(String),
    /// Every key registered under a tag
    Tag(String),
    /// Every key starting with a namespace prefix
    Prefix(String),
}

// == Invalidating ==
/// An async function that invalidates cache targets after it succeeds.
///
/// Typically wraps a write to the upstream service whose reads are cached.
pub struct Invalidating<F> {
    cache: Cache,
    func: F,
    targets: Vec<Invalidation>,
}

impl<F> Invalidating<F> {
    pub(crate) fn new(cache: Cache, func: F, targets: Vec<Invalidation>) -> Self {
        Self {
            cache,
            func,
            targets,
        }
    }

    pub fn targets(&self) -> &[Invalidation] {
        &self.targets
    }

    /// Runs the function; on success, invalidates every target.
    pub async fn call<A, T, E, Fut>(&self, args: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = (self.func)(args).await?;
        self.cache.invalidate(&self.targets);
        Ok(value)
    }
}
