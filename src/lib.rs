//! Mini Cache - An in-process key/value cache
//!
//! Bounded store with per-entry TTL expiry, LRU eviction, tag invalidation,
//! cache-aside lookups and memoization wrappers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;
pub mod telemetry;

pub use api::{Cache, CacheBuilder, Invalidation};
pub use cache::{CacheStats, Payload};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweeper;
