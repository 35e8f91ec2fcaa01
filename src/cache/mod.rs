//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, LRU eviction and tag invalidation.

mod clock;
mod entry;
mod eviction;
mod hooks;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{CacheEntry, Payload};
pub use eviction::{EvictionPolicy, LeastRecentlyUsed};
pub use hooks::{InstrumentationHook, Operation, OperationReport, TracingHook, HOOK_QUEUE_CAPACITY};
pub use stats::{CacheStats, ENTRY_OVERHEAD_BYTES};
pub use store::CacheStore;
pub use tags::{tag_key, TAG_KEY_PREFIX};
