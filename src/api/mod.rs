//! API Module
//!
//! The client-facing cache handle and the function wrappers built on it.
//!
//! # Operations
//! - `get` / `set` / `delete` / `has` / `clear` / `keys` / `size` / `stats`
//! - `get_or_set` - cache-aside with an async factory
//! - `mget` / `mset` / `mdel` - sequential batch helpers
//! - `set_with_tags` / `invalidate_tag` / `invalidate_prefix`
//! - `memoize` / `with_invalidation` - higher-order wrappers

mod cache;
mod memoize;

pub use cache::{Cache, CacheBuilder};
pub use memoize::{Invalidating, Invalidation, Memoized, MEMO_KEY_PREFIX};
