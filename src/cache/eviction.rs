//! Eviction Policy Module
//!
//! Chooses which entry to drop when an insert would exceed capacity.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Eviction Policy ==
/// Strategy for selecting an eviction victim.
///
/// Implementations may keep their own index as long as the observable
/// choice matches what they document.
pub trait EvictionPolicy: Send + Sync {
    /// Returns the key to evict, or None if `entries` is empty.
    fn select_victim(&self, entries: &HashMap<String, CacheEntry>) -> Option<String>;
}

// == Least Recently Used ==
/// Linear-scan LRU.
///
/// Picks the entry with the smallest `last_accessed`. Entries touched in the
/// same millisecond are ordered by `access_seq`, so among never-read entries
/// the earliest insertion goes first.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastRecentlyUsed;

impl EvictionPolicy for LeastRecentlyUsed {
    fn select_victim(&self, entries: &HashMap<String, CacheEntry>) -> Option<String> {
        entries
            .iter()
            .min_by_key(|(_, entry)| (entry.last_accessed, entry.access_seq))
            .map(|(key, _)| key.clone())
    }
}
