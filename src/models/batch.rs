//! Batch write DTO
//!
//! One element of an `mset` call.

use std::time::Duration;

use serde::Deserialize;

use crate::cache::Payload;

/// An entry to write as part of a batch.
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl_secs`: Optional TTL in seconds (uses default if not specified)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchEntry {
    pub key: String,
    pub value: Payload,
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

impl BatchEntry {
    pub fn new(key: impl Into<String>, value: Payload) -> Self {
        Self {
            key: key.into(),
            value,
            ttl_secs: None,
        }
    }

    /// Sets a per-entry TTL.
    pub fn with_ttl_secs(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = Some(ttl_secs);
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_secs.map(Duration::from_secs)
    }
}
