//! Tag Index Module
//!
//! Groups keys under named tags for bulk invalidation.
//!
//! A tag's key set lives in the store itself, as a JSON array under
//! `tag:<name>`, so it expires and gets evicted like any other entry.
//! Invalidation is therefore best-effort: once the tag entry is gone,
//! its keys can only be reached by their own TTL.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::{CacheStore, Payload};

/// Prefix of the store keys holding tag membership.
pub const TAG_KEY_PREFIX: &str = "tag:";

/// Store key holding the members of `tag`.
pub fn tag_key(tag: &str) -> String {
    format!("{}{}", TAG_KEY_PREFIX, tag)
}

impl CacheStore {
    // == Set With Tags ==
    /// Stores a value and registers `key` under each tag.
    ///
    /// Every touched tag entry is rewritten with the same TTL as the value.
    pub fn set_with_tags<S: AsRef<str>>(
        &mut self,
        key: String,
        value: Payload,
        tags: &[S],
        ttl: Option<Duration>,
    ) {
        self.set(key.clone(), value, ttl);

        for tag in tags {
            let tag = tag.as_ref();
            let mut members = self.tag_members(tag);
            if !members.contains(&key) {
                members.push(key.clone());
            }
            let members = Value::from(members);
            self.set(tag_key(tag), members, ttl);
        }
    }

    // == Invalidate Tag ==
    /// Deletes every key registered under `tag`, then the tag entry itself.
    ///
    /// Keys that already expired or were evicted are skipped silently.
    /// Returns the number of keys actually removed.
    pub fn invalidate_tag(&mut self, tag: &str) -> usize {
        let members = self.tag_members(tag);
        let removed = members.iter().filter(|key| self.delete(key)).count();
        self.delete(&tag_key(tag));

        debug!(
            "Invalidated tag '{}': {} of {} keys removed",
            tag,
            removed,
            members.len()
        );
        removed
    }

    // == Tag Members ==
    /// Reads the key set recorded for `tag`, empty if absent or malformed.
    pub fn tag_members(&mut self, tag: &str) -> Vec<String> {
        match self.get(&tag_key(tag)) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(key) => Some(key),
                    _ => None,
                })
                .collect(),
            Some(other) => {
                warn!(
                    "Tag entry '{}' is not a key list ({}), treating as empty",
                    tag_key(tag),
                    other
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}
