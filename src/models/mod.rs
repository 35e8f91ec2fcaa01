//! Data models for the cache facade
//!
//! Serde-friendly shapes callers hand to batch operations.

mod batch;

pub use batch::BatchEntry;
