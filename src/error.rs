//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror. Misses are not errors:
//! lookups return `Option`, and only construction or internal bookkeeping
//! can produce a `CacheError`.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Configuration rejected at construction time
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A payload could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Hook Error ==
/// Error raised by an instrumentation sink.
///
/// The store logs these and carries on; they never reach cache clients.
#[derive(Error, Debug)]
#[error("Instrumentation sink failed: {0}")]
pub struct HookError(pub String);

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = CacheError::InvalidConfig("capacity must be greater than 0".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: capacity must be greater than 0"
        );
    }

    #[test]
    fn test_serialization_error_from_serde() {
        let serde_err = serde_json::from_str::<u32>("not a number").unwrap_err();
        let err: CacheError = serde_err.into();
        assert!(matches!(err, CacheError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_hook_error_message() {
        let err = HookError("sink offline".to_string());
        assert_eq!(err.to_string(), "Instrumentation sink failed: sink offline");
    }
}
