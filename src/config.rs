//! Configuration Module
//!
//! Handles loading and validating cache configuration from environment variables.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults,
/// or deserialized from a host application's own config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum number of resident keys
    pub capacity: usize,
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl_secs: u64,
    /// Background sweeper interval in seconds
    pub sweep_interval_secs: u64,
    /// Maximum expired entries removed per sweeper lock acquisition
    pub sweep_batch_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Maximum resident keys (default: 1000)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 300)
    /// - `CACHE_SWEEP_INTERVAL` - Sweeper frequency in seconds (default: 1)
    /// - `CACHE_SWEEP_BATCH` - Expired entries removed per batch (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            capacity: env_or("CACHE_CAPACITY", defaults.capacity),
            default_ttl_secs: env_or("CACHE_DEFAULT_TTL", defaults.default_ttl_secs),
            sweep_interval_secs: env_or("CACHE_SWEEP_INTERVAL", defaults.sweep_interval_secs),
            sweep_batch_size: env_or("CACHE_SWEEP_BATCH", defaults.sweep_batch_size),
        }
    }

    // == Validate ==
    /// Rejects configurations the cache cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidConfig(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.default_ttl_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "default TTL must be greater than 0 seconds".to_string(),
            ));
        }
        if self.sweep_interval_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be greater than 0 seconds".to_string(),
            ));
        }
        if self.sweep_batch_size == 0 {
            return Err(CacheError::InvalidConfig(
                "sweep batch size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: 1000,
            default_ttl_secs: 300,
            sweep_interval_secs: 1,
            sweep_batch_size: 256,
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
