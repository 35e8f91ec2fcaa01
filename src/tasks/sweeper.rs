//! Expiry Sweeper Task
//!
//! Background task that periodically removes expired cache entries so they
//! don't linger until their next read.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::api::Cache;
use crate::config::Config;

/// Spawns a background task that periodically purges expired entries.
///
/// Each run removes expired entries in batches of at most `batch_size`,
/// releasing the lock and yielding to the runtime between batches so a
/// large sweep does not starve client calls.
///
/// # Arguments
/// * `cache` - Handle to the cache to sweep
/// * `interval` - Time between sweeps
/// * `batch_size` - Maximum entries removed per lock acquisition
///
/// # Returns
/// A JoinHandle for the spawned task; abort it to stop sweeping.
///
/// # Example
/// ```ignore
/// let cache = Cache::new(&Config::default())?;
/// let sweeper = spawn_sweeper(cache.clone(), Duration::from_secs(1), 256);
/// // Later, during shutdown:
/// sweeper.abort();
/// ```
pub fn spawn_sweeper(cache: Cache, interval: Duration, batch_size: usize) -> JoinHandle<()> {
    let batch_size = batch_size.max(1);

    tokio::spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {}ms, batch size {}",
            interval.as_millis(),
            batch_size
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = sweep_expired(&cache, batch_size).await;
            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

/// Spawns the sweeper using the interval and batch size from `config`.
pub fn spawn_sweeper_from_config(cache: Cache, config: &Config) -> JoinHandle<()> {
    spawn_sweeper(cache, config.sweep_interval(), config.sweep_batch_size)
}

async fn sweep_expired(cache: &Cache, batch_size: usize) -> usize {
    let mut total = 0;
    loop {
        let removed = cache.purge_expired(batch_size);
        total += removed;
        if removed < batch_size {
            return total;
        }
        tokio::task::yield_now().await;
    }
}
