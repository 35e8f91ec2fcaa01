//! Logging setup
//!
//! The cache only emits `tracing` events; installing a subscriber is up to
//! the host application. This helper does it the usual way for binaries and
//! tests that don't have their own.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a fmt subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (e.g. `"mini_cache=info"`).
///
/// Returns false if a global subscriber was already set.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Tracing subscriber installed");
    }
    installed
}
