//! Logging bootstrap for binaries.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_level` when `RUST_LOG` is unset or invalid.
/// Calling it again after a subscriber is installed does nothing.
pub fn init_telemetry(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(target: "telemetry", default_level, "telemetry initialized");
    }
}
