//! Structured logging for the binaries via the `tracing` ecosystem.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,tower_http=warn";

/// Install the global subscriber: console output with uptime timestamps and module
/// paths, filtered by `RUST_LOG` or `filter` (falling back to [`DEFAULT_FILTER`]).
///
/// Calling it twice is harmless; the second install is ignored.
pub fn init_logging(filter: Option<&str>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| filter.map(EnvFilter::new).unwrap_or_else(default_env_filter));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .try_init();
}

pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
