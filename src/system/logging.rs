//! Logging system initialization
//!
//! Console logging via tracing-subscriber. The filter is taken from
//! `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// **Note**: This should be called only once during application startup.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
