//! Logging initialization

use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Initialize the `tracing` subscriber.
///
/// Respects `RUST_LOG` via [`EnvFilter::from_default_env`]; `-v`/`-vv` raise
/// the default floor when the environment variable is unset.
pub fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt().with_env_filter(filter).with_target(false).init();
}
