//! Process-wide initialization for the sidx binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the tracing filter
pub const LOG_ENV: &str = "SIDX_LOG";

/// Initialize tracing with the SIDX_LOG environment variable.
///
/// Defaults to "warn" so lint output on stdout stays clean. `verbose` raises
/// the default to "debug" when SIDX_LOG is not set.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}
