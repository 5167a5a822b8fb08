//! Tracing subscriber setup for the CLI.
//!
//! Diagnostics go to stderr so stdout only carries command output.
//! The filter is read from `PSPLIT_LOG` (same syntax as `RUST_LOG`).

use std::io;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter
pub const LOG_ENV: &str = "PSPLIT_LOG";

/// Install the global subscriber. `quiet` lowers the fallback level to
/// errors only. Calling it twice is harmless.
pub fn init(quiet: bool) {
    let fallback = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(io::stderr);

    // A second init (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init();
}
