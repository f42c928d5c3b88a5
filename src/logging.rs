//! Logging setup for processes embedding the indexer
//!
//! The library itself only emits `tracing` events; installing a subscriber
//! is left to the host. `init` is the usual setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install a formatted subscriber at `debug` when verbose, else `info`.
/// `RUST_LOG` overrides the default level. Installing twice is a no-op.
pub fn init(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init();
}
