//! Tracing subscriber setup for the binary.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Installs a global subscriber writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise the level is `info`, with this crate
/// raised to `debug` when `verbose` is on.
pub fn init(verbose: bool) {
    let default = if verbose {
        "info,dispatch_sim=debug"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}
