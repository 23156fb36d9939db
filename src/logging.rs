//! Log output for the demo binaries.

use tracing_subscriber::EnvFilter;

/// Install a stderr `tracing` subscriber.
///
/// The filter comes from `RUST_LOG`, falling back to `info,lantern=debug`.
/// Calling it twice is harmless.
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,lantern=debug"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
