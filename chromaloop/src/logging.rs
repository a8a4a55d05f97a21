// src/logging.rs
//
// Diagnostic logging setup.
//
// Filtered by RUST_LOG (e.g. `RUST_LOG=chromaloop=debug`); falls back to
// `default_directive` when unset or invalid. Output goes to stderr so that
// JSON printed on stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Returns false when a subscriber was already installed (e.g. when the
/// library is embedded in a host that configured its own).
pub fn init_tracing(default_directive: &str) -> bool {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
