//! Development-time tracing for debugging borgwrap.
//!
//! Tracing output is developer diagnostics only, enabled via `RUST_LOG` and written to
//! stderr. Operator-facing output (listings, retry notices, monitoring lines) is printed
//! directly by the actions and is unaffected by `RUST_LOG`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `warn` if unset.
///
/// # Example
/// ```bash
/// RUST_LOG=borgwrap=debug borgwrap -c backup.yaml create
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
