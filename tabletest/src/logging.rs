//! Tracing initialization for the CLI.

use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber: `RUST_LOG` controls the filter, with a
/// `warn` default, compact output on stderr so stdout stays machine-usable.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
