//! Logging setup for the command-line tools
//!
//! Output goes to stderr so stdout stays clean for DDL and summaries.
//! `RUST_LOG` overrides the default filter.

use tracing_subscriber::EnvFilter;

/// Install a global fmt subscriber. Calling it twice is harmless.
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
