//! Logging initialisation.
//!
//! Uses `tracing` with an env-filter: set `RUST_LOG` to adjust the
//! level (default `info`), e.g. `RUST_LOG=allocation_engine=debug`.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global subscriber for the binary.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}

/// Initialise logging for tests; safe to call repeatedly.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
