//! Logging utilities
//!
//! Thin wrapper over `env_logger`; verbosity is controlled through the
//! `RUST_LOG` environment variable.

pub use log::{debug, error, info, trace, warn};

/// Initialize the logging system. Call once at startup.
pub fn init() {
    env_logger::init();
}

/// Initialize logging for tests, tolerating repeated calls.
pub fn init_for_tests() {
    let _ = env_logger::builder().is_test(true).try_init();
}
