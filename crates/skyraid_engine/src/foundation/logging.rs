//! Logging utilities

pub use log::{debug, error, info, trace, warn};

/// Initialize the logger from `RUST_LOG`, defaulting to `default_level` when unset
pub fn init(default_level: &str) {
    let env = env_logger::Env::default().default_filter_or(default_level);
    // A second init (tests, embedding) keeps the first logger.
    let _ = env_logger::Builder::from_env(env).format_timestamp_millis().try_init();
}
