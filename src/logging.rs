//! Log subscriber setup for the binary
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever embeds it.

use tracing_subscriber::EnvFilter;

use crate::config::settings::Settings;

/// Environment variable holding a filter directive, e.g. `fieldseal=debug`
pub const LOG_ENV: &str = "FIELDSEAL_LOG";

/// Pick the filter: env var, then settings, then `warn`
pub fn log_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&settings.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install a stderr subscriber so stdout carries only data
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(settings: &Settings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(settings))
        .with_writer(std::io::stderr)
        .try_init();
}
