//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::LogConfig;

/// Install the global fmt subscriber described by `config`.
///
/// Returns `false` if a global subscriber was already installed; the existing
/// one is kept.
pub fn init_logging(config: &LogConfig) -> bool {
    let builder = tracing_subscriber::fmt().with_env_filter(build_filter(&config.filter));

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::debug!(filter = %config.filter, json = config.json, "logging initialized");
    }
    installed
}

/// Parse `directive`, falling back to `warn` when it does not parse
fn build_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
}
