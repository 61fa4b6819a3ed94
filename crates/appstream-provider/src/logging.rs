//! Logging setup
//!
//! stdout belongs to the host protocol, so logs go to stderr without ANSI
//! colours. The filter comes from `APPSTREAM_PROVIDER_LOG`, then `RUST_LOG`,
//! then defaults to `info`.

use crate::error::{ProviderError, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "APPSTREAM_PROVIDER_LOG";
const DEFAULT_DIRECTIVE: &str = "info";

/// The filter directive in effect for the current environment
pub fn log_directive() -> String {
    [LOG_ENV, "RUST_LOG"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string())
}

fn env_filter() -> EnvFilter {
    let directive = log_directive();
    EnvFilter::try_new(&directive).unwrap_or_else(|e| {
        eprintln!("ignoring invalid log filter {directive:?}: {e}");
        EnvFilter::new(DEFAULT_DIRECTIVE)
    })
}

/// Install the stderr subscriber, failing if one is already set
pub fn try_init_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| ProviderError::Logging(e.to_string()))
}

/// Install the stderr subscriber; a subscriber that is already set is kept
pub fn init_logging() {
    if try_init_logging().is_err() {
        tracing::debug!("logging already initialized");
    }
}
