//! Environment variable names used by this crate for convenient
//! configuration of the transport from microservices.
//!
//! These are purely helpers; the core transport types remain decoupled
//! from environment access.

use crate::config::TransportOptions;
use crate::error::ConfigError;

/// Collector WebSocket URL, e.g. `ws://127.0.0.1:30001`.
pub const LOG_TRANSPORT_URL_ENV: &str = "LOG_TRANSPORT_URL";

/// Application name put in every envelope.
pub const LOG_TRANSPORT_NAME_ENV: &str = "LOG_TRANSPORT_NAME";

/// Minimum level forwarded by the tracing layer (`error` ... `silly`).
pub const LOG_TRANSPORT_LEVEL_ENV: &str = "LOG_TRANSPORT_LEVEL";

/// Set to `1`/`true` to colorize level badges.
pub const LOG_TRANSPORT_COLORIZE_ENV: &str = "LOG_TRANSPORT_COLORIZE";

/// Set to `1`/`true` to turn URLs into links.
pub const LOG_TRANSPORT_LINKIFY_ENV: &str = "LOG_TRANSPORT_LINKIFY";

/// Set to `1`/`true` to convert ANSI escapes into markup.
pub const LOG_TRANSPORT_CONVERT_ANSI_ENV: &str = "LOG_TRANSPORT_CONVERT_ANSI";

/// Set to `1`/`true` to render object metadata as colorized JSON.
pub const LOG_TRANSPORT_JSON_MARKUP_ENV: &str = "LOG_TRANSPORT_JSON_MARKUP";

/// Delay between reconnection attempts in milliseconds.
pub const LOG_TRANSPORT_RECONNECT_MS_ENV: &str = "LOG_TRANSPORT_RECONNECT_MS";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Build [`TransportOptions`] from a variable lookup. Unset variables keep
/// their defaults.
pub fn options_from_lookup<F>(lookup: F) -> Result<TransportOptions, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut options = TransportOptions::default();

    options.url = lookup(LOG_TRANSPORT_URL_ENV);
    options.name = lookup(LOG_TRANSPORT_NAME_ENV);
    if let Some(level) = lookup(LOG_TRANSPORT_LEVEL_ENV) {
        options.level = level.parse()?;
    }
    if let Some(v) = lookup(LOG_TRANSPORT_COLORIZE_ENV) {
        options.colorize = flag(&v);
    }
    if let Some(v) = lookup(LOG_TRANSPORT_LINKIFY_ENV) {
        options.linkify = flag(&v);
    }
    if let Some(v) = lookup(LOG_TRANSPORT_CONVERT_ANSI_ENV) {
        options.convert_ansi = flag(&v);
    }
    if let Some(v) = lookup(LOG_TRANSPORT_JSON_MARKUP_ENV) {
        options.meta_json_markup = flag(&v);
    }
    if let Some(v) = lookup(LOG_TRANSPORT_RECONNECT_MS_ENV) {
        options.reconnect_interval_ms = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidReconnectInterval(v.clone()))?;
    }

    Ok(options)
}

/// Build [`TransportOptions`] from the process environment.
pub fn options_from_env() -> Result<TransportOptions, ConfigError> {
    options_from_lookup(|key| std::env::var(key).ok())
}
