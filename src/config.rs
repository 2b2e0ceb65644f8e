use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::ansi::AnsiOptions;
use crate::error::ConfigError;
use crate::inspect::InspectOptions;
use crate::level::Level;
use crate::ws::ClientOptions;

/// Default delay between reconnection attempts.
pub const DEFAULT_RECONNECT_INTERVAL_MS: u64 = 4000;

/// Formatting switches captured when the transport is built.
///
/// Never mutated afterwards; every log call reads the same values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Wrap the level name in a style span.
    pub colorize_level: bool,
    /// Turn URLs in the message into anchors.
    pub linkify: bool,
    /// Pattern used instead of the built-in URL pattern.
    pub link_pattern: Option<String>,
    /// Convert ANSI escape sequences in the final message into markup.
    pub ansi_to_markup: bool,
    /// Render object metadata as colorized JSON instead of an inspect dump.
    pub pretty_json_metadata: bool,
    /// Level name to style class, overriding the built-in table.
    pub color_map: BTreeMap<String, String>,
    pub inspect: InspectOptions,
    pub ansi: AnsiOptions,
}

/// User-facing transport options.
///
/// Field aliases accept the camel-cased option names used by existing
/// deployments (`regex`, `ConvertAnsi`, `MetaJsonMarkup`, ...).
///
/// **Fields**
/// - `url`: collector address, `ws://` or `wss://`. Required.
/// - `name`: application name put in every envelope. Defaults to the crate
///   name followed by the process id.
/// - `level`: minimum level forwarded by [`TransportLayer`].
/// - `reconnect_interval_ms`, `auto_connect`, `max_retries`: connection
///   client policy. `max_retries = None` retries forever.
///
/// [`TransportLayer`]: crate::layer::TransportLayer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TransportOptions {
    pub url: Option<String>,
    pub name: Option<String>,
    pub level: Level,
    #[serde(alias = "regex")]
    pub linkify: bool,
    pub link_pattern: Option<String>,
    pub colorize: bool,
    #[serde(alias = "ConvertAnsi")]
    pub convert_ansi: bool,
    pub colors: BTreeMap<String, String>,
    #[serde(alias = "MetaJsonMarkup")]
    pub meta_json_markup: bool,
    #[serde(alias = "ansiToHtml")]
    pub ansi_to_html: AnsiOptions,
    #[serde(alias = "utilInspect")]
    pub inspect: InspectOptions,
    #[serde(alias = "reconnectInterval")]
    pub reconnect_interval_ms: u64,
    #[serde(alias = "autoConnect")]
    pub auto_connect: bool,
    #[serde(alias = "maxRetries")]
    pub max_retries: Option<u32>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            url: None,
            name: None,
            level: Level::Info,
            linkify: false,
            link_pattern: None,
            colorize: false,
            convert_ansi: false,
            colors: BTreeMap::new(),
            meta_json_markup: false,
            ansi_to_html: AnsiOptions::default(),
            inspect: InspectOptions::default(),
            reconnect_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
            auto_connect: true,
            max_retries: None,
        }
    }
}

impl TransportOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Application name sent in every envelope.
    pub fn app_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", env!("CARGO_PKG_NAME"), std::process::id()),
        }
    }

    pub fn formatter_config(&self) -> FormatterConfig {
        FormatterConfig {
            colorize_level: self.colorize,
            linkify: self.linkify,
            link_pattern: self.link_pattern.clone(),
            ansi_to_markup: self.convert_ansi,
            pretty_json_metadata: self.meta_json_markup,
            color_map: self.colors.clone(),
            inspect: self.inspect.clone(),
            ansi: self.ansi_to_html.clone(),
        }
    }

    /// Connection client options. Fails when `url` is missing or is not a
    /// WebSocket address.
    pub fn client_options(&self) -> Result<ClientOptions, ConfigError> {
        let url = parse_collector_url(self.url.as_deref())?;
        Ok(ClientOptions {
            url,
            reconnect_interval: Duration::from_millis(self.reconnect_interval_ms),
            auto_connect: self.auto_connect,
            max_retries: self.max_retries,
        })
    }
}

/// Validate a collector URL. Only the `ws` and `wss` schemes are accepted.
///
/// Examples:
/// - "ws://localhost:30001"
/// - "wss://logs.example.com/ingest"
pub fn parse_collector_url(url: Option<&str>) -> Result<String, ConfigError> {
    let url = match url.map(str::trim) {
        Some(url) if !url.is_empty() => url,
        _ => return Err(ConfigError::MissingUrl),
    };

    let lower = url.to_ascii_lowercase();
    if lower.starts_with("ws://") || lower.starts_with("wss://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::UnsupportedScheme(url.to_string()))
    }
}
