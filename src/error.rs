/// Error returned when building a transport from [`TransportOptions`].
///
/// All variants are fatal: they are raised once during setup and never
/// recovered from.
///
/// [`TransportOptions`]: crate::config::TransportOptions
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("need server url, e.g. ws://localhost:30001")]
    MissingUrl,

    #[error("unsupported collector url scheme in {0:?}, expected ws:// or wss://")]
    UnsupportedScheme(String),

    #[error("invalid link pattern: {0}")]
    InvalidLinkPattern(#[from] regex::Error),

    #[error("unknown log level {0:?}")]
    InvalidLevel(String),

    #[error("reconnect interval must be whole milliseconds, got {0:?}")]
    InvalidReconnectInterval(String),

    #[error("cannot start collector connection: {0}")]
    Connection(#[from] ConnectionError),
}

/// A wire message failed validation, or bytes could not be decoded into one.
///
/// On the sending side this only happens when the formatter produced
/// something the schema does not accept, so it is surfaced to the caller
/// as an `Err` instead of through the completion callback.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaValidationError {
    #[error("data: expected at least one record")]
    EmptyBatch,

    #[error("data[{index}].{field}: required text field is empty")]
    MissingField { index: usize, field: &'static str },

    #[error("data[{index}].timestamp: expected milliseconds since epoch, got {value}")]
    NegativeTimestamp { index: usize, value: i64 },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error("decode failed: {0}")]
    Decode(String),
}

/// Error raised by a [`Connection`](crate::connection::Connection) when a
/// frame cannot be handed to the socket writer.
#[derive(thiserror::Error, Debug)]
pub enum ConnectionError {
    #[error("connection writer is closed")]
    Closed,

    #[error("no tokio runtime available to drive the connection")]
    NoRuntime,
}

/// Per-call delivery failure, reported through the completion callback.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("ws disconnect")]
    NotConnected,

    #[error("send failed: {0}")]
    Send(#[from] ConnectionError),
}
