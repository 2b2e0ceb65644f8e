pub mod error;
pub mod level;
pub mod record;
pub mod wire;

pub mod ansi;
pub mod inspect;
pub mod linkify;
pub mod metadata;
pub mod formatter;

pub mod connection;
pub mod gate;
pub mod ws;

pub mod config;
pub mod env;
pub mod transport;

pub mod layer;
pub mod init;

pub use config::TransportOptions;
pub use error::{ConfigError, DeliveryError, SchemaValidationError};
pub use level::Level;
pub use record::{ErrorValue, LogRecord, Metadata};
pub use transport::{Transport, WsTransport};
