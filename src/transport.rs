use std::sync::Arc;

use chrono::Utc;

use crate::config::TransportOptions;
use crate::connection::{Connection, ConnectionObserver};
use crate::error::{ConfigError, ConnectionError, DeliveryError, SchemaValidationError};
use crate::formatter::Formatter;
use crate::gate::ConnectionGate;
use crate::level::Level;
use crate::record::{LogRecord, Metadata};
use crate::wire::{self, WireMessage, WireRecord};
use crate::ws::WsClient;

/// Completion callback: `(error, delivered)`.
///
/// `delivered` is always `true`. The transport never blocks or retries,
/// so from the caller's point of view every call has been handled once
/// the callback runs; `error` says whether the record actually left.
pub type Completion = Box<dyn FnOnce(Option<DeliveryError>, bool) + Send>;

/// Capability implemented by log transports.
pub trait Transport: Send + Sync {
    /// Minimum level the host should forward to this transport.
    fn level(&self) -> Level;

    /// Handle one log call and run `completion` exactly once before
    /// returning.
    ///
    /// **Returns**
    /// - `Ok(())` once the completion has run, whether or not the record
    ///   was sent.
    /// - `Err(..)` if the rendered record does not satisfy the wire schema.
    ///   The completion is not run in that case.
    fn log(&self, record: &LogRecord, completion: Completion) -> Result<(), SchemaValidationError>;
}

/// Transport that renders records as markup and sends them to a collector.
pub struct WsTransport {
    app: String,
    level: Level,
    formatter: Formatter,
    gate: Arc<ConnectionGate>,
    connection: Arc<dyn Connection>,
}

impl WsTransport {
    /// Build the transport and its WebSocket client.
    ///
    /// Fails when `options.url` is missing or invalid, when the link
    /// pattern does not compile, or when `auto_connect` is set outside a
    /// tokio runtime.
    pub fn connect(options: &TransportOptions) -> Result<Self, ConfigError> {
        let client_options = options.client_options()?;
        let formatter = Formatter::new(options.formatter_config())?;
        let gate = Arc::new(ConnectionGate::new());

        let observers: Vec<Arc<dyn ConnectionObserver>> = vec![gate.clone()];
        let client = WsClient::new(client_options, observers)?;

        Ok(Self {
            app: options.app_name(),
            level: options.level,
            formatter,
            gate,
            connection: Arc::new(client),
        })
    }

    /// Build the transport on top of an existing connection whose lifecycle
    /// events already feed `gate`. `options.url` is not consulted.
    pub fn with_connection(
        options: &TransportOptions,
        connection: Arc<dyn Connection>,
        gate: Arc<ConnectionGate>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            app: options.app_name(),
            level: options.level,
            formatter: Formatter::new(options.formatter_config())?,
            gate,
            connection,
        })
    }

    pub fn app_name(&self) -> &str {
        &self.app
    }

    pub fn gate(&self) -> &Arc<ConnectionGate> {
        &self.gate
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Format one log call and send it if the connection is ready.
    ///
    /// When the gate is not ready the completion gets
    /// [`DeliveryError::NotConnected`] and nothing is sent or kept.
    pub fn deliver<F>(
        &self,
        level: &str,
        message: &str,
        metadata: &Metadata,
        completion: F,
    ) -> Result<(), SchemaValidationError>
    where
        F: FnOnce(Option<DeliveryError>, bool),
    {
        let formatted = self.formatter.format(level, message, metadata);

        if !self.gate.is_ready() {
            completion(Some(DeliveryError::NotConnected), true);
            return Ok(());
        }

        let payload = WireMessage::single(WireRecord {
            timestamp: Utc::now().timestamp_millis(),
            app: self.app.clone(),
            lvl: formatted.level,
            msg: formatted.message,
        });
        let frame = wire::encode(&payload)?;

        match self.connection.send(frame) {
            Ok(()) => completion(None, true),
            Err(e) => completion(Some(DeliveryError::Send(e)), true),
        }
        Ok(())
    }

    /// Start the connection client. Needed when the transport was built
    /// with `auto_connect` off; a no-op once the client is running.
    pub fn start(&self) -> Result<(), ConnectionError> {
        self.connection.start()
    }

    /// Stop the connection client.
    pub async fn close(&self) {
        if let Err(e) = self.connection.close().await {
            tracing::warn!(error = %e, "closing collector connection failed");
        }
    }
}

impl Transport for WsTransport {
    fn level(&self) -> Level {
        self.level
    }

    fn log(&self, record: &LogRecord, completion: Completion) -> Result<(), SchemaValidationError> {
        self.deliver(record.level.as_str(), &record.message, &record.metadata, completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{ConnectionEvent, MemoryConnection};
    use crate::record::ErrorValue;
    use serde_json::json;
    use std::cell::RefCell;

    fn options() -> TransportOptions {
        TransportOptions {
            name: Some("svc".to_string()),
            ..TransportOptions::default()
        }
    }

    fn transport(options: &TransportOptions, ready: bool) -> (WsTransport, MemoryConnection) {
        let conn = MemoryConnection::new();
        let gate = Arc::new(ConnectionGate::new());
        if ready {
            gate.observe(&ConnectionEvent::Open);
        }
        let transport = WsTransport::with_connection(options, Arc::new(conn.clone()), gate).unwrap();
        (transport, conn)
    }

    /// Runs `deliver` and returns every completion it produced.
    fn deliver(
        transport: &WsTransport,
        level: &str,
        message: &str,
        metadata: &Metadata,
    ) -> (Result<(), SchemaValidationError>, Vec<(Option<String>, bool)>) {
        let calls = RefCell::new(Vec::new());
        let result = transport.deliver(level, message, metadata, |err, delivered| {
            calls.borrow_mut().push((err.map(|e| e.to_string()), delivered));
        });
        (result, calls.into_inner())
    }

    #[test]
    fn not_ready_reports_disconnect_without_sending() {
        let (transport, conn) = transport(&options(), false);
        let (result, calls) = deliver(&transport, "info", "hello", &Metadata::from(json!({})));

        assert!(result.is_ok());
        assert_eq!(calls, vec![(Some("ws disconnect".to_string()), true)]);
        assert!(conn.frames().is_empty());
    }

    #[test]
    fn ready_sends_one_envelope() {
        let (transport, conn) = transport(&options(), true);
        let before = Utc::now().timestamp_millis();
        let (result, calls) = deliver(&transport, "info", "hello", &Metadata::from(json!({})));

        assert!(result.is_ok());
        assert_eq!(calls, vec![(None, true)]);

        let frames = conn.frames();
        assert_eq!(frames.len(), 1);
        let message = wire::decode(&frames[0]).unwrap();
        assert_eq!(message.data.len(), 1);
        let record = &message.data[0];
        assert_eq!(record.app, "svc");
        assert_eq!(record.lvl, "info");
        assert_eq!(record.msg, "hello");
        assert!(record.timestamp >= before);
    }

    #[test]
    fn colorized_level_travels_in_envelope() {
        let mut opts = options();
        opts.colorize = true;
        let (transport, conn) = transport(&opts, true);
        deliver(&transport, "info", "hello", &Metadata::None).0.unwrap();

        let message = wire::decode(&conn.frames()[0]).unwrap();
        assert_eq!(message.data[0].lvl, "<span class=\"uk-text-success\">info</span>");
        assert_eq!(message.data[0].msg, "hello");
    }

    #[test]
    fn error_metadata_is_flattened_into_message() {
        let (transport, conn) = transport(&options(), true);
        let metadata = Metadata::Error(ErrorValue::new("boom").with_stack("trace..."));
        deliver(&transport, "error", "failed", &metadata).0.unwrap();

        let msg = &wire::decode(&conn.frames()[0]).unwrap().data[0].msg;
        assert!(msg.starts_with("failed<ul"));
        assert!(msg.contains("message</span>: boom"));
    }

    #[test]
    fn schema_violation_is_returned_and_skips_completion() {
        let (transport, conn) = transport(&options(), true);
        let (result, calls) = deliver(&transport, "", "hello", &Metadata::None);

        assert_eq!(
            result,
            Err(SchemaValidationError::MissingField { index: 0, field: "lvl" })
        );
        assert!(calls.is_empty());
        assert!(conn.frames().is_empty());
    }

    #[test]
    fn rejected_frame_is_reported_through_completion() {
        struct Broken;

        #[async_trait::async_trait]
        impl Connection for Broken {
            fn send(&self, _frame: Vec<u8>) -> Result<(), ConnectionError> {
                Err(ConnectionError::Closed)
            }
        }

        let gate = Arc::new(ConnectionGate::new());
        gate.observe(&ConnectionEvent::Open);
        let transport = WsTransport::with_connection(&options(), Arc::new(Broken), gate).unwrap();
        let (result, calls) = deliver(&transport, "info", "hello", &Metadata::None);

        assert!(result.is_ok());
        assert_eq!(
            calls,
            vec![(Some("send failed: connection writer is closed".to_string()), true)]
        );
    }

    #[test]
    fn gate_flips_are_seen_by_following_calls() {
        let (transport, conn) = transport(&options(), false);
        let record = LogRecord::new(Level::Warn, "x");

        transport.log(&record, Box::new(|err, _| assert!(err.is_some()))).unwrap();
        transport.gate().observe(&ConnectionEvent::Open);
        transport.log(&record, Box::new(|err, _| assert!(err.is_none()))).unwrap();
        transport.gate().observe(&ConnectionEvent::Error("reset".to_string()));
        transport.log(&record, Box::new(|err, _| assert!(err.is_some()))).unwrap();

        assert_eq!(conn.frames().len(), 1);
    }

    #[test]
    fn manual_start_outside_runtime_fails() {
        let mut opts = TransportOptions::new("ws://127.0.0.1:9");
        opts.auto_connect = false;
        let transport = WsTransport::connect(&opts).unwrap();
        assert!(matches!(transport.start(), Err(ConnectionError::NoRuntime)));
    }

    #[test]
    fn connect_requires_url() {
        assert!(matches!(
            WsTransport::connect(&TransportOptions::default()),
            Err(ConfigError::MissingUrl)
        ));
    }

    #[test]
    fn connect_outside_runtime_fails_when_auto_connecting() {
        assert!(matches!(
            WsTransport::connect(&TransportOptions::new("ws://127.0.0.1:9")),
            Err(ConfigError::Connection(ConnectionError::NoRuntime))
        ));
    }
}
