use crate::level::Level;
use crate::record::{ErrorField, ErrorValue, LogRecord, Metadata};
use crate::transport::Transport;
use serde_json::{Map, Value};
use std::sync::{Arc, atomic::{AtomicU64, Ordering}};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns every event into a [`LogRecord`]
/// and hands it to a [`Transport`] on the emitting thread.
///
/// Events below the transport's level are ignored, as are events emitted
/// by this crate itself so that connection diagnostics never loop back
/// into the connection.
pub struct TransportLayer {
    transport: Arc<dyn Transport>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Events the transport reported as sent.
    pub delivered_events: Arc<AtomicU64>,
    /// Events the transport could not send (not connected, send error or
    /// schema violation).
    pub failed_events: Arc<AtomicU64>,
}

impl TransportLayer {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            total_events: Arc::new(AtomicU64::new(0)),
            delivered_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }
}

fn is_own_target(target: &str) -> bool {
    let own = env!("CARGO_CRATE_NAME");
    target == own || target.strip_prefix(own).is_some_and(|rest| rest.starts_with("::"))
}

impl<S> Layer<S> for TransportLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        if is_own_target(meta.target()) {
            return;
        }
        let level = Level::from(meta.level());
        if !level.passes(self.transport.level()) {
            return;
        }

        let mut fields = Map::new();
        let mut message: Option<String> = None;
        let mut error: Option<ErrorValue> = None;

        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
            error: &mut error,
        };
        event.record(&mut visitor);

        let metadata = match error {
            Some(mut err) => {
                err.fields
                    .extend(fields.into_iter().map(|(k, v)| (k, ErrorField::Value(v))));
                Metadata::Error(err)
            }
            None if fields.is_empty() => Metadata::None,
            None => Metadata::Object(Value::Object(fields)),
        };

        let record = LogRecord {
            level,
            message: message.unwrap_or_default(),
            metadata,
        };

        let delivered = Arc::clone(&self.delivered_events);
        let failed = Arc::clone(&self.failed_events);
        let result = self.transport.log(
            &record,
            Box::new(move |err, _delivered| {
                if err.is_some() {
                    failed.fetch_add(1, Ordering::Relaxed);
                } else {
                    delivered.fetch_add(1, Ordering::Relaxed);
                }
            }),
        );

        if let Err(e) = result {
            self.failed_events.fetch_add(1, Ordering::Relaxed);
            eprintln!("log record rejected by wire schema: {}", e);
        }
    }
}

use tracing::field::{Field, Visit};

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Map<String, Value>,
    pub message: &'a mut Option<String>,
    pub error: &'a mut Option<ErrorValue>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.error.is_none() {
            *self.error = Some(ErrorValue::from_error(value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), Value::String(format!("{:?}", value)));
        }
    }
}
