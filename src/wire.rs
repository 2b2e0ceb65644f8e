use rmp_serde::Serializer;
use serde::{Deserialize, Serialize};

use crate::error::SchemaValidationError;

/// A single rendered log line as it travels to the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub app: String,
    pub lvl: String,
    pub msg: String,
}

/// Envelope sent as one binary frame. Always carries a list so batching
/// can be added later without a format break.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    pub data: Vec<WireRecord>,
}

impl WireMessage {
    pub fn single(record: WireRecord) -> Self {
        Self { data: vec![record] }
    }

    /// Check the message against the schema without encoding it.
    pub fn validate(&self) -> Result<(), SchemaValidationError> {
        if self.data.is_empty() {
            return Err(SchemaValidationError::EmptyBatch);
        }

        for (index, record) in self.data.iter().enumerate() {
            if record.timestamp < 0 {
                return Err(SchemaValidationError::NegativeTimestamp {
                    index,
                    value: record.timestamp,
                });
            }
            if record.app.is_empty() {
                return Err(SchemaValidationError::MissingField { index, field: "app" });
            }
            if record.lvl.is_empty() {
                return Err(SchemaValidationError::MissingField { index, field: "lvl" });
            }
        }
        Ok(())
    }
}

/// Validate and serialise a message into a MessagePack payload with named
/// fields.
pub fn encode(message: &WireMessage) -> Result<Vec<u8>, SchemaValidationError> {
    message.validate()?;

    let mut buf = Vec::with_capacity(128);
    message
        .serialize(&mut Serializer::new(&mut buf).with_struct_map())
        .map_err(|e| SchemaValidationError::Encode(e.to_string()))?;
    Ok(buf)
}

/// Decode a payload produced by [`encode`]. The decoded message is
/// validated before it is returned.
pub fn decode(bytes: &[u8]) -> Result<WireMessage, SchemaValidationError> {
    let message: WireMessage =
        rmp_serde::from_slice(bytes).map_err(|e| SchemaValidationError::Decode(e.to_string()))?;
    message.validate()?;
    Ok(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> WireRecord {
        WireRecord {
            timestamp: 1_700_000_000_123,
            app: "svc".to_string(),
            lvl: "<span class=\"uk-text-success\">info</span>".to_string(),
            msg: "hello <b>world</b>".to_string(),
        }
    }

    #[test]
    fn decode_returns_what_was_encoded() {
        let message = WireMessage::single(record());
        let bytes = encode(&message).unwrap();
        assert_eq!(decode(&bytes).unwrap(), message);
    }

    #[test]
    fn empty_message_text_is_allowed() {
        let mut rec = record();
        rec.msg.clear();
        assert!(encode(&WireMessage::single(rec)).is_ok());
    }

    #[test]
    fn rejects_empty_batch() {
        let err = encode(&WireMessage { data: vec![] }).unwrap_err();
        assert_eq!(err, SchemaValidationError::EmptyBatch);
    }

    #[test]
    fn rejects_missing_app_and_level() {
        let mut rec = record();
        rec.app.clear();
        assert_eq!(
            encode(&WireMessage::single(rec)).unwrap_err(),
            SchemaValidationError::MissingField { index: 0, field: "app" }
        );

        let mut rec = record();
        rec.lvl.clear();
        assert_eq!(
            encode(&WireMessage::single(rec)).unwrap_err(),
            SchemaValidationError::MissingField { index: 0, field: "lvl" }
        );
    }

    #[test]
    fn rejects_negative_timestamp() {
        let mut rec = record();
        rec.timestamp = -1;
        assert!(matches!(
            WireMessage::single(rec).validate(),
            Err(SchemaValidationError::NegativeTimestamp { index: 0, value: -1 })
        ));
    }

    #[test]
    fn decode_rejects_mistyped_fields() {
        #[derive(Serialize)]
        struct Bad {
            data: Vec<BadRecord>,
        }
        #[derive(Serialize)]
        struct BadRecord {
            timestamp: &'static str,
            app: &'static str,
            lvl: &'static str,
            msg: &'static str,
        }

        let bad = Bad {
            data: vec![BadRecord { timestamp: "now", app: "svc", lvl: "info", msg: "x" }],
        };
        let mut buf = Vec::new();
        bad.serialize(&mut Serializer::new(&mut buf).with_struct_map()).unwrap();

        assert!(matches!(decode(&buf), Err(SchemaValidationError::Decode(_))));
    }
}
