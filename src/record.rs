use std::error::Error;

use serde_json::Value;

use crate::level::Level;

/// One log call as handed to the transport by the host framework.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub metadata: Metadata,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            metadata: Metadata::None,
        }
    }

    pub fn with_metadata(mut self, metadata: impl Into<Metadata>) -> Self {
        self.metadata = metadata.into();
        self
    }
}

/// Extra data attached to a log call, tagged by the shape that decides how
/// it gets rendered.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Metadata {
    #[default]
    None,
    Error(ErrorValue),
    /// Null, boolean, number or string.
    Scalar(Value),
    /// JSON object or array.
    Object(Value),
}

impl Metadata {
    pub fn is_error(&self) -> bool {
        matches!(self, Metadata::Error(_))
    }

    /// True when there is nothing to render: no metadata, an empty object
    /// or array, or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Metadata::None => true,
            Metadata::Error(_) => false,
            Metadata::Scalar(Value::String(s)) => s.is_empty(),
            Metadata::Scalar(_) => false,
            Metadata::Object(Value::Object(map)) => map.is_empty(),
            Metadata::Object(Value::Array(items)) => items.is_empty(),
            Metadata::Object(_) => false,
        }
    }
}

impl From<Value> for Metadata {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => Metadata::Object(value),
            scalar => Metadata::Scalar(scalar),
        }
    }
}

impl From<ErrorValue> for Metadata {
    fn from(err: ErrorValue) -> Self {
        Metadata::Error(err)
    }
}

/// Value of an additional property carried by an [`ErrorValue`].
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorField {
    Value(Value),
    /// A function-typed property. Never rendered.
    Callable,
}

/// Error-shaped metadata: message, optional stack trace and any number of
/// extra named properties, kept in insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorValue {
    pub message: String,
    pub stack: Option<String>,
    pub fields: Vec<(String, ErrorField)>,
}

impl ErrorValue {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), ErrorField::Value(value.into())));
        self
    }

    pub fn with_callable(mut self, name: impl Into<String>) -> Self {
        self.fields.push((name.into(), ErrorField::Callable));
        self
    }

    /// Build from a Rust error. The stack is the `source()` chain, one
    /// cause per line, and is left empty when the error has no source.
    pub fn from_error(err: &(dyn Error + 'static)) -> Self {
        let mut stack = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            stack.push(format!("    caused by: {cause}"));
            source = cause.source();
        }

        let mut value = ErrorValue::new(err.to_string());
        if !stack.is_empty() {
            value.stack = Some(format!("{err}\n{}", stack.join("\n")));
        }
        value
    }
}
