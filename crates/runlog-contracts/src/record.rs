//! Record - the unit of fan-out
//!
//! Every call into the dispatcher becomes one `Record`, tagged so sinks can
//! declare which shapes they accept without inspecting payloads.

use std::fmt;

use crate::value::{RichValue, ScalarValue, Value};

/// Record shape tag, used for sink acceptance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Free-form text line
    Text,
    /// Keyed scalar metric
    Scalar,
    /// Keyed rich payload (figure, histogram, distribution)
    Rich,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Text => write!(f, "text"),
            RecordKind::Scalar => write!(f, "scalar"),
            RecordKind::Rich => write!(f, "rich"),
        }
    }
}

/// A single log record flowing from the dispatcher to sinks.
#[derive(Debug, Clone)]
pub enum Record {
    /// Free-form text, emitted immediately by text-capable sinks.
    Text(String),
    /// Scalar metric, accumulated into a sink's batch until the next dump.
    Scalar { key: String, value: ScalarValue },
    /// Rich metric, accumulated like a scalar but consumed only by sinks
    /// that understand the payload.
    Rich { key: String, value: RichValue },
}

impl Record {
    /// Build the keyed record variant matching the value's shape.
    pub fn metric(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        match value.into() {
            Value::Scalar(value) => Record::Scalar { key, value },
            Value::Rich(value) => Record::Rich { key, value },
        }
    }

    /// Shape tag for acceptance checks.
    pub fn kind(&self) -> RecordKind {
        match self {
            Record::Text(_) => RecordKind::Text,
            Record::Scalar { .. } => RecordKind::Scalar,
            Record::Rich { .. } => RecordKind::Rich,
        }
    }

    /// The metric key, if this record has one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Record::Text(_) => None,
            Record::Scalar { key, .. } | Record::Rich { key, .. } => Some(key),
        }
    }
}
