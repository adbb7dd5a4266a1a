//! Scalar and rich value types carried by keyed records.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::figure::FigureData;
use crate::histogram::{Gaussian, Histogram, SampleSource};

/// A primitive metric value.
///
/// `Display` output is what lands in CSV cells and console tables, so it is
/// part of the file format: integers and floats render the way Rust prints
/// them by default, booleans as `true`/`false`, text verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl ScalarValue {
    /// Numeric view used by plotting sinks. Text is not plottable.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Int(v) => Some(*v as f64),
            ScalarValue::Float(v) => Some(*v),
            ScalarValue::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            ScalarValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::Float(v) => write!(f, "{v}"),
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int(v)
    }
}

impl From<i32> for ScalarValue {
    fn from(v: i32) -> Self {
        ScalarValue::Int(v.into())
    }
}

impl From<u32> for ScalarValue {
    fn from(v: u32) -> Self {
        ScalarValue::Int(v.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float(v)
    }
}

impl From<f32> for ScalarValue {
    fn from(v: f32) -> Self {
        ScalarValue::Float(v.into())
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Text(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Text(v)
    }
}

/// A rich metric payload, consumed only by sinks that understand it.
///
/// Payloads are reference-counted so one record can fan out to several sinks
/// without copying pixel or sample buffers.
#[derive(Clone)]
pub enum RichValue {
    /// Rendered figure (raw pixels, PNG-encoded by backends that persist it)
    Figure(Arc<FigureData>),
    /// Pre-drawn sample batch
    Histogram(Arc<Histogram>),
    /// Anything that can draw samples on demand
    Distribution(Arc<dyn SampleSource>),
}

impl fmt::Debug for RichValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RichValue::Figure(fig) => f.debug_tuple("Figure").field(fig).finish(),
            RichValue::Histogram(h) => f.debug_tuple("Histogram").field(h).finish(),
            RichValue::Distribution(_) => f.debug_tuple("Distribution").field(&"..").finish(),
        }
    }
}

/// Either value shape; the input type of `Dispatcher::record`.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(ScalarValue),
    Rich(RichValue),
}

impl From<ScalarValue> for Value {
    fn from(v: ScalarValue) -> Self {
        Value::Scalar(v)
    }
}

impl From<RichValue> for Value {
    fn from(v: RichValue) -> Self {
        Value::Rich(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Scalar(v.into())
    }
}

impl From<FigureData> for Value {
    fn from(v: FigureData) -> Self {
        Value::Rich(RichValue::Figure(Arc::new(v)))
    }
}

impl From<Histogram> for Value {
    fn from(v: Histogram) -> Self {
        Value::Rich(RichValue::Histogram(Arc::new(v)))
    }
}

impl From<Gaussian> for Value {
    fn from(v: Gaussian) -> Self {
        Value::Rich(RichValue::Distribution(Arc::new(v)))
    }
}

impl From<Arc<dyn SampleSource>> for Value {
    fn from(v: Arc<dyn SampleSource>) -> Self {
        Value::Rich(RichValue::Distribution(v))
    }
}
