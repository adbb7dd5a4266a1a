//! # runlog-contracts
//!
//! Frozen interface contracts for the runlog workspace: record shapes, value
//! types, the sink trait, declarative sink configuration, errors, and the
//! structured warning channel. Every other crate depends on this one; reverse
//! dependencies are prohibited.

mod config;
mod error;
mod figure;
mod histogram;
mod record;
mod sink;
mod value;
mod warning;

pub use config::SinkConfig;
pub use error::LogError;
pub use figure::{FigureData, FigureFormat};
pub use histogram::{Gaussian, Histogram, SampleSource};
pub use record::{Record, RecordKind};
pub use sink::{RecordSink, SinkKind};
pub use value::{RichValue, ScalarValue, Value};
pub use warning::{LogWarning, WarningChannel, WarningHandler};
