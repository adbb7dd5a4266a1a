//! # runlog
//!
//! Multiplexed logging for iterative experiments.
//!
//! A [`Dispatcher`] fans free-form text and key/value metrics out to every
//! registered sink that accepts the record's shape and key. Sinks accumulate
//! keyed metrics into a private batch between flush points; `dump_all`
//! serializes each batch to its medium and clears it.
//!
//! ```no_run
//! use runlog::{ConsoleSink, CsvSink, Dispatcher};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut logger = Dispatcher::new();
//! logger.add_sink(Box::new(ConsoleSink::new()))?;
//! logger.add_sink(Box::new(CsvSink::new("progress.csv")?))?;
//!
//! for itr in 0..10 {
//!     logger.log(format!("starting iteration {itr}"))?;
//!     logger.record("itr", itr)?;
//!     logger.record("loss", 100.0 / (2 + itr) as f64)?;
//!     logger.dump_all(None)?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod dispatcher;
pub mod error;
mod render;
pub mod sinks;

pub use runlog_contracts::{
    FigureData, FigureFormat, Gaussian, Histogram, LogError, LogWarning, Record, RecordKind,
    RecordSink, RichValue, SampleSource, ScalarValue, SinkConfig, SinkKind, Value, WarningChannel,
    WarningHandler,
};

pub use batch::MetricBatch;
pub use dispatcher::{create_dispatcher, create_sink, Dispatcher};
pub use error::DispatcherError;
pub use sinks::{ConsoleSink, CsvSink, JsonlBackend, SchemaPolicy, TextFileSink, VizBackend, VizSink};
