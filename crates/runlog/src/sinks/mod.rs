//! Sink implementations
//!
//! Contains ConsoleSink, TextFileSink, CsvSink, and VizSink with its
//! JSON-lines backend.

mod console;
mod csv;
mod jsonl;
mod text;
mod viz;

pub use self::console::ConsoleSink;
pub use self::csv::{CsvSink, SchemaPolicy};
pub use self::jsonl::JsonlBackend;
pub use self::text::TextFileSink;
pub use self::viz::{VizBackend, VizSink};
