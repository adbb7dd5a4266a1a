//! RecordSink trait - dispatcher output interface
//!
//! Defines the abstract interface every sink implementation must provide.
//! Sinks are synchronous and single-threaded by contract: every call runs to
//! completion before returning, and callers serialize access themselves.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::LogError;
use crate::record::{Record, RecordKind};

/// Concrete sink kind. The dispatcher registry holds at most one sink per
/// kind; re-adding a kind replaces the existing instance in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    Console,
    TextFile,
    Csv,
    Viz,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::Console => write!(f, "console"),
            SinkKind::TextFile => write!(f, "text-file"),
            SinkKind::Csv => write!(f, "csv"),
            SinkKind::Viz => write!(f, "viz"),
        }
    }
}

/// One output destination.
///
/// Keyed records accumulate into the sink's private batch; `dump` serializes
/// and clears the batch. Text records are rendered immediately.
pub trait RecordSink {
    /// Concrete kind, used as the registry identity.
    fn kind(&self) -> SinkKind;

    /// Record shapes this sink consumes. Forwarding any other shape is a
    /// programmer error (`LogError::UnsupportedType`).
    fn accepted_kinds(&self) -> &[RecordKind];

    /// Optional key filter; `None` accepts every key.
    fn key_filter(&self) -> Option<&Regex> {
        None
    }

    /// Whether the dispatcher should forward this record here.
    fn accepts(&self, record: &Record) -> bool {
        if !self.accepted_kinds().contains(&record.kind()) {
            return false;
        }
        match (record.key(), self.key_filter()) {
            (Some(key), Some(filter)) => filter.is_match(key),
            _ => true,
        }
    }

    /// Consume one record. Must not fail for well-formed records whose kind
    /// is in `accepted_kinds`.
    fn record(&mut self, record: &Record, prefix: &str) -> Result<(), LogError>;

    /// Serialize the accumulated batch to the medium and clear it. A dump
    /// with an empty batch is a no-op, never a blank row or header.
    fn dump(&mut self, step: Option<u64>) -> Result<(), LogError>;

    /// Release any underlying handle. Safe to call repeatedly; already
    /// flushed data is never lost.
    fn close(&mut self) -> Result<(), LogError>;

    /// Permanently suppress this sink's warnings.
    fn disable_warnings(&mut self) {}
}
