//! Sink-level error definitions.

use thiserror::Error;

use crate::record::RecordKind;
use crate::sink::SinkKind;

/// Unified sink-level error type.
///
/// Everything here is fatal to the call that raised it (programmer error or
/// I/O failure); non-fatal conditions travel through the warning channel
/// instead.
#[derive(Debug, Error)]
pub enum LogError {
    /// A record shape outside the sink's accepted set was forwarded to it
    #[error("sink '{sink}' does not accept {kind} records")]
    UnsupportedType { sink: SinkKind, kind: RecordKind },

    /// Sink write error
    #[error("sink '{sink}' write error: {message}")]
    SinkWrite { sink: SinkKind, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogError {
    /// Create an unsupported-type error
    pub fn unsupported_type(sink: SinkKind, kind: RecordKind) -> Self {
        Self::UnsupportedType { sink, kind }
    }

    /// Create a sink write error
    pub fn sink_write(sink: SinkKind, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink,
            message: message.into(),
        }
    }
}
