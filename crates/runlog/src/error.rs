//! Dispatcher error types.

use thiserror::Error;

use runlog_contracts::{LogError, SinkKind};

/// Dispatcher-specific errors.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation from config failed
    #[error("failed to create sink '{kind}': {message}")]
    SinkCreation { kind: SinkKind, message: String },

    /// A sink unfit for registration was added
    #[error("invalid sink: {message}")]
    InvalidSink { message: String },

    /// pop_prefix without a matching push_prefix
    #[error("prefix stack underflow: pop without a matching push")]
    PrefixUnderflow,

    /// Sink-level error (from contract)
    #[error("sink error: {0}")]
    Sink(#[from] LogError),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(kind: SinkKind, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            kind,
            message: message.into(),
        }
    }

    /// Create an invalid sink error
    pub fn invalid_sink(message: impl Into<String>) -> Self {
        Self::InvalidSink {
            message: message.into(),
        }
    }
}
