//! Structured warnings and the per-owner warning channel.
//!
//! Warnings never abort the call that raised them. Each dispatcher and each
//! warning-capable sink owns its own channel, so suppression and
//! deduplication are scoped to one instance.

use std::collections::HashSet;
use std::fmt;

use crate::record::RecordKind;

/// Non-fatal diagnostic events.
#[derive(Debug, Clone, PartialEq)]
pub enum LogWarning {
    /// A record was issued while no sinks were registered.
    NoSinks,
    /// A record matched none of the registered sinks.
    NoMatchingSink { kind: RecordKind },
    /// A tabular sink had to expand its fieldnames.
    SchemaDrift {
        previous: Vec<String>,
        expanded: Vec<String>,
    },
    /// Configured x-axes were missing from the dumped batch.
    AxisNotFound { axes: Vec<String> },
}

impl fmt::Display for LogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogWarning::NoSinks => {
                write!(f, "no sinks are registered; the record was dropped")
            }
            LogWarning::NoMatchingSink { kind } => {
                write!(f, "no registered sink accepts {kind} records")
            }
            LogWarning::SchemaDrift { previous, expanded } => {
                write!(
                    f,
                    "fieldnames expanded from [{}] to [{}]",
                    previous.join(", "),
                    expanded.join(", ")
                )
            }
            LogWarning::AxisNotFound { axes } => {
                write!(
                    f,
                    "configured x-axes [{}] are missing from the current batch",
                    axes.join(", ")
                )
            }
        }
    }
}

/// Observer invoked for every emitted warning.
pub type WarningHandler = Box<dyn FnMut(&LogWarning)>;

/// Warning side-channel owned by one dispatcher or sink.
///
/// Without a caller-supplied handler, warnings land on `tracing::warn!`.
/// Disabling is permanent for the owner unless re-enabled explicitly.
pub struct WarningChannel {
    enabled: bool,
    seen: HashSet<String>,
    handler: Option<WarningHandler>,
}

impl WarningChannel {
    pub fn new() -> Self {
        Self {
            enabled: true,
            seen: HashSet::new(),
            handler: None,
        }
    }

    pub fn with_handler(handler: WarningHandler) -> Self {
        Self {
            enabled: true,
            seen: HashSet::new(),
            handler: Some(handler),
        }
    }

    /// Replace the observer.
    pub fn set_handler(&mut self, handler: WarningHandler) {
        self.handler = Some(handler);
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Emit a warning.
    pub fn emit(&mut self, warning: LogWarning) {
        if !self.enabled {
            return;
        }
        self.notify(&warning);
    }

    /// Emit a warning at most once per distinct rendered message for the
    /// lifetime of this channel.
    pub fn emit_once(&mut self, warning: LogWarning) {
        if !self.enabled {
            return;
        }
        if self.seen.insert(warning.to_string()) {
            self.notify(&warning);
        }
    }

    fn notify(&mut self, warning: &LogWarning) {
        match &mut self.handler {
            Some(handler) => handler(warning),
            None => tracing::warn!("{warning}"),
        }
    }
}

impl Default for WarningChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WarningChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WarningChannel")
            .field("enabled", &self.enabled)
            .field("seen", &self.seen.len())
            .field("handler", &self.handler.is_some())
            .finish()
    }
}
