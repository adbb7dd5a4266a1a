//! Declarative sink configuration.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::sink::SinkKind;

/// Configuration for one sink, consumed by the dispatcher factory.
///
/// Kind-specific settings travel in `params`; unknown params are ignored,
/// malformed ones surface as sink-creation errors. Recognized params:
/// `path` (text-file, csv, viz), `timestamp` (console, text-file),
/// `policy` = `strict` | `tolerant` (csv), `keys` (regex, all kinds),
/// `x_axes` (comma-separated, viz), `histogram_samples` (viz).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink kind
    pub kind: SinkKind,

    /// Kind-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    pub fn new(kind: SinkKind) -> Self {
        Self {
            kind,
            params: HashMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}
