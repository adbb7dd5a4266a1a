//! MetricBatch - everything recorded into one sink since its last dump.

use runlog_contracts::{ScalarValue, Value};

/// Insertion-ordered key/value accumulator.
///
/// Within one batch each key maps to at most one value; re-recording a key
/// overwrites in place, keeping the key's original position. Order matters:
/// it is what fixes a tabular sink's column order on the first dump.
#[derive(Debug, Default)]
pub struct MetricBatch {
    entries: Vec<(String, Value)>,
}

impl MetricBatch {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Upsert `key -> value`. Last write for a key wins.
    pub fn record(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Snapshot view restricted to scalar entries, insertion order preserved.
    /// Rich entries stay in the batch for sinks that consume them directly.
    pub fn scalar_entries(&self) -> impl Iterator<Item = (&str, &ScalarValue)> {
        self.entries.iter().filter_map(|(k, v)| match v {
            Value::Scalar(s) => Some((k.as_str(), s)),
            Value::Rich(_) => None,
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
