//! ConsoleSink - immediate text lines and batched metric tables on stdout.

use std::io::{self, Write};

use regex::Regex;
use tracing::debug;

use runlog_contracts::{LogError, Record, RecordKind, RecordSink, SinkKind, Value};

use crate::batch::MetricBatch;
use crate::render::{render_table, text_line};

/// Sink that prints to standard output.
///
/// Text records are printed as they arrive, timestamped by default. Scalar
/// records accumulate until `dump` prints them as a sorted key/value table.
pub struct ConsoleSink {
    with_timestamp: bool,
    key_filter: Option<Regex>,
    batch: MetricBatch,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            with_timestamp: true,
            key_filter: None,
            batch: MetricBatch::new(),
        }
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    pub fn with_key_filter(mut self, filter: Regex) -> Self {
        self.key_filter = Some(filter);
        self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordSink for ConsoleSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Console
    }

    fn accepted_kinds(&self) -> &[RecordKind] {
        &[RecordKind::Text, RecordKind::Scalar]
    }

    fn key_filter(&self) -> Option<&Regex> {
        self.key_filter.as_ref()
    }

    fn record(&mut self, record: &Record, prefix: &str) -> Result<(), LogError> {
        match record {
            Record::Text(message) => {
                let mut out = io::stdout().lock();
                writeln!(out, "{}", text_line(self.with_timestamp, prefix, message))?;
                Ok(())
            }
            Record::Scalar { key, value } => {
                self.batch.record(key.clone(), Value::Scalar(value.clone()));
                Ok(())
            }
            Record::Rich { .. } => Err(LogError::unsupported_type(self.kind(), record.kind())),
        }
    }

    fn dump(&mut self, _step: Option<u64>) -> Result<(), LogError> {
        let mut out = io::stdout().lock();
        if !self.batch.is_empty() {
            writeln!(out, "{}", render_table(self.batch.scalar_entries()))?;
            self.batch.clear();
        }
        out.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LogError> {
        debug!(sink = %self.kind(), "ConsoleSink closed");
        Ok(())
    }
}
