//! TextFileSink - append-only text log file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use runlog_contracts::{LogError, Record, RecordKind, RecordSink, SinkKind, Value};

use crate::batch::MetricBatch;
use crate::render::{render_table, text_line};

/// Sink that appends text lines and metric tables to a file.
///
/// Behaves like [`ConsoleSink`](crate::ConsoleSink) but writes to an
/// append-mode file, creating parent directories on construction.
pub struct TextFileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    with_timestamp: bool,
    key_filter: Option<Regex>,
    batch: MetricBatch,
}

impl TextFileSink {
    pub fn new(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        create_parent_dirs(&path)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            with_timestamp: true,
            key_filter: None,
            batch: MetricBatch::new(),
        })
    }

    pub fn with_timestamp(mut self, enabled: bool) -> Self {
        self.with_timestamp = enabled;
        self
    }

    pub fn with_key_filter(mut self, filter: Regex) -> Self {
        self.key_filter = Some(filter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, LogError> {
        self.writer
            .as_mut()
            .ok_or_else(|| LogError::sink_write(SinkKind::TextFile, "sink is closed"))
    }
}

pub(crate) fn create_parent_dirs(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

impl RecordSink for TextFileSink {
    fn kind(&self) -> SinkKind {
        SinkKind::TextFile
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
                let line = text_line(self.with_timestamp, prefix, message);
                let writer = self.writer()?;
                writeln!(writer, "{line}")?;
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
        if !self.batch.is_empty() {
            let table = render_table(self.batch.scalar_entries());
            let writer = self.writer()?;
            writeln!(writer, "{table}")?;
            self.batch.clear();
        }
        self.writer()?.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LogError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(path = %self.path.display(), "TextFileSink closed");
        }
        Ok(())
    }
}
