//! CsvSink - fixed-schema tabular file output with schema-drift handling.
//!
//! The column set is fixed by the first non-empty dump, in first-seen key
//! order. Keys that appear later are handled per [`SchemaPolicy`]: dropped
//! (strict) or union-merged onto the end of the header (tolerant), in which
//! case the file is rewritten through a sibling temp file and atomically
//! renamed so a crash mid-rewrite can never leave a half-written log.

use std::borrow::Cow;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::mem;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::debug;

use runlog_contracts::{
    LogError, LogWarning, Record, RecordKind, RecordSink, SinkKind, Value, WarningChannel,
    WarningHandler,
};

use crate::batch::MetricBatch;
use crate::sinks::text::create_parent_dirs;

/// Policy for keys first seen after the header is fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaPolicy {
    /// Unseen keys are silently dropped; the header never changes.
    Strict,
    /// Unseen keys extend the header; previous rows are padded in a
    /// crash-safe rewrite and a deduplicated drift warning is emitted.
    #[default]
    Tolerant,
}

/// Sink that writes one delimited row per dump.
///
/// Rows follow the established fieldname order; keys absent from a batch
/// render as empty cells. The file stays parseable by a standard
/// delimited-row reader after every expansion.
pub struct CsvSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    fieldnames: Vec<String>,
    policy: SchemaPolicy,
    key_filter: Option<Regex>,
    batch: MetricBatch,
    warnings: WarningChannel,
}

impl CsvSink {
    /// Open `path` fresh (truncating), creating parent directories.
    pub fn new(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        create_parent_dirs(&path)?;
        let file = File::create(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            fieldnames: Vec::new(),
            policy: SchemaPolicy::default(),
            key_filter: None,
            batch: MetricBatch::new(),
            warnings: WarningChannel::new(),
        })
    }

    pub fn with_policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_key_filter(mut self, filter: Regex) -> Self {
        self.key_filter = Some(filter);
        self
    }

    /// Route drift warnings to a caller-supplied observer instead of
    /// `tracing::warn!`.
    pub fn set_warning_handler(&mut self, handler: WarningHandler) {
        self.warnings.set_handler(handler);
    }

    /// The established column set, empty before the first non-empty dump.
    pub fn fieldnames(&self) -> &[String] {
        &self.fieldnames
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, LogError> {
        self.writer
            .as_mut()
            .ok_or_else(|| LogError::sink_write(SinkKind::Csv, "sink is closed"))
    }

    /// Extend the header with `unseen` keys and rewrite the file so earlier
    /// rows carry empty cells for the new columns.
    fn expand_fieldnames(&mut self, unseen: Vec<String>) -> Result<(), LogError> {
        let previous = self.fieldnames.clone();
        self.fieldnames.extend(unseen);

        // The handle must be released before the file is replaced underneath it.
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        rewrite_with_header(&self.path, &self.fieldnames)?;
        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.writer = Some(BufWriter::new(file));

        self.warnings.emit_once(LogWarning::SchemaDrift {
            previous,
            expanded: self.fieldnames.clone(),
        });
        Ok(())
    }
}

impl RecordSink for CsvSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Csv
    }

    fn accepted_kinds(&self) -> &[RecordKind] {
        &[RecordKind::Scalar]
    }

    fn key_filter(&self) -> Option<&Regex> {
        self.key_filter.as_ref()
    }

    fn record(&mut self, record: &Record, _prefix: &str) -> Result<(), LogError> {
        match record {
            Record::Scalar { key, value } => {
                self.batch.record(key.clone(), Value::Scalar(value.clone()));
                Ok(())
            }
            _ => Err(LogError::unsupported_type(self.kind(), record.kind())),
        }
    }

    fn dump(&mut self, _step: Option<u64>) -> Result<(), LogError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let row: Vec<(String, String)> = self
            .batch
            .scalar_entries()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if self.fieldnames.is_empty() {
            // First batch fixes the header, in first-seen key order.
            self.fieldnames = row.iter().map(|(k, _)| k.clone()).collect();
            let header = self.fieldnames.clone();
            let writer = self.writer()?;
            write_record(writer, header.iter().map(String::as_str))?;
        } else {
            let unseen: Vec<String> = row
                .iter()
                .filter(|(k, _)| !self.fieldnames.contains(k))
                .map(|(k, _)| k.clone())
                .collect();
            if !unseen.is_empty() && self.policy == SchemaPolicy::Tolerant {
                self.expand_fieldnames(unseen)?;
            }
        }

        let cells: Vec<&str> = self
            .fieldnames
            .iter()
            .map(|field| {
                row.iter()
                    .find(|(k, _)| k == field)
                    .map(|(_, v)| v.as_str())
                    .unwrap_or("")
            })
            .collect();
        let writer = self.writer()?;
        write_record(writer, cells.into_iter())?;
        writer.flush()?;

        self.batch.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), LogError> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            debug!(path = %self.path.display(), "CsvSink closed");
        }
        Ok(())
    }

    fn disable_warnings(&mut self) {
        self.warnings.disable();
    }
}

/// Rewrite `path` with `fieldnames` as the header, re-emitting every
/// existing data row keyed by the old header so new columns pad the tail.
/// Goes through a sibling temp file plus atomic rename.
fn rewrite_with_header(path: &Path, fieldnames: &[String]) -> io::Result<()> {
    let mut contents = String::new();
    File::open(path)?.read_to_string(&mut contents)?;
    let rows = parse_rows(&contents);
    let old_header = rows.first().cloned().unwrap_or_default();

    let tmp_path = tmp_path_for(path);
    {
        let mut tmp = BufWriter::new(File::create(&tmp_path)?);
        write_record(&mut tmp, fieldnames.iter().map(String::as_str))?;
        for row in rows.iter().skip(1) {
            let cells = fieldnames.iter().map(|field| {
                old_header
                    .iter()
                    .position(|f| f == field)
                    .and_then(|i| row.get(i))
                    .map(String::as_str)
                    .unwrap_or("")
            });
            write_record(&mut tmp, cells)?;
        }
        tmp.flush()?;
    }
    fs::rename(&tmp_path, path)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Quote a field per RFC 4180 when it contains a delimiter, quote, or
/// line break.
fn escape_field(raw: &str) -> Cow<'_, str> {
    if raw.contains(['"', ',', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", raw.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(raw)
    }
}

fn write_record<'a, W: Write>(
    out: &mut W,
    cells: impl Iterator<Item = &'a str>,
) -> io::Result<()> {
    let line = cells.map(escape_field).collect::<Vec<_>>().join(",");
    writeln!(out, "{line}")
}

/// Parse delimited rows, honoring RFC 4180 quoting (embedded delimiters,
/// doubled quotes, line breaks inside quoted fields).
fn parse_rows(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' => {
                    if chars.peek() == Some(&'"') {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                }
                _ => field.push(c),
            }
        } else {
            match c {
                '"' => in_quotes = true,
                ',' => row.push(mem::take(&mut field)),
                '\n' => {
                    row.push(mem::take(&mut field));
                    rows.push(mem::take(&mut row));
                }
                '\r' => {}
                _ => field.push(c),
            }
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
