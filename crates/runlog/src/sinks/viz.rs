//! VizSink - time-series output through a pluggable visualization backend.

use std::path::Path;

use regex::Regex;

use runlog_contracts::{
    FigureData, LogError, LogWarning, Record, RecordKind, RecordSink, RichValue, SinkKind, Value,
    WarningChannel, WarningHandler,
};

use crate::batch::MetricBatch;
use crate::sinks::jsonl::JsonlBackend;

const DEFAULT_HISTOGRAM_SAMPLES: usize = 1000;

/// Wire contract of a visualization backend.
///
/// Backends receive scalar series, histogram sample batches, and figures,
/// each keyed by name and positioned on a numeric x-axis.
pub trait VizBackend {
    fn add_scalar(&mut self, key: &str, value: f64, step: f64) -> Result<(), LogError>;
    fn add_histogram(&mut self, key: &str, samples: &[f64], step: f64) -> Result<(), LogError>;
    fn add_figure(&mut self, key: &str, figure: &FigureData, step: f64) -> Result<(), LogError>;
    fn flush(&mut self) -> Result<(), LogError>;
    fn close(&mut self) -> Result<(), LogError>;
}

/// Sink that forwards batches to a [`VizBackend`].
///
/// Keeps a monotonically increasing step counter used as the x-axis when the
/// caller passes no step. With configured `x_axes`, each numeric non-axis
/// scalar is instead recorded as `"{axis}/{key}"` against every axis value
/// present in the batch; axes absent from a batch raise a non-fatal warning,
/// and if all of them are absent the sink falls back to the step counter.
pub struct VizSink {
    backend: Box<dyn VizBackend>,
    batch: MetricBatch,
    x_axes: Option<Vec<String>>,
    histogram_samples: usize,
    default_step: u64,
    key_filter: Option<Regex>,
    warnings: WarningChannel,
}

impl VizSink {
    pub fn new(backend: Box<dyn VizBackend>) -> Self {
        Self {
            backend,
            batch: MetricBatch::new(),
            x_axes: None,
            histogram_samples: DEFAULT_HISTOGRAM_SAMPLES,
            default_step: 0,
            key_filter: None,
            warnings: WarningChannel::new(),
        }
    }

    /// Convenience constructor for the bundled JSON-lines backend.
    pub fn jsonl(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self::new(Box::new(JsonlBackend::new(dir.as_ref())?)))
    }

    pub fn with_x_axes(mut self, axes: Vec<String>) -> Self {
        self.x_axes = Some(axes);
        self
    }

    pub fn with_histogram_samples(mut self, samples: usize) -> Self {
        self.histogram_samples = samples;
        self
    }

    pub fn with_key_filter(mut self, filter: Regex) -> Self {
        self.key_filter = Some(filter);
        self
    }

    /// Route missing-axis warnings to a caller-supplied observer.
    pub fn set_warning_handler(&mut self, handler: WarningHandler) {
        self.warnings.set_handler(handler);
    }
}

impl RecordSink for VizSink {
    fn kind(&self) -> SinkKind {
        SinkKind::Viz
    }

    fn accepted_kinds(&self) -> &[RecordKind] {
        &[RecordKind::Scalar, RecordKind::Rich]
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
            Record::Rich { key, value } => {
                self.batch.record(key.clone(), Value::Rich(value.clone()));
                Ok(())
            }
            Record::Text(_) => Err(LogError::unsupported_type(self.kind(), record.kind())),
        }
    }

    fn dump(&mut self, step: Option<u64>) -> Result<(), LogError> {
        if self.batch.is_empty() {
            return Ok(());
        }
        let step_x = step.unwrap_or(self.default_step) as f64;

        // Configured axes present in this batch as numeric scalars.
        let mut axis_values: Vec<(String, f64)> = Vec::new();
        let mut missing_axes: Vec<String> = Vec::new();
        if let Some(axes) = &self.x_axes {
            for axis in axes {
                match self.batch.get(axis).and_then(|v| match v {
                    Value::Scalar(s) => s.as_f64(),
                    Value::Rich(_) => None,
                }) {
                    Some(value) => axis_values.push((axis.clone(), value)),
                    None => missing_axes.push(axis.clone()),
                }
            }
        }

        let entries: Vec<(String, Value)> = self
            .batch
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        for (key, value) in &entries {
            match value {
                Value::Scalar(scalar) => {
                    let Some(value) = scalar.as_f64() else {
                        // Text is not plottable.
                        continue;
                    };
                    if axis_values.is_empty() {
                        self.backend.add_scalar(key, value, step_x)?;
                    } else {
                        for (axis, x) in &axis_values {
                            if key != axis {
                                self.backend
                                    .add_scalar(&format!("{axis}/{key}"), value, *x)?;
                            }
                        }
                    }
                }
                Value::Rich(RichValue::Histogram(hist)) => {
                    self.backend.add_histogram(key, hist.samples(), step_x)?;
                }
                Value::Rich(RichValue::Distribution(dist)) => {
                    let samples = dist.draw(self.histogram_samples);
                    self.backend.add_histogram(key, &samples, step_x)?;
                }
                Value::Rich(RichValue::Figure(figure)) => {
                    self.backend.add_figure(key, figure, step_x)?;
                }
            }
        }

        if !missing_axes.is_empty() {
            self.warnings
                .emit(LogWarning::AxisNotFound { axes: missing_axes });
        }

        self.batch.clear();
        self.backend.flush()?;
        self.default_step += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LogError> {
        self.backend.close()
    }

    fn disable_warnings(&mut self) {
        self.warnings.disable();
    }
}
