//! JsonlBackend - JSON-lines visualization backend.
//!
//! Appends one tagged event per line to `events.jsonl` under the backend
//! directory, in append-only form so a crash never corrupts earlier events
//! and watchers can stream the file. Figures are PNG-encoded next to it.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use runlog_contracts::{FigureData, FigureFormat, LogError, SinkKind};

use crate::sinks::viz::VizBackend;

/// Event types for the JSON-lines format.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum VizEvent<'a> {
    Scalar {
        step: f64,
        name: &'a str,
        value: f64,
    },
    Histogram {
        step: f64,
        name: &'a str,
        samples: &'a [f64],
    },
    Figure {
        step: f64,
        name: &'a str,
        path: &'a str,
    },
}

/// Backend writing tagged events to `<dir>/events.jsonl` and figures to
/// `<dir>/figures/<name>_<step>.png`.
pub struct JsonlBackend {
    dir: PathBuf,
    events: BufWriter<File>,
}

impl JsonlBackend {
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("events.jsonl"))?;
        Ok(Self {
            dir,
            events: BufWriter::new(file),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write_event(&mut self, event: &VizEvent<'_>) -> Result<(), LogError> {
        serde_json::to_writer(&mut self.events, event)
            .map_err(|e| LogError::sink_write(SinkKind::Viz, e.to_string()))?;
        self.events.write_all(b"\n")?;
        Ok(())
    }
}

impl VizBackend for JsonlBackend {
    fn add_scalar(&mut self, key: &str, value: f64, step: f64) -> Result<(), LogError> {
        self.write_event(&VizEvent::Scalar {
            step,
            name: key,
            value,
        })
    }

    fn add_histogram(&mut self, key: &str, samples: &[f64], step: f64) -> Result<(), LogError> {
        self.write_event(&VizEvent::Histogram {
            step,
            name: key,
            samples,
        })
    }

    fn add_figure(&mut self, key: &str, figure: &FigureData, step: f64) -> Result<(), LogError> {
        let figures_dir = self.dir.join("figures");
        fs::create_dir_all(&figures_dir)?;
        let file_name = format!("{}_{step}.png", sanitize_key(key));
        let path = figures_dir.join(file_name);

        let color = match figure.format {
            FigureFormat::Rgb8 => image::ColorType::Rgb8,
            FigureFormat::Rgba8 => image::ColorType::Rgba8,
        };
        image::save_buffer(&path, &figure.data, figure.width, figure.height, color)
            .map_err(|e| LogError::sink_write(SinkKind::Viz, e.to_string()))?;

        let path = path.display().to_string();
        self.write_event(&VizEvent::Figure {
            step,
            name: key,
            path: &path,
        })
    }

    fn flush(&mut self) -> Result<(), LogError> {
        self.events.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), LogError> {
        self.events.flush()?;
        debug!(dir = %self.dir.display(), "JsonlBackend closed");
        Ok(())
    }
}

/// Metric keys may contain separators ("train/loss"); keep figure file
/// names flat.
fn sanitize_key(key: &str) -> String {
    key.replace(['/', '\\'], "_")
}
