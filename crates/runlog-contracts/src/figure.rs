//! Figure payloads - raw pixel buffers handed to visualization backends.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Pixel layout of a figure buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FigureFormat {
    Rgb8,
    Rgba8,
}

impl FigureFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FigureFormat::Rgb8 => 3,
            FigureFormat::Rgba8 => 4,
        }
    }
}

/// A rendered figure as raw pixels.
///
/// Backends decide how to persist it (the bundled JSON-lines backend encodes
/// PNG files). The buffer is zero-copy shareable across sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureData {
    pub width: u32,
    pub height: u32,
    pub format: FigureFormat,
    pub data: Bytes,
}

impl FigureData {
    pub fn rgb8(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            format: FigureFormat::Rgb8,
            data: data.into(),
        }
    }

    pub fn rgba8(width: u32, height: u32, data: impl Into<Bytes>) -> Self {
        Self {
            width,
            height,
            format: FigureFormat::Rgba8,
            data: data.into(),
        }
    }
}
