//! Histogram payloads and the sampling capability.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A batch of samples to be histogram-logged as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Histogram {
    samples: Vec<f64>,
}

impl Histogram {
    pub fn new(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Capability for histogram-logging parametric distributions.
///
/// Any value that can draw N samples can be logged; the visualization sink
/// converts it to a histogram at dump time, so the backend never needs to
/// know the distribution family.
pub trait SampleSource {
    /// Draw `count` samples.
    fn draw(&self, count: usize) -> Vec<f64>;
}

/// Normal distribution sample source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
}

impl Gaussian {
    pub fn new(mean: f64, std_dev: f64) -> Self {
        Self { mean, std_dev }
    }
}

impl SampleSource for Gaussian {
    fn draw(&self, count: usize) -> Vec<f64> {
        let mut rng = rand::rng();
        (0..count)
            .map(|_| {
                // Box-Muller transform over two uniform draws.
                let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
                let u2: f64 = rng.random();
                let z = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
                self.mean + self.std_dev * z
            })
            .collect()
    }
}
