//! Frame representation handed to the detector collaborators.
//!
//! - `Frame`: 8-bit luma plane with dimensions. Decoding is done upstream.
//! - `sample_indices`: uniform frame sampling for temporal analysis.
//! - `FrameMetadata`: per-sample metadata merged into fused results.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Default number of frames sampled from a clip for temporal analysis.
pub const DEFAULT_SAMPLE_FRAMES: usize = 16;

/// Single-channel 8-bit frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    luma: Vec<u8>,
}

impl Frame {
    pub fn new(width: u32, height: u32, luma: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(anyhow!("frame dimensions must be non-zero"));
        }
        let expected = width as usize * height as usize;
        if luma.len() != expected {
            return Err(anyhow!(
                "frame buffer length {} does not match {}x{}",
                luma.len(),
                width,
                height
            ));
        }
        Ok(Self {
            width,
            height,
            luma,
        })
    }

    /// Uniform frame filled with a single luma value.
    pub fn solid(width: u32, height: u32, value: u8) -> Result<Self> {
        Self::new(width, height, vec![value; width as usize * height as usize])
    }

    /// Build a frame from a per-pixel function of `(x, y)`.
    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> Result<Self> {
        let mut luma = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                luma.push(f(x, y));
            }
        }
        Self::new(width, height, luma)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }

    fn at(&self, x: u32, y: u32) -> u8 {
        self.luma[y as usize * self.width as usize + x as usize]
    }

    /// Mean absolute per-pixel difference against another frame of the same size.
    pub fn mean_abs_diff(&self, other: &Frame) -> Result<f64> {
        if self.width != other.width || self.height != other.height {
            return Err(anyhow!(
                "frame size mismatch: {} vs {}",
                self.resolution(),
                other.resolution()
            ));
        }
        let total: u64 = self
            .luma
            .iter()
            .zip(&other.luma)
            .map(|(a, b)| u64::from(a.abs_diff(*b)))
            .sum();
        Ok(total as f64 / self.luma.len() as f64)
    }

    /// Mean luma normalized to `[0, 1]`.
    pub fn brightness(&self) -> f64 {
        let sum: u64 = self.luma.iter().map(|&v| u64::from(v)).sum();
        sum as f64 / self.luma.len() as f64 / 255.0
    }

    /// Standard deviation of luma normalized to `[0, 1]`.
    pub fn contrast(&self) -> f64 {
        let n = self.luma.len() as f64;
        let mean = self.luma.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let var = self
            .luma
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / n;
        var.sqrt() / 255.0
    }

    /// Fraction of interior pixels whose forward-difference gradient exceeds `threshold`.
    pub fn edge_density(&self, threshold: u16) -> f64 {
        if self.width < 2 || self.height < 2 {
            return 0.0;
        }
        let mut edges = 0u64;
        let mut total = 0u64;
        for y in 0..self.height - 1 {
            for x in 0..self.width - 1 {
                let p = self.at(x, y);
                let dx = u16::from(p.abs_diff(self.at(x + 1, y)));
                let dy = u16::from(p.abs_diff(self.at(x, y + 1)));
                if dx + dy > threshold {
                    edges += 1;
                }
                total += 1;
            }
        }
        edges as f64 / total as f64
    }
}

/// Pick up to `max` frame indices spread uniformly over `total` frames.
///
/// Short clips (`total <= max`) return every index.
pub fn sample_indices(total: usize, max: usize) -> Vec<usize> {
    if total <= max {
        return (0..total).collect();
    }
    if max == 0 {
        return Vec::new();
    }
    if max == 1 {
        return vec![0];
    }
    (0..max)
        .map(|i| i * (total - 1) / (max - 1))
        .collect()
}

/// Kind of media a sample came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Video,
    Image,
}

/// Per-sample metadata merged verbatim into fused result metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameMetadata {
    pub frame_count: usize,
    /// `"WxH"` or `"unknown"`.
    pub resolution: String,
    pub file_type: FileKind,
}

impl FrameMetadata {
    pub fn describe(frames: &[Frame], kind: FileKind) -> Self {
        Self {
            frame_count: frames.len(),
            resolution: frames
                .first()
                .map(Frame::resolution)
                .unwrap_or_else(|| "unknown".to_string()),
            file_type: kind,
        }
    }
}
