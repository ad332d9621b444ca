//! RGB frame buffers produced by environment rendering

use anyhow::Result;

use crate::error::RecordError;

/// A height x width x 3 byte image in row-major order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    height: usize,
    width: usize,
    data: Vec<u8>,
}

impl RgbFrame {
    /// Wrap a raw RGB buffer, checking that its length matches the dimensions
    pub fn new(height: usize, width: usize, data: Vec<u8>) -> Result<Self> {
        if height == 0 || width == 0 {
            return Err(RecordError::InvalidFrame(format!(
                "frame dimensions must be non-zero, got {height}x{width}"
            ))
            .into());
        }
        let expected = height * width * 3;
        if data.len() != expected {
            return Err(RecordError::InvalidFrame(format!(
                "expected {expected} bytes for {height}x{width} RGB, got {}",
                data.len()
            ))
            .into());
        }
        Ok(Self {
            height,
            width,
            data,
        })
    }

    /// Frame filled with a single color
    pub fn solid(height: usize, width: usize, rgb: [u8; 3]) -> Result<Self> {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(height * width * 3)
            .collect();
        Self::new(height, width, data)
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// (height, width)
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
