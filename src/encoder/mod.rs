//! Turning recorded frames into an animated image

mod gif_encoder;

use anyhow::Result;

use crate::env::RgbFrame;

pub use gif_encoder::{GifConfig, GifEncoder};

/// Encodes an ordered frame sequence into an animated image blob
pub trait FrameEncoder {
    /// Encode `frames` for playback at `fps` frames per second
    fn encode(&self, frames: &[RgbFrame], fps: u32) -> Result<Vec<u8>>;
}
