//! Animated GIF encoding of episode frames
//!
//! Frames are written to a scoped temporary file and read back into memory.
//! The file is removed on every exit path, including encoder failures.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use gif::{Encoder, Frame, Repeat};
use serde::{Deserialize, Serialize};

use super::FrameEncoder;
use crate::env::RgbFrame;
use crate::error::RecordError;

/// GIF output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GifConfig {
    /// NeuQuant sampling factor, 1 (best quality) to 30 (fastest)
    pub quantization_speed: i32,
    /// Loop the animation forever
    pub repeat: bool,
    /// Directory for the scratch file; the system temp directory when unset
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            quantization_speed: 10,
            repeat: true,
            scratch_dir: None,
        }
    }
}

/// [`FrameEncoder`] producing animated GIFs
#[derive(Debug, Clone, Default)]
pub struct GifEncoder {
    config: GifConfig,
}

impl GifEncoder {
    pub fn new(config: GifConfig) -> Self {
        Self { config }
    }

    /// Delay between frames in centiseconds (100ths of a second)
    pub fn frame_delay(fps: u32) -> u16 {
        if fps == 0 {
            return 10;
        }
        (100.0 / fps as f64).round().clamp(1.0, u16::MAX as f64) as u16
    }

    fn dimensions(frames: &[RgbFrame]) -> Result<(u16, u16)> {
        let first = frames.first().ok_or(RecordError::EmptyEpisode)?;
        let (height, width) = first.shape();

        if let Some((idx, frame)) = frames
            .iter()
            .enumerate()
            .find(|(_, f)| f.shape() != (height, width))
        {
            return Err(RecordError::InvalidFrame(format!(
                "frame {idx} is {}x{}, expected {height}x{width}",
                frame.height(),
                frame.width()
            ))
            .into());
        }

        let to_u16 = |v: usize| {
            u16::try_from(v).map_err(|_| {
                RecordError::InvalidFrame(format!(
                    "{height}x{width} exceeds the GIF size limit of {}",
                    u16::MAX
                ))
            })
        };
        Ok((to_u16(width)?, to_u16(height)?))
    }

    fn write_frames<W: Write>(&self, out: W, frames: &[RgbFrame], fps: u32) -> Result<()> {
        let (width, height) = Self::dimensions(frames)?;
        let speed = self.config.quantization_speed.clamp(1, 30);
        let delay = Self::frame_delay(fps);

        let mut encoder =
            Encoder::new(out, width, height, &[]).context("Failed to create GIF encoder")?;
        let repeat = if self.config.repeat {
            Repeat::Infinite
        } else {
            Repeat::Finite(0)
        };
        encoder
            .set_repeat(repeat)
            .context("Failed to set GIF repeat")?;

        for frame_data in frames {
            let mut frame = Frame::from_rgb_speed(width, height, frame_data.data(), speed);
            frame.delay = delay;

            encoder
                .write_frame(&frame)
                .context("Failed to write GIF frame")?;
        }

        encoder
            .into_inner()
            .context("Failed to finish GIF stream")?
            .flush()
            .context("Failed to flush GIF stream")?;
        Ok(())
    }
}

impl FrameEncoder for GifEncoder {
    fn encode(&self, frames: &[RgbFrame], fps: u32) -> Result<Vec<u8>> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gymboard-").suffix(".gif");
        let mut scratch = match &self.config.scratch_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .context("Failed to create temporary GIF file")?;

        // `scratch` deletes the file when dropped, so an early return cleans up too
        self.write_frames(scratch.as_file_mut(), frames, fps)?;
        let bytes = fs::read(scratch.path()).context("Failed to read back GIF file")?;
        scratch
            .close()
            .context("Failed to remove temporary GIF file")?;

        log::debug!(
            "encoded {} frames at {} fps into {} bytes",
            frames.len(),
            fps,
            bytes.len()
        );
        Ok(bytes)
    }
}
