//! Recorder configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `gymboard.ron` file (if exists)
//! 3. Environment variables prefixed with `GYMBOARD_`
//!
//! Example environment variable: `GYMBOARD_GIF__QUANTIZATION_SPEED=20`

use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::dashboard::HostContext;
use crate::encoder::GifConfig;
use crate::episode::DEFAULT_FPS;

/// Everything needed to open an [`EpisodeRecorder`](crate::EpisodeRecorder)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderConfig {
    /// Directory holding one subdirectory per run
    pub logdir: PathBuf,
    /// Port the dashboard binds to
    pub port: u16,
    /// How `display` presents the dashboard
    #[serde(default)]
    pub host: HostContext,
    /// Episodes are truncated after this many steps
    pub max_episode_steps: usize,
    /// Playback rate when neither the caller nor the environment gives one
    pub default_fps: f64,
    /// Seed for random fallback actions (entropy when unset)
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub gif: GifConfig,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            logdir: PathBuf::from("logs/"),
            port: 6006,
            host: HostContext::Terminal,
            max_episode_steps: 10_000,
            default_fps: DEFAULT_FPS,
            seed: None,
            gif: GifConfig::default(),
        }
    }
}

impl RecorderConfig {
    /// Load configuration from `gymboard.ron` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from("gymboard")
    }

    /// Load with an explicit config file stem (the `.ron` extension is implied)
    pub fn load_from(file_stem: &str) -> Result<Self> {
        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .set_default("logdir", "logs/")?
            .set_default("port", 6006_i64)?
            .set_default("host", "terminal")?
            .set_default("max_episode_steps", 10_000_i64)?
            .set_default("default_fps", DEFAULT_FPS)?
            .set_default("gif.quantization_speed", 10_i64)?
            .set_default("gif.repeat", true)?
            // Layer 2: Config file (optional, won't error if missing)
            .add_source(
                File::with_name(file_stem)
                    .format(config::FileFormat::Ron)
                    .required(false),
            )
            // Layer 3: Environment variables (GYMBOARD_PORT, GYMBOARD_GIF__REPEAT, etc.)
            .add_source(
                Environment::with_prefix("GYMBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
