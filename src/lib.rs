//! # gymboard - reinforcement-learning episodes in TensorBoard
//!
//! Plays one episode of an environment, encodes the rendered frames as an
//! animated GIF and logs it next to scalar metrics in a TensorBoard run.

pub mod config;
pub mod dashboard;
pub mod encoder;
pub mod env;
pub mod episode;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod recorder;
pub mod session;

pub use config::RecorderConfig;
pub use dashboard::{DashboardCommand, DashboardProcess, HostContext};
pub use encoder::{FrameEncoder, GifConfig, GifEncoder};
pub use env::{DiscreteSpace, EnvMetadata, Environment, RgbFrame, ScriptedEnv, Transition};
pub use episode::{EpisodeTrace, DEFAULT_FPS};
pub use error::RecordError;
pub use metrics::{EventFileWriter, ImageSummary, MetricsLog};
pub use policy::{ActionChoice, FallbackReason, Policy};
pub use recorder::{clean_logdir, clip_tag, ClipOptions, ClipSummary, EpisodeRecorder};
pub use session::Session;
