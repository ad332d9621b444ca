//! Episode recorder: drives an environment, encodes the episode and logs it
//!
//! ```no_run
//! use gymboard::{ClipOptions, EpisodeRecorder, RecorderConfig, ScriptedEnv};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut recorder = EpisodeRecorder::new(&RecorderConfig::default())?;
//! recorder.write_scalar("reward", 12.0, None)?;
//!
//! let mut env = ScriptedEnv::new("CartPole-v1", vec![1.0, 0.0, 2.0])?;
//! recorder.write_env(&mut env, None, ClipOptions::default())?;
//! recorder.display();
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::RecorderConfig;
use crate::dashboard::{self, DashboardCommand, DashboardProcess, HostContext};
use crate::encoder::{FrameEncoder, GifEncoder};
use crate::env::Environment;
use crate::episode::{effective_fps, rollout, DEFAULT_FPS};
use crate::error::RecordError;
use crate::metrics::{EventFileWriter, ImageSummary, MetricsLog, COLORSPACE_RGB};
use crate::policy::Policy;
use crate::session::Session;

/// Per-call settings for [`EpisodeRecorder::write_env`]
#[derive(Debug, Clone, PartialEq)]
pub struct ClipOptions {
    /// Step to log at; the session's current step when unset
    pub step: Option<u64>,
    /// Playback rate before `speed` is applied; environment metadata when unset
    pub fps: Option<f64>,
    /// Playback speed multiplier
    pub speed: f64,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            step: None,
            fps: None,
            speed: 1.0,
        }
    }
}

impl ClipOptions {
    pub fn at_step(mut self, step: u64) -> Self {
        self.step = Some(step);
        self
    }

    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}

/// What a `write_env` call put into the log
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSummary {
    pub tag: String,
    pub step: u64,
    pub fps: u32,
    pub frame_count: usize,
    pub total_reward: f64,
    /// Steps played with a random action instead of the policy's choice
    pub fallback_steps: usize,
    /// The episode hit the step limit before terminating
    pub truncated: bool,
    pub encoded_bytes: usize,
}

/// Tag under which a clip is logged: `"{env_id}/ Rewards: {total_reward}"`
pub fn clip_tag(env_id: &str, total_reward: f64) -> String {
    format!("{env_id}/ Rewards: {total_reward}")
}

/// Remove `logdir` and everything below it
///
/// A missing directory is fine; any other failure is logged and ignored.
pub fn clean_logdir(logdir: &Path) {
    match fs::remove_dir_all(logdir) {
        Ok(()) => log::info!("removed {}", logdir.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} does not exist, nothing to clean", logdir.display())
        }
        Err(e) => log::warn!("Failed to remove {}: {}", logdir.display(), e),
    }
}

/// Closes the borrowed environment once recording ends, unwinding included
struct CloseOnDrop<'a, E: Environment + ?Sized> {
    env: &'a mut E,
    closed: bool,
}

impl<'a, E: Environment + ?Sized> CloseOnDrop<'a, E> {
    fn new(env: &'a mut E) -> Self {
        Self { env, closed: false }
    }

    fn close(mut self) -> Result<()> {
        self.closed = true;
        self.env
            .close()
            .with_context(|| format!("Failed to close {}", self.env.id()))
    }
}

impl<E: Environment + ?Sized> Drop for CloseOnDrop<'_, E> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.env.close() {
            log::warn!("Failed to close {} after an aborted recording: {e:#}", self.env.id());
        }
    }
}

/// Records scalars and episode clips into one run of a metrics log
pub struct EpisodeRecorder<L = EventFileWriter, C = GifEncoder> {
    session: Session,
    log: L,
    encoder: C,
    rng: StdRng,
    host: HostContext,
    dashboard: DashboardProcess,
    max_episode_steps: usize,
    default_fps: f64,
}

impl EpisodeRecorder {
    /// Open a new run below `config.logdir`, writing a TensorBoard event file
    pub fn new(config: &RecorderConfig) -> Result<Self> {
        let session = Session::new(&config.logdir, config.port);
        let log = EventFileWriter::create(session.run_dir())?;
        log::info!("recording run {}", session.run_dir().display());

        let encoder = GifEncoder::new(config.gif.clone());
        Ok(Self::with_parts(session, log, encoder).configured(config))
    }

    /// [`new`](Self::new) with default settings apart from location and port
    pub fn open(logdir: impl Into<PathBuf>, port: u16) -> Result<Self> {
        Self::new(&RecorderConfig {
            logdir: logdir.into(),
            port,
            ..RecorderConfig::default()
        })
    }
}

impl<L: MetricsLog, C: FrameEncoder> EpisodeRecorder<L, C> {
    /// Assemble a recorder from an existing session, log and encoder
    pub fn with_parts(session: Session, log: L, encoder: C) -> Self {
        Self {
            session,
            log,
            encoder,
            rng: StdRng::from_entropy(),
            host: HostContext::default(),
            dashboard: DashboardProcess::default(),
            max_episode_steps: RecorderConfig::default().max_episode_steps,
            default_fps: DEFAULT_FPS,
        }
    }

    /// Apply host, step limit, default rate and seed from `config`
    pub fn configured(mut self, config: &RecorderConfig) -> Self {
        self.host = config.host;
        self.max_episode_steps = config.max_episode_steps;
        self.default_fps = config.default_fps;
        if let Some(seed) = config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        self
    }

    /// Seed the generator used for random actions
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_host(mut self, host: HostContext) -> Self {
        self.host = host;
        self
    }

    pub fn with_max_episode_steps(mut self, max_steps: usize) -> Self {
        self.max_episode_steps = max_steps;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn encoder(&self) -> &C {
        &self.encoder
    }

    /// Log a scalar and flush it
    ///
    /// Without `step` the session counter is used and advanced; with `step`
    /// the counter is set to it. Returns the step written.
    pub fn write_scalar(&mut self, label: &str, score: f64, step: Option<u64>) -> Result<u64> {
        if label.is_empty() {
            return Err(RecordError::EmptyLabel.into());
        }

        let step = self.session.scalar_step(step)?;
        self.log.write_scalar(label, score, step)?;
        self.log.flush()?;

        log::debug!("scalar {label}={score} at step {step}");
        Ok(step)
    }

    /// Record one episode of `env` as an animated clip
    ///
    /// Actions come from `policy` greedily, or at random when there is no
    /// policy or it cannot be used. Without an explicit step the clip is
    /// logged at the session's current step, which is not advanced. The
    /// environment is closed before returning, whether recording succeeded
    /// or not.
    pub fn write_env<E>(
        &mut self,
        env: &mut E,
        policy: Option<&mut dyn Policy<E::State>>,
        options: ClipOptions,
    ) -> Result<ClipSummary>
    where
        E: Environment + ?Sized,
    {
        let mut guard = CloseOnDrop::new(env);
        let recorded = self.record_episode(&mut *guard.env, policy, &options);
        let closed = guard.close();

        let summary = recorded?;
        closed?;
        Ok(summary)
    }

    fn record_episode<E>(
        &mut self,
        env: &mut E,
        policy: Option<&mut dyn Policy<E::State>>,
        options: &ClipOptions,
    ) -> Result<ClipSummary>
    where
        E: Environment + ?Sized,
    {
        let step = self.session.clip_step(options.step)?;
        let trace = rollout(env, policy, &mut self.rng, self.max_episode_steps)?;
        let fps = effective_fps(
            options.fps,
            env.metadata(),
            self.default_fps,
            options.speed,
        )?;

        // Extra render only for the image header dimensions
        let header = env
            .render()
            .with_context(|| format!("Failed to render {}", env.id()))?;
        let encoded = self
            .encoder
            .encode(&trace.frames, fps)
            .with_context(|| format!("Failed to encode {} frames", trace.len()))?;

        let total_reward = trace.total_reward();
        let tag = clip_tag(env.id(), total_reward);
        let encoded_bytes = encoded.len();
        let image = ImageSummary {
            height: dimension(header.height())?,
            width: dimension(header.width())?,
            colorspace: COLORSPACE_RGB,
            encoded,
        };

        self.log.write_image(&tag, &image, step)?;
        self.log.flush()?;

        log::info!(
            "logged {} frames of {} at {} fps, step {}",
            trace.len(),
            tag,
            fps,
            step
        );

        Ok(ClipSummary {
            tag,
            step,
            fps,
            frame_count: trace.len(),
            total_reward,
            fallback_steps: trace.fallback_steps,
            truncated: trace.truncated,
            encoded_bytes,
        })
    }

    /// Dashboard command for this session's log directory
    pub fn dashboard_command(&self) -> DashboardCommand {
        DashboardCommand::new(self.session.logdir(), self.session.port())
    }

    /// Show the dashboard inline or print how to start it
    ///
    /// In a notebook host the dashboard is started once and reused by later
    /// calls while it keeps running.
    pub fn display(&mut self) {
        let command = self.dashboard_command();
        dashboard::display(&command, self.host, &mut self.dashboard);
    }

    /// Delete the whole log directory, including other runs
    pub fn clean(&self) {
        clean_logdir(self.session.logdir());
    }
}

fn dimension(value: usize) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| anyhow::Error::from(RecordError::InvalidFrame(format!("dimension {value} too large"))))
}
