//! Environment contract driven by the episode recorder
//!
//! The recorder never simulates anything itself: callers hand it a type that
//! implements [`Environment`] and the recorder only resets, steps, renders and
//! closes it. [`ScriptedEnv`] is a replay environment for tests and demos.

mod frame;
mod metadata;
mod scripted;
mod space;

use anyhow::Result;

pub use frame::RgbFrame;
pub use metadata::{EnvMetadata, MetadataValue, FPS_KEYS};
pub use scripted::ScriptedEnv;
pub use space::DiscreteSpace;

/// Outcome of a single environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    /// State observed after the action
    pub state: S,
    /// Reward for the transition
    pub reward: f64,
    /// Episode has terminated
    pub done: bool,
}

impl<S> Transition<S> {
    pub fn new(state: S, reward: f64, done: bool) -> Self {
        Self {
            state,
            reward,
            done,
        }
    }
}

/// A stateful simulator that can be recorded one episode at a time
pub trait Environment {
    /// Observation type handed to policies
    type State;

    /// Registered identifier of the environment (e.g. `CartPole-v1`)
    fn id(&self) -> &str;

    /// Static metadata such as the preferred playback frame rate
    fn metadata(&self) -> &EnvMetadata;

    /// Discrete action space used for random fallback actions
    fn action_space(&self) -> &DiscreteSpace;

    /// Start a new episode and return its initial state
    fn reset(&mut self) -> Result<Self::State>;

    /// Apply an action and advance the simulation by one step
    fn step(&mut self, action: usize) -> Result<Transition<Self::State>>;

    /// Render the current state as an RGB image
    fn render(&mut self) -> Result<RgbFrame>;

    /// Release any resources held by the environment
    fn close(&mut self) -> Result<()>;
}
