//! Replay environment driven by a fixed reward script
//!
//! Renders solid frames whose color encodes the step index, and keeps a log
//! of every interaction so callers can check exactly how it was driven.

use anyhow::{bail, Result};

use super::{DiscreteSpace, EnvMetadata, Environment, RgbFrame, Transition};

/// Environment that plays back a reward sequence
#[derive(Debug, Clone)]
pub struct ScriptedEnv {
    id: String,
    rewards: Vec<f64>,
    metadata: EnvMetadata,
    action_space: DiscreteSpace,
    height: usize,
    width: usize,
    /// Keep emitting rewards without ever terminating
    endless: bool,
    /// Renders allowed before `render` starts failing
    render_budget: Option<usize>,
    cursor: usize,
    /// Actions received by `step`, across all episodes
    pub actions: Vec<usize>,
    pub reset_count: usize,
    pub render_count: usize,
    pub close_count: usize,
}

impl ScriptedEnv {
    /// One episode per reset, one step per reward
    pub fn new(id: impl Into<String>, rewards: Vec<f64>) -> Result<Self> {
        if rewards.is_empty() {
            bail!("scripted environment needs at least one reward");
        }
        Ok(Self {
            id: id.into(),
            rewards,
            metadata: EnvMetadata::new(),
            action_space: DiscreteSpace::new(2)?,
            height: 16,
            width: 16,
            endless: false,
            render_budget: None,
            cursor: 0,
            actions: Vec::new(),
            reset_count: 0,
            render_count: 0,
            close_count: 0,
        })
    }

    pub fn with_metadata(mut self, metadata: EnvMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_actions(mut self, n: usize) -> Result<Self> {
        self.action_space = DiscreteSpace::new(n)?;
        Ok(self)
    }

    pub fn with_frame_size(mut self, height: usize, width: usize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    /// Never report termination; rewards repeat cyclically
    pub fn endless(mut self) -> Self {
        self.endless = true;
        self
    }

    /// Make `render` fail once `renders` frames have been produced
    pub fn failing_render_after(mut self, renders: usize) -> Self {
        self.render_budget = Some(renders);
        self
    }

    /// Steps taken in the current episode
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn color_for(step: usize) -> [u8; 3] {
        let shade = (step * 37 % 256) as u8;
        [shade, 255 - shade, 128]
    }
}

impl Environment for ScriptedEnv {
    type State = usize;

    fn id(&self) -> &str {
        &self.id
    }

    fn metadata(&self) -> &EnvMetadata {
        &self.metadata
    }

    fn action_space(&self) -> &DiscreteSpace {
        &self.action_space
    }

    fn reset(&mut self) -> Result<usize> {
        self.reset_count += 1;
        self.cursor = 0;
        Ok(0)
    }

    fn step(&mut self, action: usize) -> Result<Transition<usize>> {
        if !self.action_space.contains(action) {
            bail!(
                "action {action} outside action space of size {}",
                self.action_space.n()
            );
        }
        if !self.endless && self.cursor >= self.rewards.len() {
            bail!("step called after the episode finished");
        }

        self.actions.push(action);
        let reward = self.rewards[self.cursor % self.rewards.len()];
        self.cursor += 1;
        let done = !self.endless && self.cursor == self.rewards.len();
        Ok(Transition::new(self.cursor, reward, done))
    }

    fn render(&mut self) -> Result<RgbFrame> {
        if let Some(budget) = self.render_budget {
            if self.render_count >= budget {
                bail!("render failed after {budget} frames");
            }
        }
        self.render_count += 1;
        RgbFrame::solid(self.height, self.width, Self::color_for(self.cursor))
    }

    fn close(&mut self) -> Result<()> {
        self.close_count += 1;
        Ok(())
    }
}
