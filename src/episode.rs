//! Single-episode rollout and playback rate resolution

use anyhow::{Context, Result};
use rand::Rng;

use crate::env::{EnvMetadata, Environment, RgbFrame};
use crate::error::RecordError;
use crate::policy::{choose_action, ActionChoice, FallbackReason, Policy};

/// Frame rate used when neither an override nor metadata provides one
pub const DEFAULT_FPS: f64 = 24.0;

/// Frames and rewards collected from one episode
#[derive(Debug, Clone, Default)]
pub struct EpisodeTrace {
    /// One frame per step, rendered before the action was applied
    pub frames: Vec<RgbFrame>,
    /// One reward per step
    pub rewards: Vec<f64>,
    /// Steps whose action was sampled because the policy could not be used
    pub fallback_steps: usize,
    /// The step guard stopped the episode before it terminated
    pub truncated: bool,
}

impl EpisodeTrace {
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn total_reward(&self) -> f64 {
        self.rewards.iter().sum()
    }
}

/// Run `env` from reset to termination, collecting a frame and reward per step
///
/// At most `max_steps` steps are taken; a longer episode is cut off and
/// marked as truncated.
pub fn rollout<E, R>(
    env: &mut E,
    mut policy: Option<&mut dyn Policy<E::State>>,
    rng: &mut R,
    max_steps: usize,
) -> Result<EpisodeTrace>
where
    E: Environment + ?Sized,
    R: Rng + ?Sized,
{
    let mut state = env
        .reset()
        .with_context(|| format!("Failed to reset {}", env.id()))?;
    let mut trace = EpisodeTrace::default();
    let mut warned = false;

    loop {
        if trace.len() >= max_steps {
            log::warn!(
                "{}: episode reached the {} step limit, truncating",
                env.id(),
                max_steps
            );
            trace.truncated = true;
            break;
        }

        let frame = env
            .render()
            .with_context(|| format!("Failed to render {}", env.id()))?;
        trace.frames.push(frame);

        let space = *env.action_space();
        let choice = choose_action(policy.as_deref_mut(), &state, &space, rng);
        if let ActionChoice::Fallback { action, reason } = &choice {
            trace.fallback_steps += 1;
            match reason {
                FallbackReason::NoPolicy => {}
                _ if !warned => {
                    log::warn!(
                        "{}: policy unusable at step {} ({:?}), playing random action {}",
                        env.id(),
                        trace.rewards.len(),
                        reason,
                        action
                    );
                    warned = true;
                }
                _ => log::debug!("policy fallback: {:?}", reason),
            }
        }

        let transition = env
            .step(choice.action())
            .with_context(|| format!("Failed to step {}", env.id()))?;
        log::debug!(
            "step {}: action={} reward={} done={}",
            trace.rewards.len(),
            choice.action(),
            transition.reward,
            transition.done
        );
        trace.rewards.push(transition.reward);
        state = transition.state;

        if transition.done {
            break;
        }
    }

    if trace.is_empty() {
        return Err(RecordError::EmptyEpisode.into());
    }
    Ok(trace)
}

/// Effective playback rate: `round(source * speed)`
///
/// The source is `fps` when given, otherwise the metadata rate, otherwise
/// `default_fps`.
pub fn effective_fps(
    fps: Option<f64>,
    metadata: &EnvMetadata,
    default_fps: f64,
    speed: f64,
) -> Result<u32> {
    if !speed.is_finite() || speed <= 0.0 {
        return Err(RecordError::InvalidFrameRate(format!(
            "speed must be positive, got {speed}"
        ))
        .into());
    }

    let source = fps
        .or_else(|| metadata.frames_per_second())
        .unwrap_or(default_fps);
    let scaled = (source * speed).round();
    if !scaled.is_finite() || scaled < 1.0 || scaled > u32::MAX as f64 {
        return Err(RecordError::InvalidFrameRate(format!(
            "{source} fps at speed {speed} gives {scaled}"
        ))
        .into());
    }
    Ok(scaled as u32)
}
