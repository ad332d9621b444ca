//! Greedy action selection with an explicit random fallback
//!
//! A policy maps a state to a batch of per-action scores. The recorder feeds
//! it a batch of one and plays the highest-scoring action. Whenever that is
//! not possible the action is drawn from the action space instead, and the
//! reason is reported through [`ActionChoice`] rather than swallowed.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use rand::Rng;

use crate::env::DiscreteSpace;

/// Maps a state to a batch of per-action scores
pub trait Policy<S> {
    /// Scores for a batch of one state; entry 0 is used
    fn scores(&mut self, state: &S) -> Result<Vec<Vec<f32>>>;
}

impl<S, F> Policy<S> for F
where
    F: FnMut(&S) -> Result<Vec<Vec<f32>>>,
{
    fn scores(&mut self, state: &S) -> Result<Vec<Vec<f32>>> {
        self(state)
    }
}

/// Why a random action was played instead of the greedy one
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// No policy was supplied
    NoPolicy,
    /// The policy returned an error or panicked
    PolicyFailed(String),
    /// The policy returned an empty batch or an empty score vector
    EmptyScores,
    /// The greedy index does not exist in the action space
    OutOfRange(usize),
}

/// Action selected for one step
#[derive(Debug, Clone, PartialEq)]
pub enum ActionChoice {
    Greedy(usize),
    Fallback { action: usize, reason: FallbackReason },
}

impl ActionChoice {
    pub fn action(&self) -> usize {
        match self {
            Self::Greedy(action) => *action,
            Self::Fallback { action, .. } => *action,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Index of the highest score; the first one wins ties
///
/// NaN scores never win.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}

fn greedy<S, P: Policy<S> + ?Sized>(
    policy: &mut P,
    state: &S,
    space: &DiscreteSpace,
) -> std::result::Result<usize, FallbackReason> {
    let batch = panic::catch_unwind(AssertUnwindSafe(|| policy.scores(state)))
        .map_err(|payload| {
            FallbackReason::PolicyFailed(format!("policy panicked: {}", panic_message(&*payload)))
        })?
        .map_err(|e| FallbackReason::PolicyFailed(format!("{e:#}")))?;
    let scores = batch.first().ok_or(FallbackReason::EmptyScores)?;
    let action = argmax(scores).ok_or(FallbackReason::EmptyScores)?;
    if !space.contains(action) {
        return Err(FallbackReason::OutOfRange(action));
    }
    Ok(action)
}

/// Pick the greedy action, or sample one from `space` when that fails
pub fn choose_action<S, P, R>(
    policy: Option<&mut P>,
    state: &S,
    space: &DiscreteSpace,
    rng: &mut R,
) -> ActionChoice
where
    P: Policy<S> + ?Sized,
    R: Rng + ?Sized,
{
    let outcome = match policy {
        Some(policy) => greedy(policy, state, space),
        None => Err(FallbackReason::NoPolicy),
    };

    match outcome {
        Ok(action) => ActionChoice::Greedy(action),
        Err(reason) => ActionChoice::Fallback {
            action: space.sample(rng),
            reason,
        },
    }
}
