//! Discrete action spaces

use anyhow::Result;
use rand::Rng;

use crate::error::RecordError;

/// Actions `0..n`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteSpace {
    n: usize,
}

impl DiscreteSpace {
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(RecordError::InvalidActionSpace.into());
        }
        Ok(Self { n })
    }

    /// Number of actions
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn contains(&self, action: usize) -> bool {
        action < self.n
    }

    /// Draw an action uniformly at random
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        rng.gen_range(0..self.n)
    }
}
