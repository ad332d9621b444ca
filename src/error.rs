//! Typed failure conditions raised by the recorder itself
//!
//! Collaborator failures (environment, file I/O, GIF encoding) travel as
//! `anyhow::Error` with context attached; the variants here cover the checks
//! this crate performs on its own inputs.

use thiserror::Error;

/// Errors produced by gymboard's own validation
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("scalar label must not be empty")]
    EmptyLabel,

    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(String),

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("episode produced no frames")]
    EmptyEpisode,

    #[error("action space must contain at least one action")]
    InvalidActionSpace,

    #[error("step {0} is out of range, steps go up to {max}", max = i64::MAX)]
    StepOutOfRange(u64),

    #[error("corrupt event record at byte {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },
}
