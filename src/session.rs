//! Recording session: where records go and which step they land on

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::RecordError;

/// Largest step a record can carry; event files store steps as `i64`
pub const MAX_STEP: u64 = i64::MAX as u64;

/// Run name derived from a timestamp, e.g. `Oct_19_17:23:05`
///
/// Two sessions created within the same second share a run name.
pub fn run_name(at: &DateTime<Local>) -> String {
    at.format("%b_%d_%X").to_string()
}

/// One recording context per program run
#[derive(Debug, Clone)]
pub struct Session {
    logdir: PathBuf,
    run_dir: PathBuf,
    port: u16,
    step: u64,
}

impl Session {
    /// Session whose run directory is named after the current local time
    pub fn new(logdir: impl Into<PathBuf>, port: u16) -> Self {
        Self::at(logdir, port, &Local::now())
    }

    pub fn at(logdir: impl Into<PathBuf>, port: u16, created: &DateTime<Local>) -> Self {
        let logdir = logdir.into();
        let run_dir = logdir.join(run_name(created));
        Self {
            logdir,
            run_dir,
            port,
            step: 0,
        }
    }

    pub fn logdir(&self) -> &Path {
        &self.logdir
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Step the next implicit write would use
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Step for a scalar write
    ///
    /// Without an explicit step the counter is used and then advanced; an
    /// explicit step replaces the counter without advancing it. Steps above
    /// [`MAX_STEP`] are rejected and leave the counter untouched.
    pub fn scalar_step(&mut self, explicit: Option<u64>) -> Result<u64, RecordError> {
        let step = check_step(explicit.unwrap_or(self.step))?;
        self.step = match explicit {
            Some(_) => step,
            None => step.checked_add(1).ok_or(RecordError::StepOutOfRange(step))?,
        };
        Ok(step)
    }

    /// Step for a clip write; the counter is never modified
    pub fn clip_step(&self, explicit: Option<u64>) -> Result<u64, RecordError> {
        check_step(explicit.unwrap_or(self.step))
    }
}

fn check_step(step: u64) -> Result<u64, RecordError> {
    if step > MAX_STEP {
        return Err(RecordError::StepOutOfRange(step));
    }
    Ok(step)
}
