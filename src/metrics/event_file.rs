//! Event file writer

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use prost::Message;

use super::crc::masked_crc32c;
use crate::error::RecordError;
use super::proto::{Event, ImageSummary, SummaryValue};
use super::MetricsLog;

/// `events.out.tfevents.{unix_secs}.{host}.{pid}.v2`
pub fn event_file_name(unix_secs: i64, host: &str, pid: u32) -> String {
    format!("events.out.tfevents.{unix_secs}.{host}.{pid}.v2")
}

fn host_name() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty() && !h.contains(std::path::is_separator))
        .unwrap_or_else(|| "localhost".to_string())
}

fn event_step(step: u64) -> Result<i64> {
    i64::try_from(step).map_err(|_| anyhow::Error::from(RecordError::StepOutOfRange(step)))
}

fn wall_time() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Appends events to one file inside a run directory
pub struct EventFileWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    records: u64,
}

impl EventFileWriter {
    /// Create the run directory if needed and start a new event file in it
    pub fn create(run_dir: &Path) -> Result<Self> {
        fs::create_dir_all(run_dir)
            .with_context(|| format!("Failed to create run directory {}", run_dir.display()))?;

        let name = event_file_name(Utc::now().timestamp(), &host_name(), std::process::id());
        let path = run_dir.join(name);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create event file {}", path.display()))?;

        let mut writer = Self {
            path,
            writer: BufWriter::new(file),
            records: 0,
        };
        writer.write_event(&Event::file_version(wall_time()))?;
        writer.flush()?;

        log::debug!("opened event file {}", writer.path.display());
        Ok(writer)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records written, including the file-version header
    pub fn records(&self) -> u64 {
        self.records
    }

    fn write_event(&mut self, event: &Event) -> Result<()> {
        let data = event.encode_to_vec();
        let len = (data.len() as u64).to_le_bytes();

        let mut frame = Vec::with_capacity(data.len() + 16);
        frame.extend_from_slice(&len);
        frame.extend_from_slice(&masked_crc32c(&len).to_le_bytes());
        frame.extend_from_slice(&data);
        frame.extend_from_slice(&masked_crc32c(&data).to_le_bytes());

        self.writer
            .write_all(&frame)
            .with_context(|| format!("Failed to append to {}", self.path.display()))?;
        self.records += 1;
        Ok(())
    }
}

impl MetricsLog for EventFileWriter {
    fn write_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()> {
        let event = Event::summary(
            wall_time(),
            event_step(step)?,
            SummaryValue::scalar(tag, value as f32),
        );
        self.write_event(&event)
    }

    fn write_image(&mut self, tag: &str, image: &ImageSummary, step: u64) -> Result<()> {
        let event = Event::summary(
            wall_time(),
            event_step(step)?,
            SummaryValue::image(tag, image.clone()),
        );
        self.write_event(&event)
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))
    }
}
