//! Reading event files back

use std::fs::{self, File};
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use prost::Message;

use super::crc::masked_crc32c;
use super::proto::Event;
use crate::error::RecordError;

/// Sequential reader over the framed records of one event file
///
/// Iteration stops after the first error.
pub struct EventFileReader<R> {
    reader: R,
    offset: u64,
    failed: bool,
}

impl EventFileReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open event file {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> EventFileReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            offset: 0,
            failed: false,
        }
    }

    fn corrupt(&self, reason: impl Into<String>) -> anyhow::Error {
        RecordError::CorruptRecord {
            offset: self.offset,
            reason: reason.into(),
        }
        .into()
    }

    fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.reader
            .read_exact(&mut buf)
            .map_err(|_| self.corrupt("truncated checksum"))?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Next event, or `None` at a clean end of file
    pub fn next_event(&mut self) -> Result<Option<Event>> {
        let mut len_buf = [0u8; 8];
        match self.reader.read_exact(&mut len_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e).context("Failed to read event record"),
        }

        if self.read_u32()? != masked_crc32c(&len_buf) {
            return Err(self.corrupt("length checksum mismatch"));
        }
        let len = u64::from_le_bytes(len_buf);

        let mut data = Vec::new();
        (&mut self.reader)
            .take(len)
            .read_to_end(&mut data)
            .context("Failed to read event payload")?;
        if data.len() as u64 != len {
            return Err(self.corrupt(format!(
                "payload truncated: {} of {len} bytes",
                data.len()
            )));
        }
        if self.read_u32()? != masked_crc32c(&data) {
            return Err(self.corrupt("payload checksum mismatch"));
        }

        let event = Event::decode(data.as_slice()).map_err(|e| self.corrupt(e.to_string()))?;
        self.offset += 8 + 4 + len + 4;
        Ok(Some(event))
    }
}

impl<R: Read> Iterator for EventFileReader<R> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let item = self.next_event().transpose();
        self.failed = matches!(item, Some(Err(_)));
        item
    }
}

/// Event files of a run directory, sorted by name
pub fn event_files(run_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(run_dir)
        .with_context(|| format!("Failed to list {}", run_dir.display()))?
    {
        let path = entry?.path();
        let is_event_file = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("events.out.tfevents."));
        if is_event_file && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Every event of every event file in `run_dir`
pub fn read_run(run_dir: &Path) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for path in event_files(run_dir)? {
        for event in EventFileReader::open(&path)? {
            events.push(event.with_context(|| format!("in {}", path.display()))?);
        }
    }
    Ok(events)
}
