//! Append-only metrics log in the TensorBoard event-file format
//!
//! Records are framed the TFRecord way (length, masked CRC-32C of the
//! length, payload, masked CRC-32C of the payload) and each payload is a
//! protobuf `Event`. TensorBoard polls the run directory and picks up new
//! records as they are flushed.

mod crc;
mod event_file;
pub mod proto;
mod reader;
mod records;

use anyhow::Result;

pub use crc::masked_crc32c;
pub use event_file::{event_file_name, EventFileWriter};
pub use proto::{Event, EventPayload, ImageSummary, SummaryValue, ValueKind};
pub use reader::{event_files, read_run, EventFileReader};
pub use records::{summary_records, ImageLine, RecordLine, SummaryRecord};

/// Colorspace value for RGB image summaries
pub const COLORSPACE_RGB: i32 = 3;

/// Sink for scalar and image records
pub trait MetricsLog {
    /// Append a scalar value under `tag` at `step`
    fn write_scalar(&mut self, tag: &str, value: f64, step: u64) -> Result<()>;

    /// Append an encoded image under `tag` at `step`
    fn write_image(&mut self, tag: &str, image: &ImageSummary, step: u64) -> Result<()>;

    /// Make everything written so far visible to readers
    fn flush(&mut self) -> Result<()>;
}
