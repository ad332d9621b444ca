//! Protobuf messages for the TensorBoard events gymboard writes
//!
//! Only the fields needed for scalar and image summaries are modelled:
//!
//! ```text
//! Event   { double wall_time = 1; int64 step = 2; string file_version = 3; Summary summary = 5; }
//! Summary { repeated Value value = 1; }
//! Value   { string tag = 1; float simple_value = 2; Image image = 4; }
//! Image   { int32 height = 1; int32 width = 2; int32 colorspace = 3; bytes encoded_image_string = 4; }
//! ```
//!
//! Decoding skips any other field, so files written by other tools can be
//! read; event kinds and value types outside this subset decode as `None`.

use prost::{Message, Oneof};

/// Header value TensorBoard expects in the first event of every file
pub const FILE_VERSION: &str = "brain.Event:2";

/// One record of an event file
#[derive(Clone, PartialEq, Message)]
pub struct Event {
    /// Seconds since the Unix epoch
    #[prost(double, tag = "1")]
    pub wall_time: f64,
    #[prost(int64, tag = "2")]
    pub step: i64,
    #[prost(oneof = "EventPayload", tags = "3, 5")]
    pub payload: Option<EventPayload>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum EventPayload {
    #[prost(string, tag = "3")]
    FileVersion(String),
    #[prost(message, tag = "5")]
    Summary(Summary),
}

#[derive(Clone, PartialEq, Message)]
pub struct Summary {
    #[prost(message, repeated, tag = "1")]
    pub values: Vec<SummaryValue>,
}

#[derive(Clone, PartialEq, Message)]
pub struct SummaryValue {
    #[prost(string, tag = "1")]
    pub tag: String,
    #[prost(oneof = "ValueKind", tags = "2, 4")]
    pub kind: Option<ValueKind>,
}

#[derive(Clone, PartialEq, Oneof)]
pub enum ValueKind {
    #[prost(float, tag = "2")]
    Simple(f32),
    #[prost(message, tag = "4")]
    Image(ImageSummary),
}

/// Encoded image plus the header fields TensorBoard needs to display it
#[derive(Clone, PartialEq, Message)]
pub struct ImageSummary {
    #[prost(int32, tag = "1")]
    pub height: i32,
    #[prost(int32, tag = "2")]
    pub width: i32,
    /// 1 grayscale, 2 grayscale + alpha, 3 RGB, 4 RGBA
    #[prost(int32, tag = "3")]
    pub colorspace: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub encoded: Vec<u8>,
}

impl Event {
    pub fn file_version(wall_time: f64) -> Self {
        Self {
            wall_time,
            step: 0,
            payload: Some(EventPayload::FileVersion(FILE_VERSION.to_string())),
        }
    }

    pub fn summary(wall_time: f64, step: i64, value: SummaryValue) -> Self {
        Self {
            wall_time,
            step,
            payload: Some(EventPayload::Summary(Summary {
                values: vec![value],
            })),
        }
    }
}

impl SummaryValue {
    pub fn scalar(tag: impl Into<String>, value: f32) -> Self {
        Self {
            tag: tag.into(),
            kind: Some(ValueKind::Simple(value)),
        }
    }

    pub fn image(tag: impl Into<String>, image: ImageSummary) -> Self {
        Self {
            tag: tag.into(),
            kind: Some(ValueKind::Image(image)),
        }
    }
}
