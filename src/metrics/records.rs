//! Flattened view of the summary values in a run

use std::fmt;

use serde::Serialize;

use super::proto::{Event, EventPayload, ValueKind};

/// One summary value together with the step and time of its event
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub step: i64,
    pub wall_time: f64,
    pub tag: String,
    /// `None` for value types gymboard does not interpret
    pub kind: Option<ValueKind>,
}

/// Every summary value of `events` in order; other events are skipped
pub fn summary_records(events: &[Event]) -> Vec<SummaryRecord> {
    events
        .iter()
        .filter_map(|event| match &event.payload {
            Some(EventPayload::Summary(summary)) => Some((event, summary)),
            _ => None,
        })
        .flat_map(|(event, summary)| {
            summary.values.iter().map(move |value| SummaryRecord {
                step: event.step,
                wall_time: event.wall_time,
                tag: value.tag.clone(),
                kind: value.kind.clone(),
            })
        })
        .collect()
}

impl SummaryRecord {
    /// Printable form without the encoded image payload
    pub fn line(&self) -> RecordLine {
        let (value, image) = match &self.kind {
            Some(ValueKind::Simple(v)) => (Some(*v), None),
            Some(ValueKind::Image(img)) => (
                None,
                Some(ImageLine {
                    height: img.height,
                    width: img.width,
                    bytes: img.encoded.len(),
                }),
            ),
            None => (None, None),
        };
        RecordLine {
            step: self.step,
            wall_time: self.wall_time,
            tag: self.tag.clone(),
            value,
            image,
        }
    }
}

/// One line of `gymboard inspect` output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordLine {
    pub step: i64,
    pub wall_time: f64,
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageLine {
    pub height: i32,
    pub width: i32,
    pub bytes: usize,
}

impl fmt::Display for RecordLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>8}  {}  ", self.step, self.tag)?;
        match (&self.value, &self.image) {
            (Some(v), _) => write!(f, "{v}"),
            (None, Some(img)) => write!(
                f,
                "[image {}x{}, {} bytes]",
                img.width, img.height, img.bytes
            ),
            (None, None) => write!(f, "[unsupported value]"),
        }
    }
}
