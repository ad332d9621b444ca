//! Environment metadata lookup

/// Metadata keys consulted for the playback frame rate, in priority order
pub const FPS_KEYS: [&str; 2] = ["video.frames_per_second", "render_fps"];

/// A single metadata value
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl MetadataValue {
    /// Numeric view of the value; strings are parsed
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(s) => s.trim().parse().ok(),
            Self::Bool(_) => None,
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MetadataValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for MetadataValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for MetadataValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for MetadataValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Ordered key/value metadata attached to an environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvMetadata {
    entries: Vec<(String, MetadataValue)>,
}

impl EnvMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a key
    pub fn insert<K: Into<String>, V: Into<MetadataValue>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();
        if let Some((_, v)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            *v = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<MetadataValue>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&MetadataValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Preferred playback rate, if present and usable
    ///
    /// Keys that are missing, non-numeric, non-finite or non-positive are
    /// skipped and the next key in [`FPS_KEYS`] is tried.
    pub fn frames_per_second(&self) -> Option<f64> {
        FPS_KEYS
            .iter()
            .filter_map(|key| self.get(key))
            .filter_map(MetadataValue::as_f64)
            .find(|fps| fps.is_finite() && *fps > 0.0)
    }
}
