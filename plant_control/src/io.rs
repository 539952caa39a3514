//! I/O boundary.
//!
//! The core reads and writes tags only through [`IoBus`]. [`SimIo`] is the
//! in-memory image used by the simulated plant and by tests.

use std::collections::BTreeMap;

pub use plant_common::control::io::IoValue;

/// Tag-keyed read/write access to field I/O.
pub trait IoBus {
    /// Current value of a tag, `None` when the tag is unknown.
    fn read(&self, tag: &str) -> Option<IoValue>;

    fn write(&mut self, tag: &str, value: IoValue);

    /// Boolean view of a tag; unknown or non-boolean tags read `false`.
    fn read_bool(&self, tag: &str) -> bool {
        self.read(tag).and_then(|v| v.as_bool()).unwrap_or(false)
    }
}

/// One output produced during a scan, committed in the write phase.
#[derive(Debug, Clone, PartialEq)]
pub struct IoWrite {
    pub tag: String,
    pub value: IoValue,
}

impl IoWrite {
    pub fn new(tag: impl Into<String>, value: impl Into<IoValue>) -> Self {
        Self {
            tag: tag.into(),
            value: value.into(),
        }
    }
}

/// In-memory process image.
#[derive(Debug, Clone, Default)]
pub struct SimIo {
    tags: BTreeMap<String, IoValue>,
    writes: u64,
}

impl SimIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Image preloaded with initial values.
    pub fn with_values(values: BTreeMap<String, IoValue>) -> Self {
        Self {
            tags: values,
            writes: 0,
        }
    }

    pub fn set(&mut self, tag: impl Into<String>, value: impl Into<IoValue>) {
        self.tags.insert(tag.into(), value.into());
    }

    pub fn remove(&mut self, tag: &str) -> Option<IoValue> {
        self.tags.remove(tag)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, &IoValue)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Writes received through [`IoBus::write`].
    #[inline]
    pub const fn write_count(&self) -> u64 {
        self.writes
    }
}

impl IoBus for SimIo {
    fn read(&self, tag: &str) -> Option<IoValue> {
        self.tags.get(tag).cloned()
    }

    fn write(&mut self, tag: &str, value: IoValue) {
        self.writes += 1;
        self.tags.insert(tag.to_string(), value);
    }
}
