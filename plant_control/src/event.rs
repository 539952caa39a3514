//! Structured event records and sinks.
//!
//! Devices and the scan runner describe what happened as [`EventRecord`]s
//! and hand them to an [`EventSink`]. Storage is the sink's business:
//! [`TracingSink`] forwards to `tracing`, [`MemorySink`] keeps records for
//! inspection in tests.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use plant_common::control::point::{Point, Quality};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::clock::ScanClock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// One append-only log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub wall_ts: DateTime<Utc>,
    pub mono_ts: f64,
    pub level: EventLevel,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl EventRecord {
    /// Record stamped with both clock readings.
    pub fn new(clock: &dyn ScanClock, level: EventLevel, event: impl Into<String>) -> Self {
        Self {
            wall_ts: clock.wall_now(),
            mono_ts: clock.now(),
            level,
            event: event.into(),
            device: None,
            point_id: None,
            value: None,
            quality: None,
            reason: None,
            extra: Map::new(),
        }
    }

    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Copy id, value and quality from a point.
    pub fn point(mut self, point: &Point) -> Self {
        self.point_id = Some(point.id().to_string());
        self.value = Some(point.value().to_string());
        self.quality = Some(point.quality());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Consumer of event records.
pub trait EventSink {
    fn emit(&mut self, record: EventRecord);

    /// Build and emit a record carrying only extra attributes.
    fn log(
        &mut self,
        clock: &dyn ScanClock,
        level: EventLevel,
        event: &str,
        attrs: Map<String, Value>,
    ) {
        let mut record = EventRecord::new(clock, level, event);
        record.extra = attrs;
        self.emit(record);
    }
}

// ─── Tracing Sink ───────────────────────────────────────────────────

/// Forwards records to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, record: EventRecord) {
        let device = record.device.as_deref().unwrap_or("");
        let point = record.point_id.as_deref().unwrap_or("");
        let value = record.value.as_deref().unwrap_or("");
        let quality = record.quality.map_or("", |q| q.as_str());
        let reason = record.reason.as_deref().unwrap_or("");
        let extra = if record.extra.is_empty() {
            String::new()
        } else {
            Value::Object(record.extra).to_string()
        };
        let mono_ts = record.mono_ts;
        let event = record.event.as_str();

        match record.level {
            EventLevel::Debug => {
                debug!(mono_ts, device, point, value, quality, reason, extra = %extra, "{event}")
            }
            EventLevel::Info => {
                info!(mono_ts, device, point, value, quality, reason, extra = %extra, "{event}")
            }
            EventLevel::Warn => {
                warn!(mono_ts, device, point, value, quality, reason, extra = %extra, "{event}")
            }
            EventLevel::Error => {
                error!(mono_ts, device, point, value, quality, reason, extra = %extra, "{event}")
            }
        }
    }
}

// ─── Memory Sink ────────────────────────────────────────────────────

/// Keeps every record. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Rc<RefCell<Vec<EventRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.borrow().clone()
    }

    /// Records whose `event` name matches.
    pub fn events(&self, event: &str) -> Vec<EventRecord> {
        self.records
            .borrow()
            .iter()
            .filter(|r| r.event == event)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.records.borrow_mut().clear();
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, record: EventRecord) {
        self.records.borrow_mut().push(record);
    }
}
