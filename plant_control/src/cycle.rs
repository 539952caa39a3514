//! Scan cycle: read → evaluate → act → supervise.
//!
//! [`ScanRunner`] owns one clock, one I/O image and every device of a plant.
//! Each scan runs the same phases in a fixed order:
//!
//! 1. **Read**: sensors sample the I/O bus and publish under their COV rules.
//! 2. **Snapshot**: last published points and the flag tags referenced by
//!    conditions are copied into an immutable [`Snapshot`].
//! 3. **Act**: actuators drain their command queues and advance their state
//!    machines against the snapshot; their outputs are committed.
//! 4. **Supervise**: mechanisms update alarms and lifecycle from the bus and
//!    commit their outputs.
//!
//! Pacing is the clock's job: [`ScanRunner::run`] scans, then waits for the
//! next tick. Under overload the real-time clock sheds ticks, it never queues
//! them.

use std::time::Instant;

use plant_common::control::command::{Ack, AckCode, Command};
use plant_common::control::state::{ActuatorState, DeviceStatus};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::clock::{ClockError, ScanClock};
use crate::device::{Actuator, Sensor, StateChange};
use crate::event::{EventLevel, EventRecord, EventSink};
use crate::io::IoBus;
use crate::mechanism::Mechanism;
use crate::policy::condition::Snapshot;

// ─── Scan Statistics ────────────────────────────────────────────────

/// O(1) per-scan timing statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CycleStats {
    /// Total scans executed.
    pub scan_count: u64,
    /// Last scan body duration [ns].
    pub last_scan_ns: u64,
    pub min_scan_ns: u64,
    pub max_scan_ns: u64,
    /// Running sum for average computation.
    pub sum_scan_ns: u64,
    /// Waits that started after their deadline.
    pub overruns: u64,
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            scan_count: 0,
            last_scan_ns: 0,
            min_scan_ns: u64::MAX,
            max_scan_ns: 0,
            sum_scan_ns: 0,
            overruns: 0,
        }
    }

    /// Record a scan body duration.
    #[inline]
    pub fn record(&mut self, duration_ns: u64) {
        self.scan_count += 1;
        self.last_scan_ns = duration_ns;
        self.min_scan_ns = self.min_scan_ns.min(duration_ns);
        self.max_scan_ns = self.max_scan_ns.max(duration_ns);
        self.sum_scan_ns = self.sum_scan_ns.saturating_add(duration_ns);
    }

    /// Average scan time [ns] (0 if no scans).
    #[inline]
    pub fn avg_scan_ns(&self) -> u64 {
        if self.scan_count == 0 {
            0
        } else {
            self.sum_scan_ns / self.scan_count
        }
    }
}

// ─── Errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("scan clock failed: {0}")]
    Clock(#[from] ClockError),
}

/// What one scan did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Sensors that published a new point.
    pub published: usize,
    /// Actuator state changes.
    pub state_changes: usize,
}

// ─── Runner ─────────────────────────────────────────────────────────

pub struct ScanRunner {
    clock: Box<dyn ScanClock>,
    io: Box<dyn IoBus>,
    sink: Box<dyn EventSink>,
    sensors: Vec<Box<dyn Sensor>>,
    actuators: Vec<Box<dyn Actuator>>,
    mechanisms: Vec<Mechanism>,
    snapshot: Snapshot,
    stats: CycleStats,
}

impl ScanRunner {
    pub fn new(clock: Box<dyn ScanClock>, io: Box<dyn IoBus>, sink: Box<dyn EventSink>) -> Self {
        Self {
            clock,
            io,
            sink,
            sensors: Vec::new(),
            actuators: Vec::new(),
            mechanisms: Vec::new(),
            snapshot: Snapshot::new(),
            stats: CycleStats::new(),
        }
    }

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) {
        self.sensors.push(sensor);
    }

    pub fn add_actuator(&mut self, actuator: Box<dyn Actuator>) {
        self.actuators.push(actuator);
    }

    pub fn add_mechanism(&mut self, mechanism: Mechanism) {
        self.mechanisms.push(mechanism);
    }

    pub fn clock(&self) -> &dyn ScanClock {
        self.clock.as_ref()
    }

    pub fn io(&self) -> &dyn IoBus {
        self.io.as_ref()
    }

    /// Direct access to the process image, e.g. to inject field values.
    pub fn io_mut(&mut self) -> &mut dyn IoBus {
        self.io.as_mut()
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    /// Inputs seen by the last scan's conditions.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn sensor(&self, id: &str) -> Option<&dyn Sensor> {
        self.sensors.iter().find(|s| s.id() == id).map(|s| s.as_ref())
    }

    pub fn actuator(&self, id: &str) -> Option<&dyn Actuator> {
        self.actuators.iter().find(|a| a.id() == id).map(|a| a.as_ref())
    }

    pub fn actuator_mut(&mut self, id: &str) -> Option<&mut Box<dyn Actuator>> {
        self.actuators.iter_mut().find(|a| a.id() == id)
    }

    pub fn mechanism(&self, id: &str) -> Option<&Mechanism> {
        self.mechanisms.iter().find(|m| m.id() == id)
    }

    pub fn mechanism_mut(&mut self, id: &str) -> Option<&mut Mechanism> {
        self.mechanisms.iter_mut().find(|m| m.id() == id)
    }

    /// Status of every device, sensors first.
    pub fn statuses(&self) -> Vec<DeviceStatus> {
        self.sensors
            .iter()
            .map(|s| s.status())
            .chain(self.actuators.iter().map(|a| a.status()))
            .chain(self.mechanisms.iter().map(Mechanism::status))
            .collect()
    }

    /// Route a command to its target.
    ///
    /// Unstamped commands are stamped with the scan clock. An unknown
    /// target is INVALID.
    pub fn submit(&mut self, mut cmd: Command) -> Ack {
        let clock = self.clock.as_ref();
        if cmd.ts_mono.is_none() {
            cmd.ts_mono = Some(clock.now());
        }

        let ack = if let Some(actuator) = self.actuators.iter_mut().find(|a| a.id() == cmd.target) {
            actuator.command(&cmd)
        } else if let Some(mech) = self.mechanisms.iter_mut().find(|m| m.id() == cmd.target) {
            mech.command(&cmd)
        } else {
            Ack::rejected(AckCode::Invalid, format!("Unknown target {}", cmd.target))
        };

        let level = if ack.ok {
            EventLevel::Info
        } else {
            EventLevel::Warn
        };
        let mut record = EventRecord::new(clock, level, "command")
            .device(cmd.target.clone())
            .attr("kind", cmd.kind.as_str())
            .attr("source", cmd.source.as_str())
            .attr("ack", ack.code.as_str());
        if let Some(reason) = &ack.reason {
            record = record.reason(reason.clone());
        }
        if let Some(request_id) = &cmd.request_id {
            record = record.attr("request_id", request_id.clone());
        }
        self.sink.emit(record);
        ack
    }

    /// Run one scan at the clock's current time.
    pub fn scan_once(&mut self) -> ScanReport {
        let started = Instant::now();
        let clock = self.clock.as_ref();
        let mut report = ScanReport::default();

        // Read.
        for sensor in &mut self.sensors {
            if sensor.update(clock, self.io.as_ref()) {
                report.published += 1;
                for point in sensor.points() {
                    self.sink.emit(
                        EventRecord::new(clock, EventLevel::Debug, "point_published")
                            .device(sensor.id())
                            .point(point),
                    );
                }
            }
        }

        // Snapshot.
        self.snapshot.clear();
        for sensor in &self.sensors {
            for point in sensor.points() {
                self.snapshot.insert_point(point.clone());
            }
        }
        for actuator in &self.actuators {
            for point in actuator.points() {
                self.snapshot.insert_point(point.clone());
            }
            for tag in actuator.flag_tags() {
                self.snapshot.set_flag(tag, self.io.read_bool(tag));
            }
        }

        // Act.
        for actuator in &mut self.actuators {
            if let Some(change) = actuator.update(clock, &self.snapshot) {
                report.state_changes += 1;
                self.sink.emit(state_change_record(clock, &change));
            }
            for write in actuator.outputs() {
                self.io.write(&write.tag, write.value);
            }
        }

        // Supervise.
        for mechanism in &mut self.mechanisms {
            let writes = mechanism.tick(clock, self.io.as_ref(), self.sink.as_mut());
            for write in writes {
                self.io.write(&write.tag, write.value);
            }
        }

        self.stats.record(started.elapsed().as_nanos() as u64);
        report
    }

    /// Run `scans` scans, waiting for the next tick after each.
    pub fn run(&mut self, scans: u64) -> Result<(), ScanError> {
        info!(
            scans,
            period_s = self.clock.period_s(),
            sensors = self.sensors.len(),
            actuators = self.actuators.len(),
            mechanisms = self.mechanisms.len(),
            "scan loop started"
        );
        for _ in 0..scans {
            let report = self.scan_once();
            debug!(
                t = self.clock.now(),
                published = report.published,
                state_changes = report.state_changes,
                "scan complete"
            );
            self.clock.sleep_until_next_scan()?;
            self.stats.overruns = self.clock.overruns();
        }
        info!(
            scans = self.stats.scan_count,
            avg_scan_us = self.stats.avg_scan_ns() / 1_000,
            max_scan_us = self.stats.max_scan_ns / 1_000,
            overruns = self.stats.overruns,
            "scan loop finished"
        );
        Ok(())
    }
}

impl std::fmt::Debug for ScanRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanRunner")
            .field("now", &self.clock.now())
            .field("sensors", &self.sensors.len())
            .field("actuators", &self.actuators.len())
            .field("mechanisms", &self.mechanisms.len())
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn state_change_record(clock: &dyn ScanClock, change: &StateChange) -> EventRecord {
    let level = if change.to == ActuatorState::Fault.as_str() {
        EventLevel::Warn
    } else {
        EventLevel::Info
    };
    EventRecord::new(clock, level, "state_change")
        .device(change.device.clone())
        .reason(change.reason.clone())
        .attr("from", change.from.clone())
        .attr("to", change.to.clone())
}

// ─── Tests ──────────────────────────────────────────────────────────
