//! Device contracts.
//!
//! Sensors sample the I/O bus and publish points under COV rules.
//! Actuators take commands, follow a state machine gated by permissives and
//! interlocks, and report the outputs the runner commits in the write phase.
//!
//! Shared behavior lives in [`base::ActuatorCore`], held by composition.

pub mod base;
pub mod level;
pub mod onoff;

use plant_common::control::command::{Ack, Command};
use plant_common::control::point::Point;
use plant_common::control::state::{DeviceStatus, Mode};

use crate::clock::ScanClock;
use crate::io::{IoBus, IoWrite};
use crate::policy::condition::Snapshot;

/// A device state change, reported for observability.
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub device: String,
    pub from: String,
    pub to: String,
    /// Monotonic time of the change.
    pub at: f64,
    pub reason: String,
}

/// Sampling device.
pub trait Sensor {
    fn id(&self) -> &str;

    /// Sample once. Returns `true` when a new point was published.
    fn update(&mut self, clock: &dyn ScanClock, io: &dyn IoBus) -> bool;

    /// Last published points.
    fn points(&self) -> Vec<&Point>;

    fn status(&self) -> DeviceStatus;
}

/// Commandable device.
pub trait Actuator {
    fn id(&self) -> &str;

    /// Advance the state machine one scan.
    fn update(&mut self, clock: &dyn ScanClock, inputs: &Snapshot) -> Option<StateChange>;

    /// Arbitrate, validate and queue a command for the next scan.
    fn command(&mut self, cmd: &Command) -> Ack;

    /// Published points describing the device.
    fn points(&self) -> Vec<&Point>;

    fn status(&self) -> DeviceStatus;

    /// Output values for the write phase.
    fn outputs(&self) -> Vec<IoWrite>;

    /// I/O tags this device's conditions read as flags.
    fn flag_tags(&self) -> Vec<&str> {
        Vec::new()
    }

    fn set_mode(&mut self, mode: Mode);
}
