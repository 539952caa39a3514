//! Composition core shared by actuators.
//!
//! Holds mode, operational state, state entry time and the command queue.
//! Devices embed an [`ActuatorCore`] and call into it instead of inheriting
//! behavior.

use std::fmt::Display;

use plant_common::control::command::{Ack, Command};
use plant_common::control::error::ContractError;
use plant_common::control::state::{DeviceFlags, DeviceStatus, Mode};

use crate::command::arbitration::arbitrate;
use crate::command::queue::CommandQueue;

#[derive(Debug, Clone)]
pub struct ActuatorCore<S> {
    id: String,
    mode: Mode,
    state: S,
    entered_at: f64,
    queue: CommandQueue,
}

impl<S: Copy + PartialEq + Display> ActuatorCore<S> {
    pub fn new(id: impl Into<String>, initial: S, debounce_s: f64) -> Result<Self, ContractError> {
        Ok(Self {
            id: id.into(),
            mode: Mode::Remote,
            state: initial,
            entered_at: 0.0,
            queue: CommandQueue::new(debounce_s)?,
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    #[inline]
    pub const fn state(&self) -> S {
        self.state
    }

    #[inline]
    pub const fn entered_at(&self) -> f64 {
        self.entered_at
    }

    pub fn time_in_state(&self, now: f64) -> f64 {
        now - self.entered_at
    }

    /// Move to `next`, stamping `entered_at`. Re-entering is a no-op.
    ///
    /// Returns the previous state when a change happened.
    pub fn enter(&mut self, next: S, now: f64) -> Option<S> {
        if next == self.state {
            return None;
        }
        let prev = self.state;
        self.state = next;
        self.entered_at = now;
        Some(prev)
    }

    /// Mode arbitration.
    pub fn arbitrate(&self, cmd: &Command) -> Result<(), Ack> {
        arbitrate(self.mode, cmd)
    }

    /// Queue an already validated command.
    pub fn enqueue(&mut self, cmd: &Command) -> Ack {
        self.queue.admit(cmd.clone())
    }

    /// Next queued command, oldest first.
    pub fn next_command(&mut self) -> Option<Command> {
        self.queue.pop()
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Status snapshot with the given condition flags.
    pub fn status(&self, mut flags: DeviceFlags) -> DeviceStatus {
        flags.set(DeviceFlags::COMMAND_PENDING, !self.queue.is_empty());
        DeviceStatus {
            id: self.id.clone(),
            mode: self.mode,
            state: self.state.to_string(),
            flags,
            entered_at: self.entered_at,
        }
    }
}
