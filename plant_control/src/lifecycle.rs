//! Plant lifecycle state machine.
//!
//! IDLE → STARTING → RUNNING → STOPPING → STOPPED, with FAULT reachable from
//! every other state and left only through `clear_fault` (→ IDLE). Each
//! operation is guarded on the source state; a call from the wrong state
//! returns `None` and changes nothing.

use plant_common::control::state::LifecycleState;
use serde::Serialize;

/// A successful lifecycle transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub from: LifecycleState,
    pub to: LifecycleState,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lifecycle {
    state: LifecycleState,
    entered_at: f64,
    /// Completed start/stop cycles.
    cycles: u64,
    last_reason: String,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Idle,
            entered_at: 0.0,
            cycles: 0,
            last_reason: String::new(),
        }
    }

    #[inline]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    #[inline]
    pub const fn entered_at(&self) -> f64 {
        self.entered_at
    }

    #[inline]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn last_reason(&self) -> &str {
        &self.last_reason
    }

    /// IDLE | STOPPED → STARTING.
    pub fn request_start(&mut self, t: f64, reason: Option<&str>) -> Option<Transition> {
        match self.state {
            LifecycleState::Idle | LifecycleState::Stopped => {
                Some(self.go(LifecycleState::Starting, t, reason.unwrap_or("Start Requested")))
            }
            _ => None,
        }
    }

    /// STARTING → RUNNING.
    pub fn confirm_started(&mut self, t: f64, reason: Option<&str>) -> Option<Transition> {
        match self.state {
            LifecycleState::Starting => {
                Some(self.go(LifecycleState::Running, t, reason.unwrap_or("Started")))
            }
            _ => None,
        }
    }

    /// RUNNING | STARTING → STOPPING.
    pub fn request_stop(&mut self, t: f64, reason: Option<&str>) -> Option<Transition> {
        match self.state {
            LifecycleState::Running | LifecycleState::Starting => {
                Some(self.go(LifecycleState::Stopping, t, reason.unwrap_or("Stop Requested")))
            }
            _ => None,
        }
    }

    /// STOPPING → STOPPED, counting one completed cycle.
    pub fn confirm_stopped(&mut self, t: f64, reason: Option<&str>) -> Option<Transition> {
        match self.state {
            LifecycleState::Stopping => {
                self.cycles += 1;
                Some(self.go(LifecycleState::Stopped, t, reason.unwrap_or("Stopped")))
            }
            _ => None,
        }
    }

    /// Any state except FAULT → FAULT.
    pub fn trip_fault(&mut self, t: f64, reason: Option<&str>) -> Option<Transition> {
        match self.state {
            LifecycleState::Fault => None,
            _ => Some(self.go(LifecycleState::Fault, t, reason.unwrap_or("Fault"))),
        }
    }

    /// FAULT → IDLE.
    pub fn clear_fault(&mut self, t: f64, reason: Option<&str>) -> Option<Transition> {
        match self.state {
            LifecycleState::Fault => {
                Some(self.go(LifecycleState::Idle, t, reason.unwrap_or("Fault Cleared")))
            }
            _ => None,
        }
    }

    fn go(&mut self, to: LifecycleState, t: f64, reason: &str) -> Transition {
        let from = self.state;
        self.state = to;
        self.entered_at = t;
        self.last_reason = reason.to_string();
        Transition {
            from,
            to,
            reason: self.last_reason.clone(),
        }
    }
}
