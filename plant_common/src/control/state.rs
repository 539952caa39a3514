//! State enums shared by devices, mechanisms and alarms.
//!
//! All enums use `#[repr(u8)]` for compact snapshots. Includes device
//! command mode, the generic actuator operational state, the plant-level
//! lifecycle state, alarm severity, and the device status snapshot.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ─── Device Mode ────────────────────────────────────────────────────

/// Who may command a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Mode {
    /// Any source may command (default).
    #[default]
    Remote = 0,
    /// Only local-panel commands are accepted.
    Local = 1,
    /// All commands are refused.
    Locked = 2,
}

impl Mode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Remote => "REMOTE",
            Self::Local => "LOCAL",
            Self::Locked => "LOCKED",
        }
    }
}

// ─── Actuator State ─────────────────────────────────────────────────

/// Operational state of a run/stop actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum ActuatorState {
    #[default]
    Off = 0,
    Running = 1,
    /// Entered on interlock loss; left only through RESET.
    Fault = 2,
}

impl ActuatorState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Running),
            2 => Some(Self::Fault),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "OFF",
            Self::Running => "RUNNING",
            Self::Fault => "FAULT",
        }
    }
}

impl std::fmt::Display for ActuatorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Plant Lifecycle ────────────────────────────────────────────────

/// Coarse-grained supervisory state of a mechanism.
///
/// `Fault` pre-empts every other state and is left only via `clear_fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum LifecycleState {
    #[default]
    Idle = 0,
    Starting = 1,
    Running = 2,
    Stopping = 3,
    Stopped = 4,
    Fault = 5,
}

impl LifecycleState {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::Starting),
            2 => Some(Self::Running),
            3 => Some(Self::Stopping),
            4 => Some(Self::Stopped),
            5 => Some(Self::Fault),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Starting => "STARTING",
            Self::Running => "RUNNING",
            Self::Stopping => "STOPPING",
            Self::Stopped => "STOPPED",
            Self::Fault => "FAULT",
        }
    }

    /// States in which the mechanism drives its equipment.
    #[inline]
    pub const fn is_driving(&self) -> bool {
        matches!(self, Self::Starting | Self::Running)
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Alarm Severity ─────────────────────────────────────────────────

/// Alarm severity, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Severity {
    Info = 0,
    Warn = 1,
    #[default]
    Alarm = 2,
    /// Active TRIP alarms force the owning mechanism into FAULT.
    Trip = 3,
}

impl Severity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Alarm => "ALARM",
            Self::Trip => "TRIP",
        }
    }
}

// ─── Device Status ──────────────────────────────────────────────────

bitflags! {
    /// Condition summary carried in a device status snapshot.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct DeviceFlags: u8 {
        /// All start permissives currently satisfied.
        const PERMISSIVES_OK  = 0x01;
        /// All run interlocks currently satisfied.
        const INTERLOCKS_OK   = 0x02;
        /// Device is in its fault state.
        const FAULTED         = 0x04;
        /// Accepted commands are waiting for the next scan.
        const COMMAND_PENDING = 0x08;
    }
}

/// Lightweight structured status of one device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub id: String,
    pub mode: Mode,
    /// Device-specific operational state name.
    pub state: String,
    pub flags: DeviceFlags,
    /// Monotonic time of the last state change.
    pub entered_at: f64,
}

impl DeviceStatus {
    #[inline]
    pub const fn permissives_ok(&self) -> bool {
        self.flags.contains(DeviceFlags::PERMISSIVES_OK)
    }

    #[inline]
    pub const fn interlocks_ok(&self) -> bool {
        self.flags.contains(DeviceFlags::INTERLOCKS_OK)
    }
}
