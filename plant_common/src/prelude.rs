//! Prelude module for common re-exports.
//!
//! `use plant_common::prelude::*;` brings in the model types most plant
//! code touches without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::control::config::{
    ActuatorConfig, AlarmConfig, MechanismConfig, PlantConfig, ScanConfig, ScanMode,
    SensorConfig,
};

// ─── Model ──────────────────────────────────────────────────────────
pub use crate::control::command::{Ack, AckCode, Command, CommandKind, CommandSource};
pub use crate::control::condition::{Condition, ConditionKind};
pub use crate::control::error::ContractError;
pub use crate::control::io::IoValue;
pub use crate::control::point::{
    CovRule, Discrete, Limits, Point, PointValue, Quality, Scaling,
};
pub use crate::control::state::{
    ActuatorState, DeviceFlags, DeviceStatus, LifecycleState, Mode, Severity,
};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{COMMAND_QUEUE_CAPACITY, DEFAULT_SCAN_PERIOD_S};
