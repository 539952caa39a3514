//! Workspace-wide defaults.
//!
//! Single source of truth for numeric defaults shared by the config schema
//! and the control engine.

/// Default scan period in seconds.
pub const DEFAULT_SCAN_PERIOD_S: f64 = 0.5;

/// Scan limit for a simulated plant with no `max_scans`.
pub const DEFAULT_SIM_MAX_SCANS: u64 = 1_000;

/// Default absolute deadband for a sensor with no explicit COV rule.
pub const DEFAULT_SENSOR_DEADBAND_ABS: f64 = 0.01;

/// Default minimum publish interval for a sensor with no explicit COV rule.
pub const DEFAULT_SENSOR_MIN_INTERVAL_S: f64 = 0.5;

/// Default command debounce window for plant mechanisms.
pub const DEFAULT_MECHANISM_DEBOUNCE_S: f64 = 0.2;

/// Fixed capacity of every command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 16;

/// Smallest step used to keep published timestamps strictly increasing.
pub const PUBLISH_TS_EPSILON_S: f64 = 1e-9;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "config/plant.toml";
