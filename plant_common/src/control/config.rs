//! Plant configuration schema.
//!
//! One TOML document describes the scan, the sensors, the actuators, the
//! mechanisms and the initial simulated I/O image. Optional fields fall back
//! to the defaults in [`crate::consts`].
//!
//! ```toml
//! [shared]
//! service_name = "tank-farm"
//!
//! [scan]
//! period_s = 0.5
//! mode = "simulated"
//! max_scans = 20
//!
//! [[sensors]]
//! id = "LT_101"
//! tag = "LT_101:PV"
//! eu = "m"
//!
//! [[actuators]]
//! id = "P_101"
//! output_tag = "P_101:RUN"
//! permissives = [{ name = "suction level", kind = "threshold_ge", point = "LT_101", threshold = 0.5 }]
//! interlocks = [{ name = "estop healthy", kind = "flag", tag = "ESTOP_OK" }]
//!
//! [io]
//! "LT_101:PV" = 1.2
//! "ESTOP_OK" = true
//! ```

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_MECHANISM_DEBOUNCE_S, DEFAULT_SCAN_PERIOD_S, DEFAULT_SENSOR_DEADBAND_ABS,
    DEFAULT_SENSOR_MIN_INTERVAL_S,
};

use super::condition::Condition;
use super::error::{check_period, check_window};
use super::io::IoValue;
use super::point::{CovRule, Limits, Scaling};
use super::state::{Mode, Severity};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete plant description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    pub shared: SharedConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub sensors: Vec<SensorConfig>,
    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
    #[serde(default)]
    pub mechanisms: Vec<MechanismConfig>,
    /// Initial simulated I/O image keyed by tag.
    #[serde(default)]
    pub io: BTreeMap<String, IoValue>,
}

impl PlantConfig {
    /// Check bounds and cross references.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.scan.validate().map_err(ConfigError::ValidationError)?;

        let mut ids = HashSet::new();
        let device_ids = self
            .sensors
            .iter()
            .map(|s| s.id.as_str())
            .chain(self.actuators.iter().map(|a| a.id.as_str()))
            .chain(self.mechanisms.iter().map(|m| m.id.as_str()));
        for id in device_ids {
            if id.trim().is_empty() {
                return Err(invalid("device id cannot be empty".to_string()));
            }
            if !ids.insert(id) {
                return Err(invalid(format!("duplicate device id '{id}'")));
            }
        }

        for sensor in &self.sensors {
            sensor
                .validate()
                .map_err(|e| invalid(format!("sensor {}: {e}", sensor.id)))?;
        }

        let point_ids: HashSet<&str> = self
            .sensors
            .iter()
            .map(|s| s.id.as_str())
            .chain(self.actuators.iter().map(|a| a.id.as_str()))
            .collect();
        for actuator in &self.actuators {
            actuator
                .validate(&point_ids)
                .map_err(|e| invalid(format!("actuator {}: {e}", actuator.id)))?;
        }

        for mechanism in &self.mechanisms {
            mechanism
                .validate()
                .map_err(|e| invalid(format!("mechanism {}: {e}", mechanism.id)))?;
        }
        Ok(())
    }
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

// ─── Scan ───────────────────────────────────────────────────────────

/// Which clock drives the scan loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// Logical time, no suspension.
    #[default]
    Simulated,
    /// Period-aligned monotonic clock.
    Realtime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Scan period [s] (default: 0.5).
    #[serde(default = "default_period_s")]
    pub period_s: f64,
    #[serde(default)]
    pub mode: ScanMode,
    /// Stop after this many scans; run forever when absent.
    #[serde(default)]
    pub max_scans: Option<u64>,
    /// Simulated clock start time [s].
    #[serde(default)]
    pub start_s: f64,
}

fn default_period_s() -> f64 {
    DEFAULT_SCAN_PERIOD_S
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            period_s: DEFAULT_SCAN_PERIOD_S,
            mode: ScanMode::Simulated,
            max_scans: None,
            start_s: 0.0,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_period(self.period_s).map_err(|e| e.to_string())?;
        check_window("start_s", self.start_s).map_err(|e| e.to_string())
    }
}

// ─── Sensors ────────────────────────────────────────────────────────

/// Analog sensor sampled from one I/O tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    /// Raw input tag.
    pub tag: String,
    #[serde(default)]
    pub eu: Option<String>,
    /// Absolute deadband (default: 0.01).
    #[serde(default = "default_deadband_abs")]
    pub deadband_abs: Option<f64>,
    #[serde(default)]
    pub deadband_pct: Option<f64>,
    /// Minimum seconds between publications (default: 0.5).
    #[serde(default = "default_min_interval_s")]
    pub min_interval_s: f64,
    #[serde(default)]
    pub scaling: Option<Scaling>,
    #[serde(default)]
    pub limits: Option<Limits>,
}

fn default_deadband_abs() -> Option<f64> {
    Some(DEFAULT_SENSOR_DEADBAND_ABS)
}
fn default_min_interval_s() -> f64 {
    DEFAULT_SENSOR_MIN_INTERVAL_S
}

impl SensorConfig {
    /// Sensor with default COV settings.
    pub fn new(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tag: tag.into(),
            eu: None,
            deadband_abs: default_deadband_abs(),
            deadband_pct: None,
            min_interval_s: DEFAULT_SENSOR_MIN_INTERVAL_S,
            scaling: None,
            limits: None,
        }
    }

    pub fn cov(&self) -> CovRule {
        CovRule {
            deadband_abs: self.deadband_abs,
            deadband_pct: self.deadband_pct,
            min_interval_s: self.min_interval_s,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tag.trim().is_empty() {
            return Err("tag cannot be empty".to_string());
        }
        self.cov().validate().map_err(|e| e.to_string())?;
        if let Some(Limits {
            lo: Some(lo),
            hi: Some(hi),
        }) = self.limits
        {
            if lo > hi {
                return Err(format!("limits lo {lo} above hi {hi}"));
            }
        }
        Ok(())
    }
}

// ─── Actuators ──────────────────────────────────────────────────────

/// On/off actuator driving one boolean output tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub id: String,
    pub output_tag: String,
    #[serde(default)]
    pub mode: Mode,
    /// Minimum spacing between accepted commands [s].
    #[serde(default)]
    pub debounce_s: f64,
    /// Conditions required to start.
    #[serde(default)]
    pub permissives: Vec<Condition>,
    /// Conditions required to keep running.
    #[serde(default)]
    pub interlocks: Vec<Condition>,
}

impl ActuatorConfig {
    pub fn new(id: impl Into<String>, output_tag: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            output_tag: output_tag.into(),
            mode: Mode::Remote,
            debounce_s: 0.0,
            permissives: Vec::new(),
            interlocks: Vec::new(),
        }
    }

    /// `points` holds the point ids conditions may reference.
    pub fn validate(&self, points: &HashSet<&str>) -> Result<(), String> {
        if self.output_tag.trim().is_empty() {
            return Err("output_tag cannot be empty".to_string());
        }
        check_window("debounce_s", self.debounce_s).map_err(|e| e.to_string())?;
        for condition in self.permissives.iter().chain(&self.interlocks) {
            if let Some(point) = condition.kind.points().into_iter().find(|p| !points.contains(p)) {
                return Err(format!(
                    "condition '{}' references unknown point '{point}'",
                    condition.name
                ));
            }
            condition
                .kind
                .check()
                .map_err(|e| format!("condition '{}': {e}", condition.name))?;
        }
        Ok(())
    }
}

// ─── Mechanisms ─────────────────────────────────────────────────────

/// Alarm raised from a boolean I/O tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub latching: bool,
    /// Tag whose truth is the raw alarm condition.
    pub tag: String,
}

/// Supervised plant unit with a run/stop lifecycle.
///
/// Tag names default to `<id>:ENABLE`, `<id>:RUN_FB`, `<id>:TRIP_FB`,
/// `<id>:RUN_CMD` and `<id>:STATUS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanismConfig {
    pub id: String,
    /// Minimum spacing between accepted commands [s] (default: 0.2).
    #[serde(default = "default_mechanism_debounce_s")]
    pub debounce_s: f64,
    #[serde(default)]
    pub enable_tag: Option<String>,
    #[serde(default)]
    pub run_fb_tag: Option<String>,
    #[serde(default)]
    pub trip_fb_tag: Option<String>,
    #[serde(default)]
    pub run_cmd_tag: Option<String>,
    #[serde(default)]
    pub status_tag: Option<String>,
    /// Alarms in addition to the built-in latching `trip`.
    #[serde(default)]
    pub alarms: Vec<AlarmConfig>,
}

fn default_mechanism_debounce_s() -> f64 {
    DEFAULT_MECHANISM_DEBOUNCE_S
}

/// Resolved tag names of a mechanism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismTags {
    pub enable: String,
    pub run_fb: String,
    pub trip_fb: String,
    pub run_cmd: String,
    pub status: String,
}

/// Key of the latching TRIP alarm every mechanism carries.
pub const TRIP_ALARM_KEY: &str = "trip";

impl MechanismConfig {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            debounce_s: DEFAULT_MECHANISM_DEBOUNCE_S,
            enable_tag: None,
            run_fb_tag: None,
            trip_fb_tag: None,
            run_cmd_tag: None,
            status_tag: None,
            alarms: Vec::new(),
        }
    }

    pub fn tags(&self) -> MechanismTags {
        let pick = |tag: &Option<String>, suffix: &str| {
            tag.clone()
                .unwrap_or_else(|| format!("{}:{suffix}", self.id))
        };
        MechanismTags {
            enable: pick(&self.enable_tag, "ENABLE"),
            run_fb: pick(&self.run_fb_tag, "RUN_FB"),
            trip_fb: pick(&self.trip_fb_tag, "TRIP_FB"),
            run_cmd: pick(&self.run_cmd_tag, "RUN_CMD"),
            status: pick(&self.status_tag, "STATUS"),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        check_window("debounce_s", self.debounce_s).map_err(|e| e.to_string())?;
        let mut keys = HashSet::from([TRIP_ALARM_KEY]);
        for alarm in &self.alarms {
            if !keys.insert(alarm.key.as_str()) {
                return Err(format!("duplicate alarm key '{}'", alarm.key));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigLoader;

    const MINIMAL: &str = r#"
[shared]
service_name = "tank-farm"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = PlantConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.scan.period_s, DEFAULT_SCAN_PERIOD_S);
        assert_eq!(config.scan.mode, ScanMode::Simulated);
        assert!(config.scan.max_scans.is_none());
        assert!(config.sensors.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn sensor_defaults() {
        let sensor = SensorConfig::new("LT_101", "LT_101:PV");
        let cov = sensor.cov();
        assert_eq!(cov.deadband_abs, Some(DEFAULT_SENSOR_DEADBAND_ABS));
        assert_eq!(cov.deadband_pct, None);
        assert_eq!(cov.min_interval_s, DEFAULT_SENSOR_MIN_INTERVAL_S);
    }

    #[test]
    fn rejects_non_positive_period() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        config.scan.period_s = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn rejects_duplicate_ids_across_kinds() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        config.sensors.push(SensorConfig::new("X_1", "X_1:PV"));
        config.actuators.push(ActuatorConfig::new("X_1", "X_1:RUN"));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate device id"));
    }

    #[test]
    fn rejects_condition_on_unknown_sensor() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        let mut pump = ActuatorConfig::new("P_101", "P_101:RUN");
        pump.permissives
            .push(Condition::threshold_ge("suction", "LT_999", 0.5));
        config.actuators.push(pump);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LT_999"));
    }

    #[test]
    fn rejects_unknown_point_inside_composite_condition() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        let mut pump = ActuatorConfig::new("P_101", "P_101:RUN");
        pump.interlocks.push(Condition::latched(
            "discharge",
            crate::control::condition::ConditionKind::WithinBand {
                point: "PT_999".into(),
                lo: 1.0,
                hi: 9.0,
            },
        ));
        config.actuators.push(pump);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("PT_999"));
    }

    #[test]
    fn rejects_negative_dwell() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        let mut pump = ActuatorConfig::new("P_101", "P_101:RUN");
        pump.permissives.push(Condition::dwell(
            "seal water",
            crate::control::condition::ConditionKind::Flag { tag: "SEAL_OK".into() },
            -5.0,
        ));
        config.actuators.push(pump);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dwell_ms"));
    }

    #[test]
    fn flag_conditions_need_no_sensor() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        let mut pump = ActuatorConfig::new("P_101", "P_101:RUN");
        pump.interlocks.push(Condition::flag("estop", "ESTOP_OK"));
        config.actuators.push(pump);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_deadband_and_debounce() {
        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        let mut sensor = SensorConfig::new("LT_101", "LT_101:PV");
        sensor.deadband_abs = Some(-1.0);
        config.sensors.push(sensor);
        assert!(config.validate().is_err());

        let mut config = PlantConfig::from_toml(MINIMAL).unwrap();
        let mut pump = ActuatorConfig::new("P_101", "P_101:RUN");
        pump.debounce_s = -0.1;
        config.actuators.push(pump);
        assert!(config.validate().is_err());
    }

    #[test]
    fn mechanism_tags_default_from_id() {
        let mut mech = MechanismConfig::new("PKG_1");
        mech.status_tag = Some("HMI:PKG_1".into());
        let tags = mech.tags();
        assert_eq!(tags.enable, "PKG_1:ENABLE");
        assert_eq!(tags.run_fb, "PKG_1:RUN_FB");
        assert_eq!(tags.status, "HMI:PKG_1");
        assert_eq!(mech.debounce_s, DEFAULT_MECHANISM_DEBOUNCE_S);
    }

    #[test]
    fn mechanism_rejects_duplicate_or_reserved_alarm_key() {
        let alarm = |key: &str| AlarmConfig {
            key: key.into(),
            text: "x".into(),
            severity: Severity::Warn,
            latching: false,
            tag: "T".into(),
        };
        let mut mech = MechanismConfig::new("PKG_1");
        mech.alarms.push(alarm(TRIP_ALARM_KEY));
        assert!(mech.validate().is_err());

        let mut mech = MechanismConfig::new("PKG_1");
        mech.alarms.push(alarm("hi_temp"));
        mech.alarms.push(alarm("hi_temp"));
        assert!(mech.validate().is_err());
    }

    #[test]
    fn full_document_parses() {
        let config = PlantConfig::from_toml(
            r#"
[shared]
service_name = "tank-farm"
log_level = "debug"

[scan]
period_s = 0.25
mode = "realtime"
max_scans = 40

[[sensors]]
id = "LT_101"
tag = "LT_101:PV"
eu = "m"
deadband_pct = 2.0
scaling = { k = 0.01, b = 0.0 }
limits = { lo = 0.0, hi = 5.0 }

[[actuators]]
id = "P_101"
output_tag = "P_101:RUN"
mode = "LOCAL"
debounce_s = 0.5
permissives = [{ name = "suction level", kind = "threshold_ge", point = "LT_101", threshold = 0.5 }]
interlocks = [{ name = "estop healthy", kind = "flag", tag = "ESTOP_OK" }]

[[mechanisms]]
id = "PKG_1"
alarms = [{ key = "hi_temp", text = "High temperature", severity = "WARN", tag = "TT_1:HI" }]

[io]
"LT_101:PV" = 120.0
"ESTOP_OK" = true
"#,
        )
        .unwrap();

        assert_eq!(config.scan.mode, ScanMode::Realtime);
        assert_eq!(config.scan.max_scans, Some(40));
        assert_eq!(config.sensors[0].deadband_abs, Some(DEFAULT_SENSOR_DEADBAND_ABS));
        assert_eq!(config.sensors[0].deadband_pct, Some(2.0));
        assert_eq!(config.actuators[0].mode, Mode::Local);
        assert_eq!(config.actuators[0].interlocks.len(), 1);
        assert_eq!(config.mechanisms[0].alarms[0].severity, Severity::Warn);
        assert!(!config.mechanisms[0].alarms[0].latching);
        assert_eq!(config.io["ESTOP_OK"], IoValue::Bool(true));
        assert!(config.validate().is_ok());
    }
}
