//! Plant configuration loading and runner assembly.
//!
//! Loads a [`PlantConfig`] from TOML, validates it, and builds a
//! [`ScanRunner`] with the configured clock, simulated I/O image and devices.

use std::path::Path;

use plant_common::config::{ConfigError, ConfigLoader};
use plant_common::consts::DEFAULT_SIM_MAX_SCANS;
use plant_common::control::config::{PlantConfig, ScanConfig, ScanMode};
use plant_common::control::error::ContractError;
use thiserror::Error;
use tracing::info;

use crate::clock::{ClockError, RealTimeClock, ScanClock, SimClock};
use crate::cycle::ScanRunner;
use crate::device::level::LevelSensor;
use crate::device::onoff::OnOffActuator;
use crate::event::EventSink;
use crate::io::SimIo;
use crate::mechanism::Mechanism;

// ─── Error Type ─────────────────────────────────────────────────────

/// Failure while turning a configuration into a running plant.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("device '{id}': {source}")]
    Device {
        id: String,
        #[source]
        source: ContractError,
    },

    #[error(transparent)]
    Clock(#[from] ClockError),
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate a plant configuration file.
pub fn load_plant(path: &Path) -> Result<PlantConfig, SetupError> {
    let config = PlantConfig::load(path)?;
    config.validate()?;
    Ok(config)
}

/// Parse and validate a plant configuration from a TOML string.
pub fn load_plant_from_str(toml: &str) -> Result<PlantConfig, SetupError> {
    let config = PlantConfig::from_toml(toml)?;
    config.validate()?;
    Ok(config)
}

// ─── Assembly ───────────────────────────────────────────────────────

/// Clock for the configured scan mode.
pub fn build_clock(scan: &ScanConfig) -> Result<Box<dyn ScanClock>, SetupError> {
    Ok(match scan.mode {
        ScanMode::Simulated => Box::new(
            SimClock::starting_at(scan.period_s, scan.start_s).map_err(ClockError::from)?,
        ),
        ScanMode::Realtime => Box::new(RealTimeClock::new(scan.period_s)?),
    })
}

/// Number of scans to run.
///
/// `requested` overrides `[scan].max_scans`. With neither set, a real-time
/// plant runs indefinitely and a simulated one stops after
/// [`DEFAULT_SIM_MAX_SCANS`], since its clock never waits.
pub fn scan_limit(scan: &ScanConfig, requested: Option<u64>) -> u64 {
    match (requested.or(scan.max_scans), scan.mode) {
        (Some(n), _) => n,
        (None, ScanMode::Simulated) => DEFAULT_SIM_MAX_SCANS,
        (None, ScanMode::Realtime) => u64::MAX,
    }
}

/// Build a runner for a validated configuration.
pub fn build_runner(config: &PlantConfig, sink: Box<dyn EventSink>) -> Result<ScanRunner, SetupError> {
    let clock = build_clock(&config.scan)?;
    let io = SimIo::with_values(config.io.clone());
    let mut runner = ScanRunner::new(clock, Box::new(io), sink);

    for s in &config.sensors {
        let sensor = LevelSensor::from_config(s).map_err(|source| SetupError::Device {
            id: s.id.clone(),
            source,
        })?;
        runner.add_sensor(Box::new(sensor));
    }
    for a in &config.actuators {
        let actuator = OnOffActuator::from_config(a).map_err(|source| SetupError::Device {
            id: a.id.clone(),
            source,
        })?;
        runner.add_actuator(Box::new(actuator));
    }
    for m in &config.mechanisms {
        let mechanism = Mechanism::from_config(m).map_err(|source| SetupError::Device {
            id: m.id.clone(),
            source,
        })?;
        runner.add_mechanism(mechanism);
    }

    info!(
        service = %config.shared.service_name,
        mode = ?config.scan.mode,
        period_s = config.scan.period_s,
        sensors = config.sensors.len(),
        actuators = config.actuators.len(),
        mechanisms = config.mechanisms.len(),
        "plant assembled"
    );
    Ok(runner)
}
