//! Integration test: plant configuration file → validated config → running
//! plant on the simulated clock.

use std::io::Write;

use plant_common::config::ConfigError;
use plant_common::control::command::{Command, CommandKind};
use plant_common::control::state::LifecycleState;
use plant_control::config::{build_runner, load_plant, SetupError};
use plant_control::event::MemorySink;
use plant_control::io::{IoBus, IoValue};
use tempfile::NamedTempFile;

const PLANT_TOML: &str = r#"
[shared]
service_name = "tank-farm-01"
log_level = "debug"

[scan]
period_s = 0.5
mode = "simulated"
max_scans = 10

[[sensors]]
id = "LT_101"
tag = "LT_101:PV"
eu = "m"
deadband_abs = 0.05
min_interval_s = 1.0

[[actuators]]
id = "P_101"
output_tag = "P_101:RUN"
permissives = [
    { name = "suction level", kind = "threshold_ge", point = "LT_101", threshold = 0.5 },
]
interlocks = [
    { name = "estop healthy", kind = "flag", tag = "ESTOP_OK" },
    { name = "level in band", kind = "within_band", point = "LT_101", lo = 0.2, hi = 4.0 },
]

[[mechanisms]]
id = "TRANSFER"
run_fb_tag = "P_101:RUN"

[io]
"LT_101:PV" = 1.8
ESTOP_OK = true
"#;

fn write_config(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn configured_plant_runs_pump_and_mechanism() {
    let file = write_config(PLANT_TOML);
    let config = load_plant(file.path()).unwrap();
    assert_eq!(config.scan.max_scans, Some(10));

    let sink = MemorySink::new();
    let mut runner = build_runner(&config, Box::new(sink.clone())).unwrap();
    runner.run(1).unwrap();

    assert!(runner.submit(Command::new("P_101", CommandKind::Start)).ok);
    assert!(runner.submit(Command::new("TRANSFER", CommandKind::Start)).ok);
    runner.run(2).unwrap();

    assert_eq!(runner.io().read("P_101:RUN"), Some(IoValue::Bool(true)));
    // The mechanism sees the pump running as its run feedback.
    assert_eq!(
        runner.mechanism("TRANSFER").unwrap().state(),
        LifecycleState::Running
    );

    // Level leaves the interlock band: pump faults.
    runner.io_mut().write("LT_101:PV", IoValue::Float(0.1));
    runner.run(3).unwrap();
    assert_eq!(runner.actuator("P_101").unwrap().status().state, "FAULT");
    assert!(!runner.io().read_bool("P_101:RUN"));
    assert_eq!(runner.stats().scan_count, 6);
    assert!(!sink.events("point_published").is_empty());
}

#[test]
fn invalid_reference_rejected_at_load() {
    let bad = PLANT_TOML.replace(r#"point = "LT_101", threshold"#, r#"point = "LT_999", threshold"#);
    let file = write_config(&bad);
    let err = load_plant(file.path()).unwrap_err();
    match err {
        SetupError::Config(ConfigError::ValidationError(msg)) => assert!(msg.contains("LT_999")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn duplicate_ids_rejected() {
    let bad = PLANT_TOML.replace(r#"id = "TRANSFER""#, r#"id = "P_101""#);
    let file = write_config(&bad);
    assert!(matches!(
        load_plant(file.path()),
        Err(SetupError::Config(ConfigError::ValidationError(_)))
    ));
}

#[test]
fn shipped_sample_config_builds() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/plant.toml");
    let config = load_plant(&path).unwrap();
    let mut runner = build_runner(&config, Box::new(MemorySink::new())).unwrap();
    runner.run(4).unwrap();
    // Enable tag is set in the sample, so the mechanism has been asked to start.
    assert_ne!(
        runner.mechanism("TRANSFER").unwrap().state(),
        LifecycleState::Idle
    );
}

const STAGED_PUMP_TOML: &str = r#"
[shared]
service_name = "booster-station"

[scan]
period_s = 0.5

[[actuators]]
id = "P_201"
output_tag = "P_201:RUN"
permissives = [
    { name = "seal water", kind = "dwell", dwell_ms = 1000.0, inner = { kind = "flag", tag = "SEAL_OK" } },
]
interlocks = [
    { name = "motor overload", kind = "latched", inner = { kind = "flag", tag = "OL_OK" } },
]

[io]
SEAL_OK = true
OL_OK = true
"#;

#[test]
fn configured_dwell_and_latched_conditions_gate_pump() {
    let file = write_config(STAGED_PUMP_TOML);
    let config = load_plant(file.path()).unwrap();
    let mut runner = build_runner(&config, Box::new(MemorySink::new())).unwrap();
    let state = |r: &plant_control::cycle::ScanRunner| r.actuator("P_201").unwrap().status().state;

    assert!(runner.submit(Command::new("P_201", CommandKind::Start)).ok);
    runner.run(2).unwrap();
    assert_eq!(state(&runner), "OFF");
    runner.run(1).unwrap();
    assert_eq!(state(&runner), "RUNNING");

    runner.io_mut().write("OL_OK", IoValue::Bool(false));
    runner.run(1).unwrap();
    assert_eq!(state(&runner), "FAULT");

    runner.io_mut().write("OL_OK", IoValue::Bool(true));
    runner.run(1).unwrap();
    assert_eq!(state(&runner), "FAULT");

    assert!(runner.submit(Command::new("P_201", CommandKind::Reset)).ok);
    runner.run(1).unwrap();
    assert_eq!(state(&runner), "OFF");
}
