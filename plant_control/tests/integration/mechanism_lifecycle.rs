//! Integration test: a mechanism supervised through its I/O tags.
//!
//! Field feedback is simulated by echoing the run command into the run
//! feedback tag between scans.

use plant_common::control::command::{Command, CommandKind};
use plant_common::control::config::{AlarmConfig, MechanismConfig};
use plant_common::control::state::{LifecycleState, Severity};
use plant_control::clock::SimClock;
use plant_control::cycle::ScanRunner;
use plant_control::event::{EventLevel, MemorySink};
use plant_control::io::{IoBus, IoValue, SimIo};
use plant_control::mechanism::Mechanism;

fn plant(sink: &MemorySink) -> ScanRunner {
    let mut config = MechanismConfig::new("MIXER");
    config.alarms.push(AlarmConfig {
        key: "hi_temp".into(),
        text: "Motor temperature high".into(),
        severity: Severity::Warn,
        latching: false,
        tag: "TT_7:HI".into(),
    });
    let mut runner = ScanRunner::new(
        Box::new(SimClock::new(0.5).unwrap()),
        Box::new(SimIo::new()),
        Box::new(sink.clone()),
    );
    runner.add_mechanism(Mechanism::from_config(&config).unwrap());
    runner
}

/// Echo the run command into the feedback tag, like a motor starter would.
fn field_echo(r: &mut ScanRunner) {
    let running = r.io().read_bool("MIXER:RUN_CMD");
    r.io_mut().write("MIXER:RUN_FB", IoValue::Bool(running));
}

fn scan(r: &mut ScanRunner) {
    r.run(1).unwrap();
    field_echo(r);
}

fn state(r: &ScanRunner) -> LifecycleState {
    r.mechanism("MIXER").unwrap().state()
}

#[test]
fn two_start_stop_cycles_via_enable() {
    let sink = MemorySink::new();
    let mut r = plant(&sink);

    for cycle in 1..=2u64 {
        r.io_mut().write("MIXER:ENABLE", IoValue::Bool(true));
        scan(&mut r);
        assert_eq!(state(&r), LifecycleState::Starting);
        scan(&mut r);
        assert_eq!(state(&r), LifecycleState::Running);

        r.io_mut().write("MIXER:ENABLE", IoValue::Bool(false));
        scan(&mut r);
        assert_eq!(state(&r), LifecycleState::Stopping);
        scan(&mut r);
        assert_eq!(state(&r), LifecycleState::Stopped);
        assert_eq!(r.mechanism("MIXER").unwrap().lifecycle().cycles(), cycle);
    }
    assert_eq!(
        r.io().read("MIXER:STATUS"),
        Some(IoValue::Text("STOPPED".into()))
    );
}

#[test]
fn trip_ack_reset_sequence() {
    let sink = MemorySink::new();
    let mut r = plant(&sink);

    assert!(r.submit(Command::new("MIXER", CommandKind::Start)).ok);
    scan(&mut r);
    scan(&mut r);
    assert_eq!(state(&r), LifecycleState::Running);

    r.io_mut().write("MIXER:TRIP_FB", IoValue::Bool(true));
    scan(&mut r);
    assert_eq!(state(&r), LifecycleState::Fault);
    assert!(!r.io().read_bool("MIXER:RUN_CMD"));

    let fault = sink
        .events("lifecycle_transition")
        .into_iter()
        .find(|e| e.level == EventLevel::Warn)
        .unwrap();
    assert_eq!(fault.reason.as_deref(), Some("MIXER tripped"));

    r.io_mut().write("MIXER:TRIP_FB", IoValue::Bool(false));
    scan(&mut r);
    assert!(r.submit(Command::new("MIXER", CommandKind::Ack)).ok);
    scan(&mut r);
    let trip = r.mechanism("MIXER").unwrap().alarms().get("trip").unwrap();
    assert!(!trip.latched());

    assert!(r.submit(Command::new("MIXER", CommandKind::Reset)).ok);
    scan(&mut r);
    assert_eq!(state(&r), LifecycleState::Idle);

    // A fresh start is possible after the fault cleared.
    assert!(r.submit(Command::new("MIXER", CommandKind::Start)).ok);
    scan(&mut r);
    assert_eq!(state(&r), LifecycleState::Starting);
}

#[test]
fn warning_alarm_does_not_fault() {
    let sink = MemorySink::new();
    let mut r = plant(&sink);
    r.io_mut().write("TT_7:HI", IoValue::Bool(true));
    scan(&mut r);

    let mech = r.mechanism("MIXER").unwrap();
    assert_eq!(mech.state(), LifecycleState::Idle);
    assert!(!mech.alarms().any_trip());
    let unacked: Vec<&str> = mech.alarms().unacked().map(|a| a.key.as_str()).collect();
    assert_eq!(unacked, vec!["hi_temp"]);
}
