//! Integration test: on/off pump gated by a level permissive and an
//! emergency-stop interlock, driven through the scan runner.

use plant_common::control::command::{AckCode, Command, CommandKind};
use plant_common::control::condition::Condition;
use plant_common::control::state::DeviceFlags;
use plant_control::clock::SimClock;
use plant_control::cycle::ScanRunner;
use plant_control::device::level::{AnalogSource, LevelSensor};
use plant_control::device::onoff::OnOffActuator;
use plant_control::event::MemorySink;
use plant_control::io::{IoBus, IoValue, SimIo};

fn plant(sink: &MemorySink) -> ScanRunner {
    let mut io = SimIo::new();
    io.set("LT_101:PV", 2.0);
    io.set("ESTOP_OK", true);

    let mut runner = ScanRunner::new(
        Box::new(SimClock::new(0.5).unwrap()),
        Box::new(io),
        Box::new(sink.clone()),
    );
    runner.add_sensor(Box::new(LevelSensor::new(
        "LT_101",
        AnalogSource::tag("LT_101:PV"),
    )));

    let mut pump = OnOffActuator::new("P_101", "P_101:RUN", 0.0).unwrap();
    pump.add_permissive(Condition::threshold_ge("suction level", "LT_101", 1.0));
    pump.add_interlock(Condition::flag("estop healthy", "ESTOP_OK"));
    runner.add_actuator(Box::new(pump));
    runner
}

fn state(runner: &ScanRunner) -> String {
    runner.actuator("P_101").unwrap().status().state
}

/// One scan, then advance the clock.
fn scan(runner: &mut ScanRunner) {
    runner.run(1).unwrap();
}

#[test]
fn start_interlock_loss_and_reset() {
    let sink = MemorySink::new();
    let mut r = plant(&sink);
    scan(&mut r);

    assert!(r.submit(Command::new("P_101", CommandKind::Start)).ok);
    scan(&mut r);
    assert_eq!(state(&r), "RUNNING");
    assert_eq!(r.io().read("P_101:RUN"), Some(IoValue::Bool(true)));

    r.io_mut().write("ESTOP_OK", IoValue::Bool(false));
    scan(&mut r);
    assert_eq!(state(&r), "FAULT");
    assert_eq!(r.io().read("P_101:RUN"), Some(IoValue::Bool(false)));

    // STOP is accepted but does not leave FAULT.
    assert!(r.submit(Command::new("P_101", CommandKind::Stop)).ok);
    scan(&mut r);
    assert_eq!(state(&r), "FAULT");

    // RESET while the interlock is still lost is consumed without effect.
    assert!(r.submit(Command::new("P_101", CommandKind::Reset)).ok);
    scan(&mut r);
    assert_eq!(state(&r), "FAULT");

    r.io_mut().write("ESTOP_OK", IoValue::Bool(true));
    assert!(r.submit(Command::new("P_101", CommandKind::Reset)).ok);
    scan(&mut r);
    assert_eq!(state(&r), "OFF");

    // Run intent was cleared by the reset.
    scan(&mut r);
    assert_eq!(state(&r), "OFF");

    let reasons: Vec<String> = sink
        .events("state_change")
        .into_iter()
        .filter_map(|e| e.reason)
        .collect();
    assert_eq!(reasons, vec!["start", "interlock lost", "reset"]);
}

#[test]
fn permissive_gates_start_but_not_run() {
    let sink = MemorySink::new();
    let mut r = plant(&sink);

    r.io_mut().write("LT_101:PV", IoValue::Float(0.2));
    scan(&mut r);
    r.submit(Command::new("P_101", CommandKind::Start));
    scan(&mut r);
    assert_eq!(state(&r), "OFF");
    let status = r.actuator("P_101").unwrap().status();
    assert!(!status.flags.contains(DeviceFlags::PERMISSIVES_OK));

    // Level recovers: the pending intent starts the pump.
    r.io_mut().write("LT_101:PV", IoValue::Float(2.0));
    scan(&mut r);
    scan(&mut r);
    assert_eq!(state(&r), "RUNNING");

    // Level drops again while running: pump keeps running.
    r.io_mut().write("LT_101:PV", IoValue::Float(0.1));
    scan(&mut r);
    scan(&mut r);
    assert_eq!(state(&r), "RUNNING");
    let status = r.actuator("P_101").unwrap().status();
    assert!(!status.permissives_ok());
    assert!(status.interlocks_ok());
}

#[test]
fn reset_rejected_outside_fault() {
    let sink = MemorySink::new();
    let mut r = plant(&sink);
    let ack = r.submit(Command::new("P_101", CommandKind::Reset));
    assert_eq!(ack.code, AckCode::Rejected);
}
