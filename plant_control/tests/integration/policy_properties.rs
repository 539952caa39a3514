//! Integration test: timing and latching properties of the policy
//! primitives and the command queue, driven by the simulated clock.

use plant_common::control::command::{Command, CommandKind};
use plant_control::clock::{ScanClock, SimClock};
use plant_control::command::queue::CommandQueue;
use plant_control::policy::gates::{hysteresis_ok, DwellTimer, Hysteresis, LatchedTrip};

#[test]
fn dwell_confirms_after_500ms_of_continuous_truth() {
    let mut clk = SimClock::new(0.25).unwrap();
    let mut dwell = DwellTimer::new(500.0);

    assert!(!dwell.update(true, clk.now()));
    clk.tick(1).unwrap();
    assert!(!dwell.update(true, clk.now()));
    clk.tick(1).unwrap();
    assert!(dwell.update(true, clk.now()));
    clk.tick(1).unwrap();
    assert!(dwell.update(true, clk.now()));

    // A single false sample restarts the window.
    assert!(!dwell.update(false, clk.now()));
    clk.tick(1).unwrap();
    assert!(!dwell.update(true, clk.now()));
    assert_eq!(dwell.since(), Some(clk.now()));
}

#[test]
fn hysteresis_has_no_chatter() {
    assert!(!hysteresis_ok(false, 21.9, 20.0, 2.0, 3.0));
    assert!(hysteresis_ok(false, 22.0, 20.0, 2.0, 3.0));
    assert!(hysteresis_ok(true, 17.5, 20.0, 2.0, 3.0));
    assert!(!hysteresis_ok(true, 17.0, 20.0, 2.0, 3.0));

    // A noisy signal around the nominal threshold switches exactly twice.
    let mut h = Hysteresis::new(20.0, 2.0, 3.0);
    let signal = [19.0, 20.5, 21.0, 22.5, 21.0, 19.5, 18.0, 17.5, 16.9, 18.0, 21.9];
    let mut switches = 0;
    let mut prev = h.is_ok();
    for v in signal {
        let now = h.update(v);
        if now != prev {
            switches += 1;
        }
        prev = now;
    }
    assert_eq!(switches, 2);
    assert!(!h.is_ok());
}

#[test]
fn latched_trip_is_monotonic_until_reset() {
    let mut trip = LatchedTrip::new();
    let inputs = [false, false, true, false, false, false];
    let outputs: Vec<bool> = inputs.iter().map(|&c| trip.eval(c)).collect();
    assert_eq!(outputs, vec![false, false, true, true, true, true]);

    trip.reset();
    assert!(!trip.eval(false));
    assert!(trip.eval_any([false, true, false]));
    assert!(trip.is_tripped());
}

#[test]
fn queue_debounce_accepts_first_and_third() {
    let mut queue = CommandQueue::new(0.5).unwrap();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for ts in [10.0, 10.3, 10.6] {
        let cmd = Command::new("P_101", CommandKind::Start).at(ts);
        if queue.push(cmd) {
            accepted.push(ts);
        } else {
            rejected.push(ts);
        }
    }
    assert_eq!(accepted, vec![10.0, 10.6]);
    assert_eq!(rejected, vec![10.3]);
    assert_eq!(queue.len(), 2);
}
