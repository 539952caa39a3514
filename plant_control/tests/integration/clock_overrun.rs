//! Integration test: real-time clock overrun handling.

use std::cell::RefCell;
use std::rc::Rc;

use plant_control::clock::{RealTimeClock, ScanClock};

#[test]
fn forced_overrun_reports_once_and_skips_ahead() {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let observer = Rc::clone(&calls);
    let mut clk = RealTimeClock::new(0.02)
        .unwrap()
        .with_overrun_observer(move |behind, now| observer.borrow_mut().push((behind, now)));

    let now = clk.now();
    clk.set_next_deadline(now - 0.1);
    clk.sleep_until_next_scan().unwrap();

    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].0 > 0.0);
    assert!(clk.next_deadline() > clk.now());
    assert_eq!(clk.overruns(), 1);
}

#[test]
fn on_time_waits_keep_period_alignment() {
    let mut clk = RealTimeClock::new(0.005).unwrap();
    let first = clk.next_deadline();
    for n in 1..=3 {
        clk.sleep_until_next_scan().unwrap();
        let expected = first + n as f64 * 0.005;
        // Either on time or skipped forward by whole periods.
        let periods = (clk.next_deadline() - expected) / 0.005;
        assert!(periods > -1e-6);
        assert!((periods - periods.round()).abs() < 1e-6);
    }
    assert!(clk.now() >= first);
}
