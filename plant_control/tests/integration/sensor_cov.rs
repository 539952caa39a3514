//! Integration test: level sensor COV publication across scans, including
//! sample failures.

use std::cell::Cell;
use std::rc::Rc;

use plant_common::control::point::{CovRule, Point, Quality};
use plant_control::clock::{ScanClock, SimClock};
use plant_control::cov::should_publish;
use plant_control::device::level::{AnalogSource, LevelSensor, SampleError};
use plant_control::device::Sensor;
use plant_control::io::SimIo;

#[test]
fn slow_ramp_publishes_at_deadband_steps() {
    let level = Rc::new(Cell::new(0.0));
    let reader = Rc::clone(&level);
    let mut sensor = LevelSensor::new("LT_201", AnalogSource::func(move || Ok(reader.get())))
        .with_cov(CovRule::absolute(0.1).with_min_interval(0.0));
    let io = SimIo::new();
    let mut clk = SimClock::new(0.5).unwrap();

    let mut published = 0;
    for step in 0..20 {
        level.set(step as f64 * 0.03);
        if sensor.update(&clk, &io) {
            published += 1;
        }
        clk.sleep_until_next_scan().unwrap();
    }

    // Baseline 0.0, then 0.12, 0.24, 0.36, 0.48.
    assert_eq!(published, 5);
    let last = sensor.point().unwrap().value().as_f64().unwrap();
    assert!((last - 0.48).abs() < 1e-9);
}

#[test]
fn failed_reads_hold_value_and_flag_bad() {
    let healthy = Rc::new(Cell::new(true));
    let flag = Rc::clone(&healthy);
    let mut sensor = LevelSensor::new(
        "LT_202",
        AnalogSource::func(move || {
            if flag.get() {
                Ok(3.5)
            } else {
                Err(SampleError::Failed("transmitter offline".into()))
            }
        }),
    );
    let io = SimIo::new();
    let mut clk = SimClock::new(0.5).unwrap();

    assert!(sensor.update(&clk, &io));
    clk.tick(1).unwrap();

    healthy.set(false);
    assert!(sensor.update(&clk, &io));
    let p = sensor.point().unwrap();
    assert_eq!(p.quality(), Quality::Bad);
    assert_eq!(p.value().as_f64(), Some(3.5));
    assert_eq!(sensor.status().state, "BAD");
    assert_eq!(sensor.failed_reads(), 1);

    // Still failing: same quality and same held value.
    clk.tick(1).unwrap();
    assert!(!sensor.update(&clk, &io));

    healthy.set(true);
    clk.tick(1).unwrap();
    assert!(sensor.update(&clk, &io));
    assert_eq!(sensor.point().unwrap().quality(), Quality::Good);
    assert!(sensor.point().unwrap().ts_mono() <= clk.now());
}

#[test]
fn quality_change_always_publishes_for_any_rule() {
    let rules = [
        CovRule::absolute(0.0),
        CovRule::absolute(1e6),
        CovRule::absolute(1e6).with_min_interval(1e6),
        CovRule::default().with_percent(99.0).with_min_interval(10.0),
    ];
    let pairs = [(0.0, 0.0), (1.0, 1.0), (-5.0, 5.0), (100.0, 100.01)];
    for rule in rules {
        for (prev_v, cur_v) in pairs {
            for (q_prev, q_cur) in [(Quality::Good, Quality::Bad), (Quality::Stale, Quality::Good)] {
                let prev = Point::analog("X", prev_v, 0.0).with_cov(rule).with_quality(q_prev);
                let cur = Point::analog("X", cur_v, 0.01).with_cov(rule).with_quality(q_cur);
                assert!(should_publish(&cur, Some(&prev), 0.01));
            }
        }
    }
}
