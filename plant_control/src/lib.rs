//! # Plant Control Library
//!
//! Scan-cycle control engine for small industrial plants: tank levels,
//! pumps, valves and the supervised units built from them. A single scan
//! loop, paced by a [`clock::ScanClock`], samples sensors, publishes
//! points on change of value, drives actuator state machines gated by
//! permissives and interlocks, and supervises mechanisms through alarms and
//! a run/stop lifecycle.
//!
//! ## Layers
//!
//! 1. **Clock**: simulated or period-aligned real-time metronome
//! 2. **Points**: COV publication of sampled measurements
//! 3. **Policy**: dwell, hysteresis, latched trips, named conditions
//! 4. **Commands**: mode arbitration, setpoint validation, debounced queue
//! 5. **Devices**: sensors and actuators over an I/O boundary
//! 6. **Supervision**: alarm panel, plant lifecycle, mechanisms
//!
//! Everything runs on one thread. The only blocking call is the real-time
//! clock's wait for the next scan.

#![deny(clippy::disallowed_types)]

pub mod alarm;
pub mod clock;
pub mod command;
pub mod config;
pub mod cov;
pub mod cycle;
pub mod device;
pub mod event;
pub mod io;
pub mod lifecycle;
pub mod mechanism;
pub mod policy;
