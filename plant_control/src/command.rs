//! Command processing root.
//!
//! Mode arbitration and setpoint validation ahead of device-specific
//! handling, and the debounced per-device command queue.

pub mod arbitration;
pub mod queue;
