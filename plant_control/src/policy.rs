//! Safety-logic primitives.
//!
//! Pure gates (dwell, hysteresis, latch), quality-aware point predicates,
//! and evaluation of named permissive/interlock conditions against a
//! per-scan input snapshot.

pub mod condition;
pub mod gates;
pub mod points;
