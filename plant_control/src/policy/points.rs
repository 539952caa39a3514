//! Quality-aware predicates over points.
//!
//! A point that is not GOOD never satisfies a predicate, so a failed
//! transmitter fails its permissive instead of passing on a frozen value.

use plant_common::control::point::{Discrete, Point};

#[inline]
pub fn is_good(p: &Point) -> bool {
    p.quality().is_good()
}

/// GOOD and engineering value `>= threshold`.
pub fn threshold_ge(p: &Point, threshold: f64) -> bool {
    is_good(p) && p.eng().is_some_and(|v| v >= threshold)
}

/// GOOD and engineering value within `[lo, hi]`.
pub fn within_band(p: &Point, lo: f64, hi: f64) -> bool {
    is_good(p) && p.eng().is_some_and(|v| lo <= v && v <= hi)
}

/// GOOD binary point that is true.
pub fn good_bool(p: &Point) -> bool {
    is_good(p) && p.value().as_bool() == Some(true)
}

/// Both samples GOOD and the count did not go backwards.
pub fn counter_nondecreasing(prev: &Point, curr: &Point) -> bool {
    match (prev.value().as_counter(), curr.value().as_counter()) {
        (Some(p), Some(c)) => is_good(prev) && is_good(curr) && c >= p,
        _ => false,
    }
}

/// Increment between two totalizer samples.
///
/// Zero when either sample is not GOOD, and never negative, so a bad read
/// or a counter rollover is not double counted.
pub fn counter_delta(prev: &Point, curr: &Point) -> i64 {
    if !(is_good(prev) && is_good(curr)) {
        return 0;
    }
    match (prev.value().as_counter(), curr.value().as_counter()) {
        (Some(p), Some(c)) => c.saturating_sub(p).max(0),
        _ => 0,
    }
}

pub fn discrete_is(p: &Point, state: Discrete) -> bool {
    is_good(p) && p.value().as_discrete() == Some(state)
}

pub fn discrete_in(p: &Point, states: &[Discrete]) -> bool {
    is_good(p) && p.value().as_discrete().is_some_and(|s| states.contains(&s))
}
