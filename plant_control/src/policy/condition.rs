//! Evaluation of named conditions against a per-scan snapshot.
//!
//! A [`Snapshot`] holds immutable copies of the last published points and
//! the binary I/O flags read this scan. Conditions never see a device while
//! it is updating, only what it last published.
//!
//! Dwell, hysteresis and latched conditions keep a [`ConditionState`] per
//! registered condition inside their [`ConditionSet`].

use std::collections::HashMap;

use plant_common::control::condition::{Condition, ConditionKind};
use plant_common::control::point::Point;

use super::gates::{all_true, any_true, DwellTimer, Hysteresis, LatchedTrip};
use super::points;

/// Inputs visible to condition evaluation during one scan.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    points: HashMap<String, Point>,
    flags: HashMap<String, bool>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the last published sample of a point, replacing any older one.
    pub fn insert_point(&mut self, point: Point) {
        self.points.insert(point.id().to_string(), point);
    }

    pub fn set_flag(&mut self, tag: impl Into<String>, value: bool) {
        self.flags.insert(tag.into(), value);
    }

    pub fn point(&self, id: &str) -> Option<&Point> {
        self.points.get(id)
    }

    /// Missing flags read as `false`.
    pub fn flag(&self, tag: &str) -> bool {
        self.flags.get(tag).copied().unwrap_or(false)
    }

    pub fn clear(&mut self) {
        self.points.clear();
        self.flags.clear();
    }
}

// ─── Evaluation ─────────────────────────────────────────────────────

/// Leaf kinds against the snapshot. A missing point fails the condition.
fn leaf(kind: &ConditionKind, snapshot: &Snapshot) -> bool {
    if let ConditionKind::Flag { tag } = kind {
        return snapshot.flag(tag);
    }
    let Some(point) = kind.point().and_then(|id| snapshot.point(id)) else {
        return false;
    };
    match kind {
        ConditionKind::ThresholdGe { threshold, .. } => points::threshold_ge(point, *threshold),
        ConditionKind::WithinBand { lo, hi, .. } => points::within_band(point, *lo, *hi),
        ConditionKind::GoodBool { .. } => points::good_bool(point),
        ConditionKind::DiscreteIs { state, .. } => points::discrete_is(point, *state),
        ConditionKind::DiscreteIn { states, .. } => points::discrete_in(point, states),
        _ => false,
    }
}

/// Per-condition state carried across scans, shaped like its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionState {
    Leaf,
    Dwell {
        timer: DwellTimer,
        inner: Box<ConditionState>,
    },
    Hysteresis(Hysteresis),
    Latched {
        trip: LatchedTrip,
        inner: Box<ConditionState>,
    },
    AnyOf(Vec<ConditionState>),
}

impl ConditionState {
    /// Fresh state for `kind`: timers idle, comparators off, latches clear.
    pub fn new(kind: &ConditionKind) -> Self {
        match kind {
            ConditionKind::Dwell { inner, dwell_ms } => Self::Dwell {
                timer: DwellTimer::new(*dwell_ms),
                inner: Box::new(Self::new(inner)),
            },
            ConditionKind::Hysteresis {
                min_on,
                h_up,
                h_down,
                ..
            } => Self::Hysteresis(Hysteresis::new(*min_on, *h_up, *h_down)),
            ConditionKind::Latched { inner } => Self::Latched {
                trip: LatchedTrip::new(),
                inner: Box::new(Self::new(inner)),
            },
            ConditionKind::AnyOf { any } => Self::AnyOf(any.iter().map(Self::new).collect()),
            _ => Self::Leaf,
        }
    }

    /// Evaluate `kind` at `now`, advancing this state.
    ///
    /// Every child is evaluated each call so timers and latches never miss
    /// a scan.
    pub fn eval(&mut self, kind: &ConditionKind, snapshot: &Snapshot, now: f64) -> bool {
        match (kind, self) {
            (ConditionKind::Dwell { inner: k, .. }, Self::Dwell { timer, inner }) => {
                let held = inner.eval(k, snapshot, now);
                timer.update(held, now)
            }
            (ConditionKind::Hysteresis { point, .. }, Self::Hysteresis(h)) => {
                match snapshot
                    .point(point)
                    .filter(|p| points::is_good(p))
                    .and_then(|p| p.eng())
                {
                    Some(measured) => h.update(measured),
                    None => {
                        h.reset();
                        false
                    }
                }
            }
            (ConditionKind::Latched { inner: k }, Self::Latched { trip, inner }) => {
                let ok = inner.eval(k, snapshot, now);
                !trip.eval(!ok)
            }
            (ConditionKind::AnyOf { any }, Self::AnyOf(states)) => any_true(
                any.iter()
                    .zip(states.iter_mut())
                    .map(|(k, state)| move || state.eval(k, snapshot, now)),
            ),
            (kind, _) => leaf(kind, snapshot),
        }
    }

    /// Clear every latch below this state.
    pub fn reset_latches(&mut self) {
        match self {
            Self::Latched { trip, inner } => {
                trip.reset();
                inner.reset_latches();
            }
            Self::Dwell { inner, .. } => inner.reset_latches(),
            Self::AnyOf(states) => states.iter_mut().for_each(Self::reset_latches),
            Self::Leaf | Self::Hysteresis(_) => {}
        }
    }
}

/// One-shot evaluation with fresh state.
///
/// Leaf kinds give their steady answer. Stateful kinds answer as on their
/// first scan: a dwell is satisfied only with `dwell_ms == 0`.
pub fn evaluate(kind: &ConditionKind, snapshot: &Snapshot) -> bool {
    ConditionState::new(kind).eval(kind, snapshot, 0.0)
}

// ─── Condition Sets ─────────────────────────────────────────────────

/// Registered permissives or interlocks of one device, with the state their
/// stateful conditions carry between scans.
#[derive(Debug, Clone, Default)]
pub struct ConditionSet {
    conditions: Vec<Condition>,
    states: Vec<ConditionState>,
    /// Result of each condition at the last [`ConditionSet::all_ok`].
    last: Vec<bool>,
}

impl ConditionSet {
    pub fn new(conditions: Vec<Condition>) -> Self {
        let mut set = Self::default();
        for condition in conditions {
            set.push(condition);
        }
        set
    }

    pub fn push(&mut self, condition: Condition) {
        self.states.push(ConditionState::new(&condition.kind));
        self.last.push(false);
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// I/O tags read by `flag` conditions, nested ones included.
    pub fn flag_tags(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().flat_map(|c| c.kind.flag_tags())
    }

    /// Evaluate every condition at `now`. Vacuously true when empty.
    pub fn all_ok(&mut self, snapshot: &Snapshot, now: f64) -> bool {
        let results = self.conditions.iter().zip(self.states.iter_mut());
        for ((condition, state), ok) in results.zip(self.last.iter_mut()) {
            *ok = state.eval(&condition.kind, snapshot, now);
        }
        all_true(self.last.iter().map(|&ok| move || ok))
    }

    /// Names of conditions that failed at the last evaluation, in
    /// registration order.
    pub fn failing(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .zip(&self.last)
            .filter(|(_, ok)| !**ok)
            .map(|(c, _)| c.name.as_str())
            .collect()
    }

    /// Clear latched conditions so they can hold again once their input
    /// recovers.
    pub fn reset_latches(&mut self) {
        self.states.iter_mut().for_each(ConditionState::reset_latches);
    }
}
