//! Named safety conditions.
//!
//! Permissives and interlocks are registered as lists of named condition
//! descriptors rather than opaque closures. Each descriptor names the tag or
//! point it inspects, so a condition can be evaluated against an explicit
//! per-scan snapshot of inputs and injected in tests without hidden state.
//!
//! Leaf kinds read one tag or point. `dwell`, `hysteresis`, `latched` and
//! `any_of` carry state across scans; the evaluator owns that state, the
//! descriptor only configures it.

use serde::{Deserialize, Serialize};

use super::point::Discrete;

/// What a condition checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionKind {
    /// A binary I/O flag is true.
    Flag { tag: String },
    /// A GOOD analog point is at or above a threshold.
    ThresholdGe { point: String, threshold: f64 },
    /// A GOOD analog point lies within `[lo, hi]`.
    WithinBand { point: String, lo: f64, hi: f64 },
    /// A GOOD binary point is true.
    GoodBool { point: String },
    /// A GOOD discrete point equals a state.
    DiscreteIs { point: String, state: Discrete },
    /// A GOOD discrete point is one of a set of states.
    DiscreteIn { point: String, states: Vec<Discrete> },
    /// `inner` has held continuously for at least `dwell_ms`.
    Dwell {
        inner: Box<ConditionKind>,
        dwell_ms: f64,
    },
    /// A GOOD analog point through a two-threshold comparator: on at
    /// `min_on + h_up`, off at `min_on - h_down`.
    Hysteresis {
        point: String,
        min_on: f64,
        h_up: f64,
        h_down: f64,
    },
    /// `inner` has not failed since the last latch reset.
    Latched { inner: Box<ConditionKind> },
    /// At least one of `any` holds.
    AnyOf { any: Vec<ConditionKind> },
}

impl ConditionKind {
    /// Point id read directly by this condition. Composite kinds read
    /// through their children; see [`ConditionKind::points`].
    pub fn point(&self) -> Option<&str> {
        match self {
            Self::ThresholdGe { point, .. }
            | Self::WithinBand { point, .. }
            | Self::GoodBool { point }
            | Self::DiscreteIs { point, .. }
            | Self::DiscreteIn { point, .. }
            | Self::Hysteresis { point, .. } => Some(point),
            Self::Flag { .. } | Self::Dwell { .. } | Self::Latched { .. } | Self::AnyOf { .. } => {
                None
            }
        }
    }

    /// Every point id read by this condition and its children.
    pub fn points(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |kind| out.extend(kind.point()));
        out
    }

    /// Every I/O flag tag read by this condition and its children.
    pub fn flag_tags(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.walk(&mut |kind| {
            if let Self::Flag { tag } = kind {
                out.push(tag.as_str());
            }
        });
        out
    }

    /// Reject parameters no input could satisfy sensibly.
    pub fn check(&self) -> Result<(), String> {
        let mut result = Ok(());
        self.walk(&mut |kind| {
            if result.is_err() {
                return;
            }
            result = match kind {
                Self::WithinBand { lo, hi, .. } if lo > hi => {
                    Err(format!("band lo {lo} above hi {hi}"))
                }
                Self::Dwell { dwell_ms, .. } if !(dwell_ms.is_finite() && *dwell_ms >= 0.0) => {
                    Err(format!("dwell_ms must be finite and >= 0, got {dwell_ms}"))
                }
                Self::Hysteresis { h_up, h_down, .. } if *h_up < 0.0 || *h_down < 0.0 => {
                    Err(format!("hysteresis bands must be >= 0, got up {h_up} down {h_down}"))
                }
                Self::AnyOf { any } if any.is_empty() => Err("any_of needs at least one condition".to_string()),
                _ => Ok(()),
            };
        });
        result
    }

    /// Depth-first visit of this kind and every nested kind.
    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Self)) {
        visit(self);
        match self {
            Self::Dwell { inner, .. } | Self::Latched { inner } => inner.walk(&mut *visit),
            Self::AnyOf { any } => {
                for kind in any {
                    kind.walk(&mut *visit);
                }
            }
            _ => {}
        }
    }
}

/// A condition with an operator-facing name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub name: String,
    #[serde(flatten)]
    pub kind: ConditionKind,
}

impl Condition {
    pub fn new(name: impl Into<String>, kind: ConditionKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn flag(name: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(name, ConditionKind::Flag { tag: tag.into() })
    }

    pub fn threshold_ge(name: impl Into<String>, point: impl Into<String>, threshold: f64) -> Self {
        Self::new(
            name,
            ConditionKind::ThresholdGe {
                point: point.into(),
                threshold,
            },
        )
    }

    pub fn within_band(name: impl Into<String>, point: impl Into<String>, lo: f64, hi: f64) -> Self {
        Self::new(
            name,
            ConditionKind::WithinBand {
                point: point.into(),
                lo,
                hi,
            },
        )
    }

    pub fn hysteresis(
        name: impl Into<String>,
        point: impl Into<String>,
        min_on: f64,
        h_up: f64,
        h_down: f64,
    ) -> Self {
        Self::new(
            name,
            ConditionKind::Hysteresis {
                point: point.into(),
                min_on,
                h_up,
                h_down,
            },
        )
    }

    pub fn dwell(name: impl Into<String>, inner: ConditionKind, dwell_ms: f64) -> Self {
        Self::new(
            name,
            ConditionKind::Dwell {
                inner: Box::new(inner),
                dwell_ms,
            },
        )
    }

    pub fn latched(name: impl Into<String>, inner: ConditionKind) -> Self {
        Self::new(
            name,
            ConditionKind::Latched {
                inner: Box::new(inner),
            },
        )
    }
}
