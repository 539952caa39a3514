//! Quality-aware measurement model.
//!
//! A [`Point`] is one immutable sample of one tag. A sampling component
//! creates a new `Point` every scan and keeps it only when the COV decision
//! says publish; "current" and "last published" are always two distinct
//! instances. Metadata (units, scaling, COV rule, limits) travels with every
//! sample so a reader never needs the producing device.
//!
//! The value is a closed tagged union ([`PointValue`]) over the four kinds
//! the plant uses: binary flags, analog measurements, counters (totalizers)
//! and discrete multi-state positions.

use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

use super::error::{check_window, ContractError};

// ─── Quality ────────────────────────────────────────────────────────

/// Trustworthiness of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Quality {
    /// Fresh value read without error.
    #[default]
    Good = 0,
    /// Read failed; the value is the last known-good one.
    Bad = 1,
    /// Value is older than its freshness budget.
    Stale = 2,
    /// Operator override.
    Manual = 3,
}

impl Quality {
    /// Upper-case name, as used in event records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "GOOD",
            Self::Bad => "BAD",
            Self::Stale => "STALE",
            Self::Manual => "MANUAL",
        }
    }

    #[inline]
    pub const fn is_good(&self) -> bool {
        matches!(self, Self::Good)
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Values ─────────────────────────────────────────────────────────

/// Position state of a multi-state device such as a valve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum Discrete {
    Closed = 0,
    Open = 1,
    Traveling = 2,
}

impl Discrete {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Closed),
            1 => Some(Self::Open),
            2 => Some(Self::Traveling),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Open => "OPEN",
            Self::Traveling => "TRAVELING",
        }
    }
}

/// Sample value: one of the closed set of point kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PointValue {
    /// READY/RUN/FAULT style flag.
    Binary(bool),
    /// Continuous measurement.
    Analog(f64),
    /// Monotone totalizer or pulse count.
    Counter(i64),
    /// Multi-state position.
    Discrete(Discrete),
}

impl PointValue {
    /// Analog and counter values take part in deadband arithmetic.
    #[inline]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Analog(_) | Self::Counter(_))
    }

    /// Raw numeric value, if this is a numeric kind.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Analog(v) => Some(v),
            Self::Counter(v) => Some(v as f64),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Binary(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_counter(&self) -> Option<i64> {
        match *self {
            Self::Counter(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_discrete(&self) -> Option<Discrete> {
        match *self {
            Self::Discrete(v) => Some(v),
            _ => None,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Binary(_) => "binary",
            Self::Analog(_) => "analog",
            Self::Counter(_) => "counter",
            Self::Discrete(_) => "discrete",
        }
    }
}

impl std::fmt::Display for PointValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Binary(v) => write!(f, "{v}"),
            Self::Analog(v) => write!(f, "{v}"),
            Self::Counter(v) => write!(f, "{v}"),
            Self::Discrete(v) => f.write_str(v.as_str()),
        }
    }
}

// ─── Metadata ───────────────────────────────────────────────────────

/// Linear raw → engineering mapping: `eng = raw * k + b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaling {
    #[serde(default = "default_gain")]
    pub k: f64,
    #[serde(default)]
    pub b: f64,
}

fn default_gain() -> f64 {
    1.0
}

impl Scaling {
    pub const fn new(k: f64, b: f64) -> Self {
        Self { k, b }
    }

    #[inline]
    pub fn apply(&self, raw: f64) -> f64 {
        raw * self.k + self.b
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self { k: 1.0, b: 0.0 }
    }
}

/// Change-of-value publication rule.
///
/// Thresholds combine "strictest wins": the effective deadband is the
/// larger of the absolute and percent thresholds that are set.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CovRule {
    /// Minimum absolute engineering delta to publish.
    #[serde(default)]
    pub deadband_abs: Option<f64>,
    /// Minimum delta as a percent of the previous engineering value.
    #[serde(default)]
    pub deadband_pct: Option<f64>,
    /// Minimum seconds between publications (0 disables the gate).
    #[serde(default)]
    pub min_interval_s: f64,
}

impl CovRule {
    /// Rule with only an absolute deadband.
    pub const fn absolute(deadband: f64) -> Self {
        Self {
            deadband_abs: Some(deadband),
            deadband_pct: None,
            min_interval_s: 0.0,
        }
    }

    pub fn with_percent(mut self, pct: f64) -> Self {
        self.deadband_pct = Some(pct);
        self
    }

    pub fn with_min_interval(mut self, seconds: f64) -> Self {
        self.min_interval_s = seconds;
        self
    }

    /// Reject negative or non-finite thresholds.
    pub fn validate(&self) -> Result<(), ContractError> {
        if let Some(abs) = self.deadband_abs {
            check_window("deadband_abs", abs)?;
        }
        if let Some(pct) = self.deadband_pct {
            check_window("deadband_pct", pct)?;
        }
        check_window("min_interval_s", self.min_interval_s)
    }

    /// Effective deadband against a previous sample.
    ///
    /// The percent term is skipped when the previous *raw* value is zero,
    /// while its magnitude is taken from the previous *engineering* value.
    /// With a scaling offset these two can disagree; that asymmetry is kept.
    pub fn threshold(&self, prev_raw: f64, prev_eng: f64) -> f64 {
        let mut threshold = 0.0_f64;
        if let Some(abs) = self.deadband_abs {
            threshold = threshold.max(abs);
        }
        if let Some(pct) = self.deadband_pct {
            if prev_raw != 0.0 {
                threshold = threshold.max(prev_eng.abs() * (pct / 100.0));
            }
        }
        threshold
    }
}

/// Display/sanity bounds. Advisory only: never alarms, never gates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default)]
    pub lo: Option<f64>,
    #[serde(default)]
    pub hi: Option<f64>,
}

impl Limits {
    pub fn contains(&self, value: f64) -> bool {
        self.lo.is_none_or(|lo| value >= lo) && self.hi.is_none_or(|hi| value <= hi)
    }
}

// ─── Point ──────────────────────────────────────────────────────────

/// One immutable sample of one tag.
///
/// Fields are private: a `Point` never changes after construction. Methods
/// that "modify" a point ([`Point::stale`], [`Point::restamped`],
/// [`Point::resample`]) return a new instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    id: String,
    value: PointValue,
    ts_mono: f64,
    #[serde(default)]
    quality: Quality,
    #[serde(default)]
    eu: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    scaling: Option<Scaling>,
    #[serde(default)]
    cov: CovRule,
    #[serde(default)]
    limits: Limits,
}

assert_impl_all!(Point: Send, Sync, Clone);
assert_impl_all!(PointValue: Send, Sync, Copy);

impl Point {
    /// New GOOD-quality point with no metadata.
    pub fn new(id: impl Into<String>, value: PointValue, ts_mono: f64) -> Self {
        Self {
            id: id.into(),
            value,
            ts_mono,
            quality: Quality::Good,
            eu: None,
            source: None,
            scaling: None,
            cov: CovRule::default(),
            limits: Limits::default(),
        }
    }

    pub fn analog(id: impl Into<String>, value: f64, ts_mono: f64) -> Self {
        Self::new(id, PointValue::Analog(value), ts_mono)
    }

    pub fn binary(id: impl Into<String>, value: bool, ts_mono: f64) -> Self {
        Self::new(id, PointValue::Binary(value), ts_mono)
    }

    pub fn counter(id: impl Into<String>, value: i64, ts_mono: f64) -> Self {
        Self::new(id, PointValue::Counter(value), ts_mono)
    }

    pub fn discrete(id: impl Into<String>, value: Discrete, ts_mono: f64) -> Self {
        Self::new(id, PointValue::Discrete(value), ts_mono)
    }

    // ── Construction-time builders ──

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_units(mut self, eu: impl Into<String>) -> Self {
        self.eu = Some(eu.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_scaling(mut self, scaling: Scaling) -> Self {
        self.scaling = Some(scaling);
        self
    }

    pub fn with_cov(mut self, cov: CovRule) -> Self {
        self.cov = cov;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    // ── Accessors ──

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub const fn value(&self) -> PointValue {
        self.value
    }

    #[inline]
    pub const fn ts_mono(&self) -> f64 {
        self.ts_mono
    }

    #[inline]
    pub const fn quality(&self) -> Quality {
        self.quality
    }

    pub fn eu(&self) -> Option<&str> {
        self.eu.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub const fn scaling(&self) -> Option<Scaling> {
        self.scaling
    }

    pub const fn cov(&self) -> &CovRule {
        &self.cov
    }

    pub const fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Engineering value for numeric kinds (`raw * k + b` when scaled).
    pub fn eng(&self) -> Option<f64> {
        let raw = self.value.as_f64()?;
        Some(self.scaling.map_or(raw, |s| s.apply(raw)))
    }

    /// Whether the engineering value lies within the advisory limits.
    /// Non-numeric points are always within limits.
    pub fn within_limits(&self) -> bool {
        self.eng().is_none_or(|v| self.limits.contains(v))
    }

    /// Age check against a freshness budget.
    #[inline]
    pub fn is_stale(&self, now_mono: f64, max_age_s: f64) -> bool {
        (now_mono - self.ts_mono) > max_age_s
    }

    // ── Derivations (always new instances) ──

    /// Same sample, quality downgraded to STALE.
    pub fn stale(&self) -> Self {
        Self {
            quality: Quality::Stale,
            ..self.clone()
        }
    }

    /// Same sample, different timestamp.
    pub fn restamped(&self, ts_mono: f64) -> Self {
        Self {
            ts_mono,
            ..self.clone()
        }
    }

    /// New sample for the same tag, keeping all metadata.
    pub fn resample(&self, value: PointValue, ts_mono: f64, quality: Quality) -> Self {
        Self {
            value,
            ts_mono,
            quality,
            ..self.clone()
        }
    }
}
