//! Boolean gates threaded across scans.
//!
//! The free functions are pure: callers own the state (`since`, current
//! on/off) and pass it back every scan. [`DwellTimer`] and [`Hysteresis`]
//! hold that state for callers that prefer an object.

/// Conjunction over every predicate. No short-circuit; empty is `true`.
pub fn all_true<I, F>(predicates: I) -> bool
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> bool,
{
    predicates.into_iter().fold(true, |acc, p| p() & acc)
}

/// Disjunction over every predicate. No short-circuit; empty is `false`.
pub fn any_true<I, F>(predicates: I) -> bool
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> bool,
{
    predicates.into_iter().fold(false, |acc, p| p() | acc)
}

// ─── Dwell ──────────────────────────────────────────────────────────

/// Has a condition held continuously for `dwell_ms`?
///
/// Returns `(ok, since)` where `since` is the updated start of the current
/// true run (`None` when the condition is false).
pub fn dwell_ok(is_true_now: bool, since: Option<f64>, now: f64, dwell_ms: f64) -> (bool, Option<f64>) {
    if !is_true_now {
        return (false, None);
    }
    let since = since.unwrap_or(now);
    ((now - since) * 1000.0 >= dwell_ms, Some(since))
}

/// [`dwell_ok`] with its `since` held internally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DwellTimer {
    dwell_ms: f64,
    since: Option<f64>,
}

impl DwellTimer {
    pub const fn new(dwell_ms: f64) -> Self {
        Self {
            dwell_ms,
            since: None,
        }
    }

    pub fn update(&mut self, is_true_now: bool, now: f64) -> bool {
        let (ok, since) = dwell_ok(is_true_now, self.since, now, self.dwell_ms);
        self.since = since;
        ok
    }

    /// Start of the current true run.
    #[inline]
    pub const fn since(&self) -> Option<f64> {
        self.since
    }

    pub fn reset(&mut self) {
        self.since = None;
    }
}

// ─── Hysteresis ─────────────────────────────────────────────────────

/// Two-threshold comparator.
///
/// Off → on requires `measured >= min_on + h_up`; on stays on while
/// `measured > min_on - h_down`.
pub fn hysteresis_ok(current_ok: bool, measured: f64, min_on: f64, h_up: f64, h_down: f64) -> bool {
    if current_ok {
        measured > min_on - h_down
    } else {
        measured >= min_on + h_up
    }
}

/// [`hysteresis_ok`] with its on/off state held internally. Starts off.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hysteresis {
    min_on: f64,
    h_up: f64,
    h_down: f64,
    ok: bool,
}

impl Hysteresis {
    pub const fn new(min_on: f64, h_up: f64, h_down: f64) -> Self {
        Self {
            min_on,
            h_up,
            h_down,
            ok: false,
        }
    }

    pub fn update(&mut self, measured: f64) -> bool {
        self.ok = hysteresis_ok(self.ok, measured, self.min_on, self.h_up, self.h_down);
        self.ok
    }

    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.ok
    }

    /// Force off, e.g. when the measurement becomes untrustworthy.
    pub fn reset(&mut self) {
        self.ok = false;
    }
}

// ─── Latched Trip ───────────────────────────────────────────────────

/// Sticky OR: true from the first true evaluation until [`LatchedTrip::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LatchedTrip {
    tripped: bool,
}

impl LatchedTrip {
    pub const fn new() -> Self {
        Self { tripped: false }
    }

    pub fn eval(&mut self, condition: bool) -> bool {
        self.tripped |= condition;
        self.tripped
    }

    /// Evaluate several trip conditions at once.
    pub fn eval_any<I: IntoIterator<Item = bool>>(&mut self, conditions: I) -> bool {
        let any = conditions.into_iter().fold(false, |acc, c| acc | c);
        self.eval(any)
    }

    #[inline]
    pub const fn is_tripped(&self) -> bool {
        self.tripped
    }

    pub fn reset(&mut self) {
        self.tripped = false;
    }
}
