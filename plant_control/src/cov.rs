//! Change-of-value publication.
//!
//! [`should_publish`] is the pure decision; [`CovPublisher`] wraps it with
//! the "last published" bookkeeping a sampling device needs: the first
//! sample is always kept as a baseline, and accepted samples are stamped so
//! published timestamps strictly increase.

use plant_common::consts::PUBLISH_TS_EPSILON_S;
use plant_common::control::point::Point;

/// Whether `current` is worth publishing over `previous` at `now`.
///
/// Evaluated in order:
/// 1. quality changed → publish
/// 2. inside the minimum interval since `previous` was published → suppress
/// 3. both numeric and engineering delta below the deadband → suppress
/// 4. otherwise → publish
///
/// The rule comes from `current`.
pub fn should_publish(current: &Point, previous: Option<&Point>, now: f64) -> bool {
    let Some(previous) = previous else {
        return true;
    };

    if previous.quality() != current.quality() {
        return true;
    }

    let rule = current.cov();
    if rule.min_interval_s > 0.0 && now - previous.ts_mono() < rule.min_interval_s {
        return false;
    }

    if let (Some(cur_eng), Some(prev_eng), Some(prev_raw)) =
        (current.eng(), previous.eng(), previous.value().as_f64())
    {
        let delta = (cur_eng - prev_eng).abs();
        if delta < rule.threshold(prev_raw, prev_eng) {
            return false;
        }
    }

    true
}

/// Tracks the last published sample of one point.
#[derive(Debug, Clone, Default)]
pub struct CovPublisher {
    last: Option<Point>,
}

impl CovPublisher {
    pub const fn new() -> Self {
        Self { last: None }
    }

    /// Last published sample.
    #[inline]
    pub fn last(&self) -> Option<&Point> {
        self.last.as_ref()
    }

    /// Offer a fresh sample. Returns the published instance when kept.
    ///
    /// Accepted samples after the baseline are stamped
    /// `max(now - min_interval_s, previous + ε)`.
    pub fn offer(&mut self, candidate: Point, now: f64) -> Option<&Point> {
        let published = match &self.last {
            None => candidate,
            Some(prev) => {
                if !should_publish(&candidate, Some(prev), now) {
                    return None;
                }
                let backdated = now - candidate.cov().min_interval_s;
                let ts = backdated.max(prev.ts_mono() + PUBLISH_TS_EPSILON_S);
                candidate.restamped(ts)
            }
        };
        self.last = Some(published);
        self.last.as_ref()
    }
}
