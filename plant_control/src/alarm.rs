//! Latching alarms and the per-mechanism alarm panel.
//!
//! An alarm mirrors a raw boolean condition every scan. A latching alarm
//! stays latched after the condition clears until it is acknowledged; the
//! latch drops on the first update that sees the condition inactive with an
//! acknowledgement pending, and that update consumes the acknowledgement.

use std::collections::HashMap;

use plant_common::control::state::Severity;
use serde::Serialize;

/// Edge reported by [`Alarm::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmEvent {
    /// Raw condition went false → true.
    Raised,
    /// Raw condition went true → false.
    Cleared,
    /// A latched alarm released after acknowledgement.
    Unlatched,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alarm {
    pub key: String,
    pub text: String,
    pub severity: Severity,
    pub latching: bool,

    active: bool,
    latched: bool,
    acked: bool,
    first_t: Option<f64>,
    last_t: Option<f64>,
}

impl Alarm {
    pub fn new(key: impl Into<String>, text: impl Into<String>, severity: Severity, latching: bool) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
            severity,
            latching,
            active: false,
            latched: false,
            acked: false,
            first_t: None,
            last_t: None,
        }
    }

    /// Apply this scan's raw condition.
    pub fn update(&mut self, active_raw: bool, t: f64) -> Option<AlarmEvent> {
        let was_active = self.active;
        let was_latched = self.latched;

        if active_raw && !was_active {
            self.first_t = Some(t);
        }
        if active_raw {
            self.last_t = Some(t);
        }
        self.active = active_raw;

        if self.latching {
            if active_raw {
                self.latched = true;
            } else if self.acked {
                self.latched = false;
                self.acked = false;
            }
        } else {
            self.latched = active_raw;
        }

        match (was_active, active_raw) {
            (false, true) => Some(AlarmEvent::Raised),
            (true, false) if self.latching && was_latched && !self.latched => {
                Some(AlarmEvent::Unlatched)
            }
            (true, false) => Some(AlarmEvent::Cleared),
            (false, false) if self.latching && was_latched && !self.latched => {
                Some(AlarmEvent::Unlatched)
            }
            _ => None,
        }
    }

    /// Acknowledge. The latch itself only drops on a later inactive update.
    pub fn ack(&mut self) {
        self.acked = true;
    }

    #[inline]
    pub const fn active(&self) -> bool {
        self.active
    }

    #[inline]
    pub const fn latched(&self) -> bool {
        self.latched
    }

    #[inline]
    pub const fn acked(&self) -> bool {
        self.acked
    }

    /// Time of the most recent rising edge.
    #[inline]
    pub const fn first_t(&self) -> Option<f64> {
        self.first_t
    }

    /// Last time the condition was seen active.
    #[inline]
    pub const fn last_t(&self) -> Option<f64> {
        self.last_t
    }

    /// Needs operator attention.
    #[inline]
    pub const fn is_unacked(&self) -> bool {
        (self.active || self.latched) && !self.acked
    }
}

// ─── Panel ──────────────────────────────────────────────────────────

/// Alarms of one mechanism, one per key, kept in configuration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlarmPanel {
    alarms: Vec<Alarm>,
}

impl AlarmPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an alarm, replacing any existing alarm with the same key.
    pub fn add(&mut self, alarm: Alarm) {
        match self.alarms.iter_mut().find(|a| a.key == alarm.key) {
            Some(existing) => *existing = alarm,
            None => self.alarms.push(alarm),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Alarm> {
        self.alarms.iter().find(|a| a.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }

    /// Apply raw signals by key. Keys without a signal read inactive.
    pub fn update(&mut self, signals: &HashMap<String, bool>, t: f64) -> Vec<(String, AlarmEvent)> {
        self.update_with(|key| signals.get(key).copied().unwrap_or(false), t)
    }

    /// Apply raw signals from a lookup function.
    pub fn update_with(&mut self, mut signal: impl FnMut(&str) -> bool, t: f64) -> Vec<(String, AlarmEvent)> {
        let mut events = Vec::new();
        for alarm in &mut self.alarms {
            let raw = signal(&alarm.key);
            if let Some(event) = alarm.update(raw, t) {
                events.push((alarm.key.clone(), event));
            }
        }
        events
    }

    /// Any TRIP-severity alarm currently active.
    pub fn any_trip(&self) -> bool {
        self.alarms
            .iter()
            .any(|a| a.active && a.severity == Severity::Trip)
    }

    /// Alarms active or latched and not yet acknowledged.
    pub fn unacked(&self) -> impl Iterator<Item = &Alarm> {
        self.alarms.iter().filter(|a| a.is_unacked())
    }

    pub fn ack_all(&mut self) {
        for alarm in &mut self.alarms {
            alarm.ack();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latching_alarm_holds_until_inactive_and_acked() {
        let mut a = Alarm::new("trip", "Pump tripped", Severity::Trip, true);
        assert_eq!(a.update(true, 1.0), Some(AlarmEvent::Raised));
        assert_eq!(a.first_t(), Some(1.0));
        assert!(a.latched());

        a.update(true, 2.0);
        assert_eq!(a.first_t(), Some(1.0));
        assert_eq!(a.last_t(), Some(2.0));

        assert_eq!(a.update(false, 3.0), Some(AlarmEvent::Cleared));
        assert!(a.latched());
        assert!(a.is_unacked());

        // Ack while still active: latch holds, ack stays pending.
        a.update(true, 4.0);
        a.ack();
        a.update(true, 5.0);
        assert!(a.latched());
        assert!(a.acked());

        assert_eq!(a.update(false, 6.0), Some(AlarmEvent::Unlatched));
        assert!(!a.latched());
        assert!(!a.acked());
        assert_eq!(a.last_t(), Some(5.0));
    }

    #[test]
    fn ack_consumed_by_unlatch() {
        let mut a = Alarm::new("hi", "High", Severity::Alarm, true);
        a.update(true, 0.0);
        a.update(false, 1.0);
        a.ack();
        assert_eq!(a.update(false, 2.0), Some(AlarmEvent::Unlatched));

        // Fresh activation needs a fresh ack.
        a.update(true, 3.0);
        a.update(false, 4.0);
        assert!(a.latched());
        assert!(a.is_unacked());
    }

    #[test]
    fn non_latching_mirrors_active() {
        let mut a = Alarm::new("warn", "Warn", Severity::Warn, false);
        a.update(true, 0.0);
        assert!(a.latched());
        a.ack();
        assert!(a.active());
        assert!(a.latched());
        assert_eq!(a.update(false, 1.0), Some(AlarmEvent::Cleared));
        assert!(!a.latched());
        assert_eq!(a.update(false, 2.0), None);
    }

    #[test]
    fn panel_update_defaults_missing_keys_to_inactive() {
        let mut panel = AlarmPanel::new();
        panel.add(Alarm::new("trip", "Tripped", Severity::Trip, true));
        panel.add(Alarm::new("hi_temp", "High temperature", Severity::Warn, false));

        let mut signals = HashMap::new();
        signals.insert("trip".to_string(), true);
        let events = panel.update(&signals, 1.0);
        assert_eq!(events, vec![("trip".to_string(), AlarmEvent::Raised)]);
        assert!(panel.any_trip());
        assert!(!panel.get("hi_temp").unwrap().active());
    }

    #[test]
    fn any_trip_needs_active_not_latched() {
        let mut panel = AlarmPanel::new();
        panel.add(Alarm::new("trip", "Tripped", Severity::Trip, true));
        panel.update_with(|_| true, 0.0);
        panel.update_with(|_| false, 1.0);
        assert!(panel.get("trip").unwrap().latched());
        assert!(!panel.any_trip());
    }

    #[test]
    fn unacked_and_ack_all() {
        let mut panel = AlarmPanel::new();
        panel.add(Alarm::new("a", "A", Severity::Alarm, true));
        panel.add(Alarm::new("b", "B", Severity::Warn, false));
        panel.add(Alarm::new("c", "C", Severity::Info, true));
        panel.update_with(|k| k != "c", 0.0);

        let keys: Vec<&str> = panel.unacked().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);

        panel.ack_all();
        assert_eq!(panel.unacked().count(), 0);

        // Latch releases on the next inactive update, not on ack.
        assert!(panel.get("a").unwrap().latched());
        panel.update_with(|_| false, 1.0);
        assert!(!panel.get("a").unwrap().latched());
    }

    #[test]
    fn add_replaces_same_key() {
        let mut panel = AlarmPanel::new();
        panel.add(Alarm::new("a", "old", Severity::Info, false));
        panel.add(Alarm::new("a", "new", Severity::Trip, true));
        assert_eq!(panel.len(), 1);
        assert_eq!(panel.get("a").unwrap().text, "new");
    }
}
