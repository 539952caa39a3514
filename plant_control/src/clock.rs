//! Scan clock: monotonic time source and scan metronome.
//!
//! Every component reads time only through [`ScanClock`], so a test can swap
//! the period-aligned [`RealTimeClock`] for the logical [`SimClock`] without
//! touching calling code.
//!
//! ## Overrun policy
//! The real-time clock never catches up. When a wait starts at or after its
//! deadline it reports how far behind it is, skips whole periods until the
//! next deadline is strictly in the future, and returns without sleeping.

use chrono::{DateTime, TimeDelta, Utc};
use nix::sys::time::TimeSpec;
use nix::time::{clock_gettime, ClockId};
use plant_common::control::error::{check_period, ContractError};
use std::cell::Cell;
use thiserror::Error;
use tracing::warn;

/// Unix timestamp of 2000-01-01T00:00:00Z, the simulated wall-clock epoch.
const SIM_EPOCH_UNIX_S: i64 = 946_684_800;

/// Clock failures.
#[derive(Debug, Error)]
pub enum ClockError {
    #[error(transparent)]
    Contract(#[from] ContractError),

    /// Monotonic clock syscall failed.
    #[error("clock syscall failed: {0}")]
    Os(String),
}

/// Time source and metronome for one scan loop.
pub trait ScanClock {
    /// Monotonic seconds. Never decreases.
    fn now(&self) -> f64;

    /// Calendar time correlated with [`ScanClock::now`]. Display only.
    fn wall_now(&self) -> DateTime<Utc>;

    /// Advance to the next scan tick.
    fn sleep_until_next_scan(&mut self) -> Result<(), ClockError>;

    /// Scan period [s].
    fn period_s(&self) -> f64;

    /// Waits that started late.
    fn overruns(&self) -> u64 {
        0
    }
}

// ─── Simulated Clock ────────────────────────────────────────────────

/// Logical clock advanced only on request.
///
/// Time is `start + ticks * period`, so repeated ticks never accumulate
/// floating-point drift.
#[derive(Debug, Clone)]
pub struct SimClock {
    period_s: f64,
    start_s: f64,
    ticks: u64,
}

impl SimClock {
    /// Clock at `t = 0`.
    pub fn new(period_s: f64) -> Result<Self, ContractError> {
        Self::starting_at(period_s, 0.0)
    }

    pub fn starting_at(period_s: f64, start_s: f64) -> Result<Self, ContractError> {
        check_period(period_s)?;
        Ok(Self {
            period_s,
            start_s,
            ticks: 0,
        })
    }

    /// Advance by `n` periods and return the new time.
    pub fn tick(&mut self, n: i64) -> Result<f64, ContractError> {
        if n < 0 {
            return Err(ContractError::NegativeTick(n));
        }
        self.ticks += n as u64;
        Ok(self.now())
    }

    /// Scans elapsed since construction.
    #[inline]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

impl ScanClock for SimClock {
    fn now(&self) -> f64 {
        self.start_s + self.ticks as f64 * self.period_s
    }

    fn wall_now(&self) -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
            + TimeDelta::seconds(SIM_EPOCH_UNIX_S)
            + TimeDelta::nanoseconds((self.now() * 1e9).round() as i64)
    }

    fn sleep_until_next_scan(&mut self) -> Result<(), ClockError> {
        self.tick(1)?;
        Ok(())
    }

    fn period_s(&self) -> f64 {
        self.period_s
    }
}

// ─── Real-Time Clock ────────────────────────────────────────────────

/// Callback receiving `(behind_s, now)` on each overrun.
pub type OverrunObserver = Box<dyn FnMut(f64, f64)>;

/// Period-aligned clock on `CLOCK_MONOTONIC`.
///
/// With the `rt` feature the wait is `clock_nanosleep(TIMER_ABSTIME)`;
/// without it, `std::thread::sleep` for the remaining time.
pub struct RealTimeClock {
    period_s: f64,
    next_deadline: f64,
    overruns: u64,
    on_overrun: Option<OverrunObserver>,
    /// Last successful reading, returned if the syscall ever fails.
    last_now: Cell<f64>,
}

impl RealTimeClock {
    /// First deadline is the next period boundary after construction.
    pub fn new(period_s: f64) -> Result<Self, ClockError> {
        check_period(period_s)?;
        let start = read_monotonic()?;
        Ok(Self {
            period_s,
            next_deadline: start + (period_s - start % period_s),
            overruns: 0,
            on_overrun: None,
            last_now: Cell::new(start),
        })
    }

    pub fn with_overrun_observer(mut self, observer: impl FnMut(f64, f64) + 'static) -> Self {
        self.on_overrun = Some(Box::new(observer));
        self
    }

    #[inline]
    pub const fn next_deadline(&self) -> f64 {
        self.next_deadline
    }

    /// Move the next deadline, e.g. into the past to force an overrun.
    pub fn set_next_deadline(&mut self, deadline: f64) {
        self.next_deadline = deadline;
    }

    fn handle_overrun(&mut self, now: f64) {
        let behind = now - self.next_deadline;
        if behind > 0.0 {
            self.overruns += 1;
            warn!(
                behind_ms = behind * 1e3,
                period_ms = self.period_s * 1e3,
                "scan overrun"
            );
            if let Some(observer) = self.on_overrun.as_mut() {
                observer(behind, now);
            }
        }
        let skipped = (behind.max(0.0) / self.period_s).floor() + 1.0;
        self.next_deadline += skipped * self.period_s;
    }
}

impl ScanClock for RealTimeClock {
    fn now(&self) -> f64 {
        match read_monotonic() {
            Ok(now) => {
                let now = now.max(self.last_now.get());
                self.last_now.set(now);
                now
            }
            Err(_) => self.last_now.get(),
        }
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn sleep_until_next_scan(&mut self) -> Result<(), ClockError> {
        let now = read_monotonic()?;
        if now < self.next_deadline {
            sleep_until(self.next_deadline, now)?;
            self.next_deadline += self.period_s;
        } else {
            self.handle_overrun(now);
        }
        Ok(())
    }

    fn period_s(&self) -> f64 {
        self.period_s
    }

    fn overruns(&self) -> u64 {
        self.overruns
    }
}

impl std::fmt::Debug for RealTimeClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealTimeClock")
            .field("period_s", &self.period_s)
            .field("next_deadline", &self.next_deadline)
            .field("overruns", &self.overruns)
            .finish_non_exhaustive()
    }
}

// ─── Time Helpers ───────────────────────────────────────────────────

fn read_monotonic() -> Result<f64, ClockError> {
    clock_gettime(ClockId::CLOCK_MONOTONIC)
        .map(|ts| timespec_to_s(&ts))
        .map_err(|e| ClockError::Os(format!("clock_gettime: {e}")))
}

fn timespec_to_s(ts: &TimeSpec) -> f64 {
    ts.tv_sec() as f64 + ts.tv_nsec() as f64 * 1e-9
}

#[cfg(feature = "rt")]
fn s_to_timespec(s: f64) -> TimeSpec {
    let secs = s.floor();
    let nanos = ((s - secs) * 1e9).round() as i64;
    if nanos >= 1_000_000_000 {
        TimeSpec::new(secs as i64 + 1, nanos - 1_000_000_000)
    } else {
        TimeSpec::new(secs as i64, nanos)
    }
}

/// Absolute-time sleep on `CLOCK_MONOTONIC`, restarted on EINTR.
#[cfg(feature = "rt")]
fn sleep_until(deadline: f64, _now: f64) -> Result<(), ClockError> {
    use nix::errno::Errno;
    use nix::time::{clock_nanosleep, ClockNanosleepFlags};

    let request = s_to_timespec(deadline);
    loop {
        match clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::TIMER_ABSTIME,
            &request,
        ) {
            Ok(_) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(ClockError::Os(format!("clock_nanosleep: {e}"))),
        }
    }
}

#[cfg(not(feature = "rt"))]
fn sleep_until(deadline: f64, now: f64) -> Result<(), ClockError> {
    std::thread::sleep(std::time::Duration::from_secs_f64(deadline - now));
    Ok(())
}
