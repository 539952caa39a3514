//! Contract-violation errors.
//!
//! These are the only failures the core is allowed to raise: invalid static
//! configuration detected at construction time or a call that breaks an
//! argument contract. Runtime conditions (rejected commands, bad samples,
//! interlock trips) are values, never errors.

use thiserror::Error;

/// A programming-contract violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractError {
    /// Scan period must be strictly positive and finite.
    #[error("period_s must be > 0 (got {0})")]
    NonPositivePeriod(f64),

    /// Tick count must not be negative.
    #[error("tick count must be >= 0 (got {0})")]
    NegativeTick(i64),

    /// A deadband, interval or debounce window must be finite and >= 0.
    #[error("{field} must be finite and >= 0 (got {value})")]
    NegativeWindow {
        /// Offending field name.
        field: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Setpoint bounds must be finite with `lo <= hi`.
    #[error("invalid setpoint range [{lo}, {hi}]")]
    InvalidRange {
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },
}

/// Check that a window-like quantity is finite and non-negative.
pub fn check_window(field: &'static str, value: f64) -> Result<(), ContractError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ContractError::NegativeWindow { field, value })
    }
}

/// Check that a scan period is finite and strictly positive.
pub fn check_period(period_s: f64) -> Result<(), ContractError> {
    if period_s.is_finite() && period_s > 0.0 {
        Ok(())
    } else {
        Err(ContractError::NonPositivePeriod(period_s))
    }
}
