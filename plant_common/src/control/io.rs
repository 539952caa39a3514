//! Values exchanged across the I/O boundary.
//!
//! The core never talks to hardware. Sensors read and actuators write
//! [`IoValue`]s keyed by tag name through an injected bus; this type is the
//! common currency of that bus and of the `[io]` config section.

use serde::{Deserialize, Serialize};

/// One I/O tag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IoValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl IoValue {
    /// Boolean view: numbers are true when non-zero, text never converts.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Int(v) => Some(*v != 0),
            Self::Float(v) => Some(*v != 0.0),
            Self::Text(_) => None,
        }
    }

    /// Numeric view.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for IoValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for IoValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<i64> for IoValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for IoValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for IoValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl std::fmt::Display for IoValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}
