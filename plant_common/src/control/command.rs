//! Command and acknowledgement types.
//!
//! Commands are created by an external ingress, stamped with the scan clock
//! at entry and never mutated afterwards. The synchronous [`Ack`] is the
//! only response contract: rejections are values, not errors.

use serde::{Deserialize, Serialize};

/// What a command asks the target to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum CommandKind {
    Start = 0,
    Stop = 1,
    Open = 2,
    Close = 3,
    Setpoint = 4,
    /// Leave FAULT once the cause has cleared.
    Reset = 5,
    /// Acknowledge alarms.
    Ack = 6,
}

impl CommandKind {
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Start),
            1 => Some(Self::Stop),
            2 => Some(Self::Open),
            3 => Some(Self::Close),
            4 => Some(Self::Setpoint),
            5 => Some(Self::Reset),
            6 => Some(Self::Ack),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::Stop => "STOP",
            Self::Open => "OPEN",
            Self::Close => "CLOSE",
            Self::Setpoint => "SETPOINT",
            Self::Reset => "RESET",
            Self::Ack => "ACK",
        }
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a command originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
pub enum CommandSource {
    /// Field panel next to the equipment.
    Local = 0,
    /// Supervisory HMI or upstream system.
    #[default]
    Remote = 1,
}

impl CommandSource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Remote => "REMOTE",
        }
    }
}

/// A command addressed to one device or mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// Device or mechanism id.
    pub target: String,
    pub kind: CommandKind,
    /// Required for `Setpoint`, ignored otherwise.
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub source: CommandSource,
    /// Scan-clock time at ingress.
    #[serde(default)]
    pub ts_mono: Option<f64>,
    /// Optional correlation id for tracing.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl Command {
    /// Remote, unstamped command.
    pub fn new(target: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            target: target.into(),
            kind,
            value: None,
            source: CommandSource::Remote,
            ts_mono: None,
            request_id: None,
        }
    }

    pub fn setpoint(target: impl Into<String>, value: f64) -> Self {
        Self::new(target, CommandKind::Setpoint).with_value(value)
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_source(mut self, source: CommandSource) -> Self {
        self.source = source;
        self
    }

    /// Stamp with the scan clock at ingress.
    pub fn at(mut self, ts_mono: f64) -> Self {
        self.ts_mono = Some(ts_mono);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Outcome code of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AckCode {
    #[default]
    Ok = 0,
    /// Well-formed but refused in the current state.
    Rejected = 1,
    /// Unsupported kind or missing value.
    Invalid = 2,
    /// Mode arbitration refused the source.
    Conflict = 3,
    /// Setpoint outside its allowed range.
    OutOfRange = 4,
}

impl AckCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Rejected => "REJECTED",
            Self::Invalid => "INVALID",
            Self::Conflict => "CONFLICT",
            Self::OutOfRange => "OUT_OF_RANGE",
        }
    }
}

/// Synchronous response to a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    pub ok: bool,
    pub code: AckCode,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Ack {
    /// Command accepted.
    pub const fn accepted() -> Self {
        Self {
            ok: true,
            code: AckCode::Ok,
            reason: None,
        }
    }

    /// Command refused with a code and a human-readable reason.
    pub fn rejected(code: AckCode, reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            code,
            reason: Some(reason.into()),
        }
    }
}

impl std::fmt::Display for Ack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {reason}", self.code.as_str()),
            None => f.write_str(self.code.as_str()),
        }
    }
}
