//! Mode arbitration and setpoint validation.
//!
//! Both run before a device looks at a command. A refusal is returned as
//! the [`Ack`] to hand back to the caller.

use plant_common::control::command::{Ack, AckCode, Command, CommandSource};
use plant_common::control::state::Mode;

/// Check whether the device mode admits the command's source.
///
/// LOCKED refuses everything, LOCAL refuses remote sources, REMOTE admits
/// all sources.
pub fn arbitrate(mode: Mode, cmd: &Command) -> Result<(), Ack> {
    match (mode, cmd.source) {
        (Mode::Locked, _) => Err(Ack::rejected(AckCode::Conflict, "Device is LOCKED")),
        (Mode::Local, CommandSource::Remote) => Err(Ack::rejected(
            AckCode::Conflict,
            "Device is in LOCAL mode",
        )),
        _ => Ok(()),
    }
}

/// Validate a setpoint against an inclusive range.
pub fn validate_setpoint(value: Option<f64>, lo: f64, hi: f64) -> Ack {
    match value {
        None => Ack::rejected(AckCode::Invalid, "Setpoint value required"),
        Some(v) if v.is_nan() => Ack::rejected(AckCode::Invalid, "Setpoint is not a number"),
        Some(v) if v < lo || v > hi => Ack::rejected(
            AckCode::OutOfRange,
            format!("Setpoint {v} outside [{lo}, {hi}]"),
        ),
        Some(_) => Ack::accepted(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plant_common::control::command::CommandKind;

    #[test]
    fn locked_refuses_every_source() {
        let local = Command::new("P_1", CommandKind::Start).with_source(CommandSource::Local);
        let remote = Command::new("P_1", CommandKind::Start);
        for cmd in [&local, &remote] {
            let ack = arbitrate(Mode::Locked, cmd).unwrap_err();
            assert_eq!(ack.code, AckCode::Conflict);
        }
    }

    #[test]
    fn local_refuses_only_remote() {
        let local = Command::new("P_1", CommandKind::Stop).with_source(CommandSource::Local);
        let remote = Command::new("P_1", CommandKind::Stop);
        assert!(arbitrate(Mode::Local, &local).is_ok());
        assert_eq!(
            arbitrate(Mode::Local, &remote).unwrap_err().code,
            AckCode::Conflict
        );
    }

    #[test]
    fn remote_admits_all() {
        let local = Command::new("P_1", CommandKind::Stop).with_source(CommandSource::Local);
        assert!(arbitrate(Mode::Remote, &local).is_ok());
        assert!(arbitrate(Mode::Remote, &Command::new("P_1", CommandKind::Stop)).is_ok());
    }

    #[test]
    fn setpoint_validation() {
        assert_eq!(validate_setpoint(None, 0.0, 10.0).code, AckCode::Invalid);
        assert_eq!(validate_setpoint(Some(f64::NAN), 0.0, 10.0).code, AckCode::Invalid);
        assert_eq!(validate_setpoint(Some(-0.1), 0.0, 10.0).code, AckCode::OutOfRange);
        assert_eq!(validate_setpoint(Some(10.1), 0.0, 10.0).code, AckCode::OutOfRange);
        assert!(validate_setpoint(Some(0.0), 0.0, 10.0).ok);
        assert!(validate_setpoint(Some(10.0), 0.0, 10.0).ok);
    }
}
