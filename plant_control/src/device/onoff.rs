//! Generic on/off actuator (pump, fan, agitator).
//!
//! States: OFF, RUNNING, FAULT. Each scan:
//! 1. Apply queued commands in arrival order (START/STOP set the run
//!    intent, RESET requests fault recovery).
//! 2. Interlocks not satisfied → FAULT, from any state.
//! 3. OFF → RUNNING when the intent is run and permissives hold.
//! 4. RUNNING → OFF when the intent is stop. Losing a permissive while
//!    running does not stop the device.
//! 5. FAULT → OFF only on a pending RESET with interlocks satisfied; the
//!    run intent is cleared so a fresh START is needed. START is refused
//!    while in FAULT. RESET also clears latched conditions, so a latched
//!    interlock recovers only through it.

use plant_common::control::command::{Ack, AckCode, Command, CommandKind};
use plant_common::control::condition::Condition;
use plant_common::control::config::ActuatorConfig;
use plant_common::control::error::ContractError;
use plant_common::control::point::{Point, PointValue};
use plant_common::control::state::{ActuatorState, DeviceFlags, DeviceStatus, Mode};

use super::base::ActuatorCore;
use super::{Actuator, StateChange};
use crate::clock::ScanClock;
use crate::io::{IoValue, IoWrite};
use crate::policy::condition::{ConditionSet, Snapshot};

#[derive(Debug, Clone)]
pub struct OnOffActuator {
    core: ActuatorCore<ActuatorState>,
    output_tag: String,
    permissives: ConditionSet,
    interlocks: ConditionSet,
    run_intent: bool,
    reset_requested: bool,
    permissives_ok: bool,
    interlocks_ok: bool,
    /// Binary run-state point, true while RUNNING.
    point: Point,
}

impl OnOffActuator {
    pub fn new(
        id: impl Into<String>,
        output_tag: impl Into<String>,
        debounce_s: f64,
    ) -> Result<Self, ContractError> {
        let core = ActuatorCore::new(id, ActuatorState::Off, debounce_s)?;
        let point = Point::binary(core.id(), false, 0.0);
        Ok(Self {
            core,
            output_tag: output_tag.into(),
            permissives: ConditionSet::default(),
            interlocks: ConditionSet::default(),
            run_intent: false,
            reset_requested: false,
            permissives_ok: true,
            interlocks_ok: true,
            point,
        })
    }

    pub fn from_config(config: &ActuatorConfig) -> Result<Self, ContractError> {
        let mut actuator = Self::new(&config.id, &config.output_tag, config.debounce_s)?;
        actuator.core.set_mode(config.mode);
        actuator.permissives = ConditionSet::new(config.permissives.clone());
        actuator.interlocks = ConditionSet::new(config.interlocks.clone());
        Ok(actuator)
    }

    pub fn add_permissive(&mut self, condition: Condition) {
        self.permissives.push(condition);
    }

    pub fn add_interlock(&mut self, condition: Condition) {
        self.interlocks.push(condition);
    }

    #[inline]
    pub const fn state(&self) -> ActuatorState {
        self.core.state()
    }

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.core.mode()
    }

    #[inline]
    pub const fn run_intent(&self) -> bool {
        self.run_intent
    }

    pub fn output_tag(&self) -> &str {
        &self.output_tag
    }

    pub fn permissives(&self) -> &ConditionSet {
        &self.permissives
    }

    pub fn interlocks(&self) -> &ConditionSet {
        &self.interlocks
    }

    fn apply_queued(&mut self) {
        while let Some(cmd) = self.core.next_command() {
            match cmd.kind {
                CommandKind::Start => self.run_intent = true,
                CommandKind::Stop => self.run_intent = false,
                CommandKind::Reset => {
                    self.reset_requested = true;
                    self.permissives.reset_latches();
                    self.interlocks.reset_latches();
                }
                _ => {}
            }
        }
    }

    fn next_state(&mut self) -> (ActuatorState, &'static str) {
        let state = self.core.state();
        if !self.interlocks_ok {
            self.reset_requested = false;
            return (ActuatorState::Fault, "interlock lost");
        }
        match state {
            ActuatorState::Off if self.run_intent && self.permissives_ok => {
                (ActuatorState::Running, "start")
            }
            ActuatorState::Running if !self.run_intent => (ActuatorState::Off, "stop"),
            ActuatorState::Fault if self.reset_requested => {
                self.reset_requested = false;
                self.run_intent = false;
                (ActuatorState::Off, "reset")
            }
            _ => (state, ""),
        }
    }
}

impl Actuator for OnOffActuator {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn update(&mut self, clock: &dyn ScanClock, inputs: &Snapshot) -> Option<StateChange> {
        let now = clock.now();
        self.apply_queued();
        self.permissives_ok = self.permissives.all_ok(inputs, now);
        self.interlocks_ok = self.interlocks.all_ok(inputs, now);

        let (next, reason) = self.next_state();
        let prev = self.core.enter(next, now)?;

        let running = PointValue::Binary(next == ActuatorState::Running);
        self.point = self.point.resample(running, now, self.point.quality());

        Some(StateChange {
            device: self.core.id().to_string(),
            from: prev.to_string(),
            to: next.to_string(),
            at: now,
            reason: reason.to_string(),
        })
    }

    fn command(&mut self, cmd: &Command) -> Ack {
        if let Err(ack) = self.core.arbitrate(cmd) {
            return ack;
        }
        match cmd.kind {
            CommandKind::Start if self.core.state() == ActuatorState::Fault => {
                return Ack::rejected(AckCode::Rejected, "START refused in FAULT, RESET first");
            }
            CommandKind::Start | CommandKind::Stop => {}
            CommandKind::Reset if self.core.state() != ActuatorState::Fault => {
                return Ack::rejected(AckCode::Rejected, "RESET only valid in FAULT");
            }
            CommandKind::Reset => {}
            other => {
                return Ack::rejected(
                    AckCode::Invalid,
                    format!("Only START/STOP/RESET supported, got {other}"),
                );
            }
        }
        self.core.enqueue(cmd)
    }

    fn points(&self) -> Vec<&Point> {
        vec![&self.point]
    }

    fn status(&self) -> DeviceStatus {
        let mut flags = DeviceFlags::empty();
        flags.set(DeviceFlags::PERMISSIVES_OK, self.permissives_ok);
        flags.set(DeviceFlags::INTERLOCKS_OK, self.interlocks_ok);
        flags.set(DeviceFlags::FAULTED, self.core.state() == ActuatorState::Fault);
        self.core.status(flags)
    }

    fn outputs(&self) -> Vec<IoWrite> {
        vec![IoWrite::new(
            self.output_tag.clone(),
            IoValue::Bool(self.core.state() == ActuatorState::Running),
        )]
    }

    fn flag_tags(&self) -> Vec<&str> {
        self.permissives
            .flag_tags()
            .chain(self.interlocks.flag_tags())
            .collect()
    }

    fn set_mode(&mut self, mode: Mode) {
        self.core.set_mode(mode);
    }
}
