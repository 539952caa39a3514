//! Plant mechanism: a supervised unit with a run/stop lifecycle.
//!
//! A mechanism ties a [`Lifecycle`] to field I/O. Each tick:
//! 1. An edge on the enable tag becomes a START or STOP command.
//! 2. One queued command is handled (START, STOP, ACK, RESET).
//! 3. Alarms are updated from the trip feedback and alarm tags.
//! 4. An active TRIP alarm forces FAULT.
//! 5. Run feedback confirms STARTING → RUNNING and STOPPING → STOPPED.
//! 6. The run command and status tags are produced for the write phase.
//!
//! RESET clears FAULT only once no TRIP alarm is active.

use plant_common::control::command::{Ack, AckCode, Command, CommandKind, CommandSource};
use plant_common::control::config::{MechanismConfig, MechanismTags, TRIP_ALARM_KEY};
use plant_common::control::error::ContractError;
use plant_common::control::state::{
    DeviceFlags, DeviceStatus, LifecycleState, Mode, Severity,
};
use serde_json::Value;
use tracing::{debug, warn};

use crate::alarm::{Alarm, AlarmEvent, AlarmPanel};
use crate::clock::ScanClock;
use crate::command::arbitration::arbitrate;
use crate::command::queue::CommandQueue;
use crate::event::{EventLevel, EventRecord, EventSink};
use crate::io::{IoBus, IoValue, IoWrite};
use crate::lifecycle::{Lifecycle, Transition};

#[derive(Debug, Clone)]
pub struct Mechanism {
    id: String,
    mode: Mode,
    tags: MechanismTags,
    lifecycle: Lifecycle,
    queue: CommandQueue,
    alarms: AlarmPanel,
    /// `(alarm key, tag)` for configured alarms; `trip` reads `tags.trip_fb`.
    alarm_tags: Vec<(String, String)>,
    last_enable: bool,
}

impl Mechanism {
    /// Mechanism with default tag names and only the built-in TRIP alarm.
    pub fn new(id: impl Into<String>) -> Result<Self, ContractError> {
        Self::from_config(&MechanismConfig::new(id))
    }

    pub fn from_config(config: &MechanismConfig) -> Result<Self, ContractError> {
        let mut alarms = AlarmPanel::new();
        alarms.add(Alarm::new(
            TRIP_ALARM_KEY,
            format!("{} tripped", config.id),
            Severity::Trip,
            true,
        ));
        let mut alarm_tags = Vec::with_capacity(config.alarms.len());
        for a in &config.alarms {
            alarms.add(Alarm::new(&a.key, &a.text, a.severity, a.latching));
            alarm_tags.push((a.key.clone(), a.tag.clone()));
        }

        Ok(Self {
            id: config.id.clone(),
            mode: Mode::Remote,
            tags: config.tags(),
            lifecycle: Lifecycle::new(),
            queue: CommandQueue::new(config.debounce_s)?,
            alarms,
            alarm_tags,
            last_enable: false,
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub const fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn alarms(&self) -> &AlarmPanel {
        &self.alarms
    }

    pub fn tags(&self) -> &MechanismTags {
        &self.tags
    }

    #[inline]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Arbitrate and queue a command for the next tick.
    pub fn command(&mut self, cmd: &Command) -> Ack {
        if let Err(ack) = arbitrate(self.mode, cmd) {
            return ack;
        }
        match cmd.kind {
            CommandKind::Start | CommandKind::Stop | CommandKind::Ack => {}
            CommandKind::Reset if self.lifecycle.state() != LifecycleState::Fault => {
                return Ack::rejected(AckCode::Rejected, "RESET only valid in FAULT");
            }
            CommandKind::Reset => {}
            other => {
                return Ack::rejected(
                    AckCode::Invalid,
                    format!("Only START/STOP/ACK/RESET supported, got {other}"),
                );
            }
        }
        self.push(cmd.clone())
    }

    fn push(&mut self, cmd: Command) -> Ack {
        self.queue.admit(cmd)
    }

    /// Run one tick and return the outputs to commit.
    pub fn tick(
        &mut self,
        clock: &dyn ScanClock,
        io: &dyn IoBus,
        sink: &mut dyn EventSink,
    ) -> Vec<IoWrite> {
        let now = clock.now();

        self.sample_enable(now, io);

        if let Some(cmd) = self.queue.pop() {
            let reason = cmd.request_id.as_deref();
            let transition = match cmd.kind {
                CommandKind::Start => self.lifecycle.request_start(now, reason),
                CommandKind::Stop => self.lifecycle.request_stop(now, reason),
                CommandKind::Ack => {
                    self.alarms.ack_all();
                    None
                }
                CommandKind::Reset if !self.alarms.any_trip() => {
                    self.lifecycle.clear_fault(now, reason)
                }
                kind => {
                    debug!(mechanism = %self.id, command = %kind, "command had no effect");
                    None
                }
            };
            self.report(transition, clock, sink);
        }

        let trip_fb = io.read_bool(&self.tags.trip_fb);
        let alarm_tags = &self.alarm_tags;
        let events = self.alarms.update_with(
            |key| {
                if key == TRIP_ALARM_KEY {
                    return trip_fb;
                }
                alarm_tags
                    .iter()
                    .find(|(k, _)| k == key)
                    .is_some_and(|(_, tag)| io.read_bool(tag))
            },
            now,
        );
        for (key, event) in events {
            self.report_alarm(&key, event, clock, sink);
        }

        if self.alarms.any_trip() {
            let text = self
                .alarms
                .iter()
                .find(|a| a.active() && a.severity == Severity::Trip)
                .map(|a| a.text.clone());
            let transition = self.lifecycle.trip_fault(now, text.as_deref());
            self.report(transition, clock, sink);
        }

        let run_fb = io.read_bool(&self.tags.run_fb);
        let transition = match self.lifecycle.state() {
            LifecycleState::Starting if run_fb => self.lifecycle.confirm_started(now, None),
            LifecycleState::Stopping if !run_fb => self.lifecycle.confirm_stopped(now, None),
            _ => None,
        };
        self.report(transition, clock, sink);

        self.outputs()
    }

    /// Run command and status tag values for the current state.
    pub fn outputs(&self) -> Vec<IoWrite> {
        let state = self.lifecycle.state();
        vec![
            IoWrite::new(self.tags.run_cmd.clone(), state.is_driving()),
            IoWrite::new(self.tags.status.clone(), IoValue::from(state.as_str())),
        ]
    }

    pub fn status(&self) -> DeviceStatus {
        let mut flags = DeviceFlags::empty();
        flags.set(DeviceFlags::FAULTED, self.state() == LifecycleState::Fault);
        flags.set(DeviceFlags::COMMAND_PENDING, !self.queue.is_empty());
        flags.set(DeviceFlags::INTERLOCKS_OK, !self.alarms.any_trip());
        DeviceStatus {
            id: self.id.clone(),
            mode: self.mode,
            state: self.state().to_string(),
            flags,
            entered_at: self.lifecycle.entered_at(),
        }
    }

    fn sample_enable(&mut self, now: f64, io: &dyn IoBus) {
        let enable = io.read_bool(&self.tags.enable);
        if enable == self.last_enable {
            return;
        }

        let (kind, reason) = if enable {
            (CommandKind::Start, "enable true")
        } else {
            (CommandKind::Stop, "enable false")
        };
        let cmd = Command::new(self.id.clone(), kind)
            .with_source(CommandSource::Local)
            .with_request_id(reason)
            .at(now);

        // A mode refusal consumes the edge; a queue refusal leaves it
        // pending so the next tick offers it again.
        if let Err(ack) = arbitrate(self.mode, &cmd) {
            self.last_enable = enable;
            warn!(mechanism = %self.id, command = %kind, ack = %ack, "enable edge refused");
            return;
        }
        let ack = self.push(cmd);
        if ack.ok {
            self.last_enable = enable;
        } else {
            debug!(mechanism = %self.id, command = %kind, ack = %ack, "enable edge deferred");
        }
    }

    fn report(&self, transition: Option<Transition>, clock: &dyn ScanClock, sink: &mut dyn EventSink) {
        let Some(t) = transition else {
            return;
        };
        let level = if t.to == LifecycleState::Fault {
            EventLevel::Warn
        } else {
            EventLevel::Info
        };
        sink.emit(
            EventRecord::new(clock, level, "lifecycle_transition")
                .device(self.id.clone())
                .reason(t.reason)
                .attr("from", t.from.as_str())
                .attr("to", t.to.as_str())
                .attr("cycles", Value::from(self.lifecycle.cycles())),
        );
    }

    fn report_alarm(&self, key: &str, event: AlarmEvent, clock: &dyn ScanClock, sink: &mut dyn EventSink) {
        let Some(alarm) = self.alarms.get(key) else {
            return;
        };
        let (name, level) = match event {
            AlarmEvent::Raised if alarm.severity >= Severity::Alarm => ("alarm_raised", EventLevel::Warn),
            AlarmEvent::Raised => ("alarm_raised", EventLevel::Info),
            AlarmEvent::Cleared => ("alarm_cleared", EventLevel::Info),
            AlarmEvent::Unlatched => ("alarm_unlatched", EventLevel::Info),
        };
        sink.emit(
            EventRecord::new(clock, level, name)
                .device(self.id.clone())
                .reason(alarm.text.clone())
                .attr("key", key)
                .attr("severity", alarm.severity.as_str()),
        );
    }
}
