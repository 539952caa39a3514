//! Debounced FIFO command queue.
//!
//! Fixed capacity, no allocation after construction. The debounce window is
//! measured from the timestamp of the last *accepted* command, not from
//! the queue contents: draining the queue does not reopen the window.

use heapless::Deque;
use plant_common::consts::COMMAND_QUEUE_CAPACITY;
use plant_common::control::command::{Ack, AckCode, Command};
use plant_common::control::error::{check_window, ContractError};

#[derive(Debug, Clone)]
pub struct CommandQueue {
    items: Deque<Command, COMMAND_QUEUE_CAPACITY>,
    debounce_s: f64,
    last_accepted_ts: Option<f64>,
}

impl CommandQueue {
    pub fn new(debounce_s: f64) -> Result<Self, ContractError> {
        check_window("debounce_s", debounce_s)?;
        Ok(Self {
            items: Deque::new(),
            debounce_s,
            last_accepted_ts: None,
        })
    }

    /// Enqueue unless debounced or full.
    ///
    /// With a debounce window configured, a command without a timestamp
    /// cannot be placed in time and is refused. A non-finite timestamp is
    /// always refused.
    pub fn push(&mut self, cmd: Command) -> bool {
        if cmd.ts_mono.is_some_and(|ts| !ts.is_finite()) {
            return false;
        }
        if self.debounce_s > 0.0 {
            let Some(ts) = cmd.ts_mono else {
                return false;
            };
            if self
                .last_accepted_ts
                .is_some_and(|last| ts - last < self.debounce_s)
            {
                return false;
            }
        }
        let ts = cmd.ts_mono;
        if self.items.push_back(cmd).is_err() {
            return false;
        }
        if ts.is_some() {
            self.last_accepted_ts = ts;
        }
        true
    }

    /// [`CommandQueue::push`] with the outcome as an [`Ack`].
    pub fn admit(&mut self, cmd: Command) -> Ack {
        let stamped = cmd.ts_mono.is_some();
        let finite = cmd.ts_mono.is_none_or(f64::is_finite);
        if self.push(cmd) {
            Ack::accepted()
        } else if !finite {
            Ack::rejected(AckCode::Invalid, "Command timestamp not finite")
        } else if self.is_full() {
            Ack::rejected(AckCode::Rejected, "Command queue full")
        } else if !stamped {
            Ack::rejected(AckCode::Rejected, "Command timestamp required")
        } else {
            Ack::rejected(AckCode::Rejected, "Command debounced")
        }
    }

    pub fn pop(&mut self) -> Option<Command> {
        self.items.pop_front()
    }

    pub fn peek(&self) -> Option<&Command> {
        self.items.front()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    #[inline]
    pub const fn debounce_s(&self) -> f64 {
        self.debounce_s
    }

    #[inline]
    pub const fn last_accepted_ts(&self) -> Option<f64> {
        self.last_accepted_ts
    }
}
