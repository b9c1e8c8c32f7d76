use serde::Serialize;
use tokio::sync::mpsc;

use crate::{
    models::PrNotification,
    timer::{TimerKind, TimerState},
};

/// Everything the engine tells the presentation layer about.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(
    rename_all = "camelCase",
    rename_all_fields = "camelCase",
    tag = "type",
    content = "payload"
)]
pub enum EngineEvent {
    TimerStateChanged {
        state: TimerState,
        remaining_seconds: u32,
    },
    TimerFinished {
        kind: TimerKind,
        next_exercise_index: Option<usize>,
    },
    AdvanceToExercise {
        index: usize,
    },
    PersonalRecords(PrNotification),
    ValidationFailed {
        exercise_index: usize,
        set_index: usize,
        message: String,
    },
}

impl EngineEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EngineEvent::TimerStateChanged { .. } => "timer-state-changed",
            EngineEvent::TimerFinished { .. } => "timer-finished",
            EngineEvent::AdvanceToExercise { .. } => "advance-to-exercise",
            EngineEvent::PersonalRecords(_) => "personal-records",
            EngineEvent::ValidationFailed { .. } => "validation-failed",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: EngineEvent) {}
}

/// Forwards events to a channel the UI side drains.
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        // A closed receiver means the UI went away; nothing left to inform.
        let _ = self.sender.send(event);
    }
}
