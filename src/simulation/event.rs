use crate::rules::{Comparator, RuleError, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnUnit {
    Action {
        user: String,
        action: String,
        targets: Vec<String>,
    },
    Speech {
        speaker: String,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EndCondition {
    /// Compares the number of turns taken so far.
    TurnCount { comparator: Comparator, value: u32 },
    ParticipantAttribute {
        participant: String,
        attribute: String,
        comparator: Comparator,
        value: Value,
    },
}

/// A scripted sequence of turns among participant entities.
///
/// Participants are entity names resolved against the world on every turn;
/// the event never owns entity state.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub name: String,
    pub participants: Vec<String>,
    pub script: Vec<TurnUnit>,
    pub end_condition: EndCondition,
    pub(crate) status: EventStatus,
    pub(crate) turn_index: usize,
    pub(crate) log: Vec<String>,
    pub(crate) failure: Option<RuleError>,
}

impl Event {
    pub fn new(
        name: impl Into<String>,
        participants: Vec<String>,
        script: Vec<TurnUnit>,
        end_condition: EndCondition,
    ) -> Self {
        Self {
            name: name.into(),
            participants,
            script,
            end_condition,
            status: EventStatus::Idle,
            turn_index: 0,
            log: Vec::new(),
            failure: None,
        }
    }

    pub fn status(&self) -> EventStatus {
        self.status
    }

    /// Turns consumed so far (0-based index of the next scripted turn).
    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// The error that aborted the last run, if it failed.
    pub fn failure(&self) -> Option<&RuleError> {
        self.failure.as_ref()
    }

    /// Return to `Idle`, dropping progress from a previous run.
    pub fn reset(&mut self) {
        self.status = EventStatus::Idle;
        self.turn_index = 0;
        self.log.clear();
        self.failure = None;
    }
}
