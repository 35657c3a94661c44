use crate::clock::Timestamp;
use crate::event::TurnSnapshot;
use crate::participant::{ParticipantId, ParticipantRef};

/// One participant's slot in the scheduler.
///
/// Initiative is rerolled at the start of every round; the admission sequence
/// number is fixed for the entry's lifetime and breaks any remaining ties.
#[derive(Clone)]
pub struct TurnEntry {
    participant: ParticipantRef,
    pub(crate) initiative: f32,
    pub(crate) admission: u64,
    pub(crate) turn_started_at: Option<Timestamp>,
    pub(crate) turn_ended_at: Option<Timestamp>,
    pub(crate) actions_performed: u32,
}

impl TurnEntry {
    pub(crate) fn new(participant: ParticipantRef, initiative: f32, admission: u64) -> Self {
        Self {
            participant,
            initiative,
            admission,
            turn_started_at: None,
            turn_ended_at: None,
            actions_performed: 0,
        }
    }

    pub fn participant(&self) -> &ParticipantRef {
        &self.participant
    }

    pub fn id(&self) -> ParticipantId {
        self.participant.id()
    }

    pub fn is_alive(&self) -> bool {
        self.participant.is_alive()
    }

    pub fn speed(&self) -> i32 {
        self.participant.speed()
    }

    pub fn initiative(&self) -> f32 {
        self.initiative
    }

    pub fn admission(&self) -> u64 {
        self.admission
    }

    pub fn turn_started_at(&self) -> Option<Timestamp> {
        self.turn_started_at
    }

    pub fn turn_ended_at(&self) -> Option<Timestamp> {
        self.turn_ended_at
    }

    pub fn actions_performed(&self) -> u32 {
        self.actions_performed
    }

    pub(crate) fn snapshot(&self, round: u32, at: Timestamp) -> TurnSnapshot {
        TurnSnapshot {
            participant: self.id(),
            name: self.participant.name().to_owned(),
            controller: self.participant.controller(),
            initiative: self.initiative,
            round,
            actions_performed: self.actions_performed,
            at,
        }
    }
}

impl std::fmt::Debug for TurnEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TurnEntry")
            .field("id", &self.id())
            .field("name", &self.participant.name())
            .field("initiative", &self.initiative)
            .field("admission", &self.admission)
            .field("actions_performed", &self.actions_performed)
            .finish()
    }
}
