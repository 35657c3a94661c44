//! Turn-based combat sequencing.
//!
//! `combat-core` decides who acts, in which coarse phase the fight is, and
//! runs submitted actions one at a time. It is synchronous and host-driven:
//! the host calls [`Encounter::tick`] from its own loop and drains
//! [`CombatEvent`]s afterwards. The three components ([`scheduler`],
//! [`phase`], [`action`]) never call each other; the [`Encounter`] wires them
//! together through their notification outboxes.
pub mod action;
pub mod clock;
pub mod config;
pub mod encounter;
pub mod error;
pub mod event;
pub mod participant;
pub mod phase;
pub mod scheduler;

#[cfg(test)]
mod testing;

pub use action::{
    ActionCategory, ActionContext, ActionId, ActionPoll, ActionRecord, ActionRunner, ActionStatus,
    CombatAction, EnqueueError, QueuedAction, UndoError,
};
pub use clock::{Countdown, Timestamp};
pub use config::{CombatConfig, PhaseConfig, RunnerConfig, SchedulerConfig};
pub use encounter::{Encounter, EncounterError, EncounterSnapshot, Outcome};
pub use error::{CombatError, ErrorSeverity};
pub use event::{
    ActionEvent, ActionTag, CombatEvent, Outbox, PhaseEvent, TurnEvent, TurnSnapshot,
};
pub use participant::{Controller, Participant, ParticipantId, ParticipantRef};
pub use phase::{
    CombatPhaseMachine, Phase, PhaseContext, PhaseFlow, PhaseHandler, PhaseSignals,
    TransitionError,
};
pub use scheduler::{
    FixedJitter, JitterSource, ScriptedJitter, SchedulerError, SeededJitter, TurnEntry,
    TurnOrderMode, TurnScheduler,
};
