//! Notifications emitted by the core components.
//!
//! Components never call each other. Each one appends notifications to its own
//! [`Outbox`]; the orchestrator drains them synchronously after every command
//! or tick, reacts, and forwards them to the host in emission order.

use std::collections::VecDeque;

use crate::action::{ActionCategory, ActionId};
use crate::clock::Timestamp;
use crate::participant::{Controller, ParticipantId};
use crate::phase::Phase;

/// Snapshot of a turn entry at the moment a turn event fired.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnSnapshot {
    pub participant: ParticipantId,
    pub name: String,
    pub controller: Controller,
    pub initiative: f32,
    pub round: u32,
    pub actions_performed: u32,
    pub at: Timestamp,
}

/// Turn management events.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnEvent {
    TurnStarted(TurnSnapshot),
    TurnEnded(TurnSnapshot),
    /// The pending queue for the current round was rebuilt.
    QueueUpdated { pending: Vec<ParticipantId> },
    RoundCompleted { round: u32 },
}

/// Phase machine events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PhaseEvent {
    Changed { from: Phase, to: Phase },
    /// A phase finished its local wait and needs an external decision.
    HoldElapsed { phase: Phase },
}

/// Lightweight description of an action carried by runner events.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionTag {
    pub id: ActionId,
    pub name: String,
    pub category: ActionCategory,
    pub priority: i32,
}

/// Action runner events.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionEvent {
    Queued(ActionTag),
    Started(ActionTag),
    Completed(ActionTag),
    Failed { action: ActionTag, reason: String },
    Cancelled(ActionTag),
    QueueCleared { discarded: usize },
    QueueEmpty,
}

/// Any notification produced by the core.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatEvent {
    Turn(TurnEvent),
    Phase(PhaseEvent),
    Action(ActionEvent),
}

impl From<TurnEvent> for CombatEvent {
    fn from(event: TurnEvent) -> Self {
        CombatEvent::Turn(event)
    }
}

impl From<PhaseEvent> for CombatEvent {
    fn from(event: PhaseEvent) -> Self {
        CombatEvent::Phase(event)
    }
}

impl From<ActionEvent> for CombatEvent {
    fn from(event: ActionEvent) -> Self {
        CombatEvent::Action(event)
    }
}

/// FIFO buffer of pending notifications owned by a single component.
#[derive(Debug)]
pub struct Outbox<E> {
    events: VecDeque<E>,
}

impl<E> Outbox<E> {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }

    pub fn push(&mut self, event: E) {
        self.events.push_back(event);
    }

    pub fn pop(&mut self) -> Option<E> {
        self.events.pop_front()
    }

    /// Removes and returns every pending notification in emission order.
    pub fn drain(&mut self) -> Vec<E> {
        self.events.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl<E> Default for Outbox<E> {
    fn default() -> Self {
        Self::new()
    }
}
