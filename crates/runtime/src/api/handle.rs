//! Cloneable façade for issuing commands to the runtime.
//!
//! [`RuntimeHandle`] hides channel plumbing and offers async helpers that
//! mirror the encounter's command surface, plus topic subscriptions.
use std::collections::HashMap;

use combat_core::{
    ActionId, CombatAction, EncounterSnapshot, ParticipantId, ParticipantRef, Phase,
};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::errors::{Result, RuntimeError};
use crate::events::{Event, EventBus, Topic};
use crate::workers::Command;

/// Runner controls that carry no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerControl {
    Start,
    Pause,
    Resume,
    Stop,
}

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<Command>, event_bus: EventBus) -> Self {
        Self {
            command_tx,
            event_bus,
        }
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.command_tx
            .send(command(reply_tx))
            .await
            .map_err(|_| RuntimeError::CommandChannelClosed)?;

        reply_rx.await.map_err(RuntimeError::ReplyChannelClosed)
    }

    /// Start the encounter with the given participants; returns the first actor.
    pub async fn begin(&self, participants: Vec<ParticipantRef>) -> Result<ParticipantId> {
        Ok(self
            .request(|reply| Command::Begin {
                participants,
                reply,
            })
            .await??)
    }

    /// Queue an action for the current actor.
    pub async fn submit_action(
        &self,
        action: Box<dyn CombatAction>,
        priority: i32,
    ) -> Result<ActionId> {
        Ok(self
            .request(|reply| Command::SubmitAction {
                action,
                priority,
                reply,
            })
            .await??)
    }

    pub async fn end_turn(&self) -> Result<()> {
        Ok(self.request(|reply| Command::EndTurn { reply }).await??)
    }

    /// Cancel all queued actions and move on to the next turn.
    pub async fn force_end_turn(&self) -> Result<()> {
        Ok(self.request(|reply| Command::ForceEndTurn { reply }).await??)
    }

    /// Add a participant mid-encounter. Returns `false` for duplicates.
    pub async fn admit(&self, participant: ParticipantRef) -> Result<bool> {
        self.request(|reply| Command::Admit { participant, reply })
            .await
    }

    pub async fn withdraw(&self, id: ParticipantId) -> Result<bool> {
        self.request(|reply| Command::Withdraw { id, reply }).await
    }

    /// Ask for a table-checked phase change.
    pub async fn request_phase(&self, phase: Phase) -> Result<()> {
        Ok(self
            .request(|reply| Command::RequestPhase { phase, reply })
            .await??)
    }

    pub async fn lock_transitions(&self, locked: bool) -> Result<()> {
        self.request(|reply| Command::LockTransitions { locked, reply })
            .await
    }

    pub async fn start_actions(&self) -> Result<()> {
        self.control(RunnerControl::Start).await
    }

    pub async fn pause_actions(&self) -> Result<()> {
        self.control(RunnerControl::Pause).await
    }

    pub async fn resume_actions(&self) -> Result<()> {
        self.control(RunnerControl::Resume).await
    }

    pub async fn stop_actions(&self) -> Result<()> {
        self.control(RunnerControl::Stop).await
    }

    async fn control(&self, control: RunnerControl) -> Result<()> {
        self.request(|reply| Command::Runner { control, reply })
            .await
    }

    /// Cancel the in-flight action. Returns whether anything was cancelled.
    pub async fn cancel_action(&self) -> Result<bool> {
        self.request(|reply| Command::CancelAction { reply }).await
    }

    /// Drop every queued action. Returns how many were discarded.
    pub async fn clear_actions(&self) -> Result<usize> {
        self.request(|reply| Command::ClearActions { reply }).await
    }

    pub async fn undo_last_action(&self) -> Result<ActionId> {
        Ok(self
            .request(|reply| Command::UndoLastAction { reply })
            .await??)
    }

    /// Return the encounter to Idle, keeping the worker alive.
    pub async fn reset(&self) -> Result<()> {
        self.request(|reply| Command::Reset { reply }).await
    }

    /// Query the current encounter state (read-only snapshot)
    pub async fn snapshot(&self) -> Result<EncounterSnapshot> {
        self.request(|reply| Command::Snapshot { reply }).await
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Turn` - Turn starts and ends, queue updates, completed rounds
    /// - `Topic::Phase` - Phase changes and elapsed holds
    /// - `Topic::Action` - Action runner lifecycle
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use combat_runtime::Topic;
    ///
    /// let mut phases = handle.subscribe(Topic::Phase);
    /// while let Ok(event) = phases.recv().await {
    ///     // Handle phase events
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(&self, topics: &[Topic]) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }

    /// Get a reference to the event bus for advanced usage
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }
}
