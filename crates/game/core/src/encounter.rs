//! Encounter orchestrator.
//!
//! [`Encounter`] owns one [`TurnScheduler`], one [`CombatPhaseMachine`] and one
//! [`ActionRunner`]. The components never reference each other: after every
//! command or tick the encounter drains their outboxes, forwards each
//! notification to the host queue and reacts to it, until no component has
//! anything left to report.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::action::{ActionId, ActionRecord, ActionRunner, CombatAction, EnqueueError, UndoError};
use crate::config::{CombatConfig, RunnerConfig};
use crate::error::{CombatError, ErrorSeverity};
use crate::event::{ActionEvent, CombatEvent, Outbox, PhaseEvent, TurnEvent, TurnSnapshot};
use crate::participant::{Controller, ParticipantId, ParticipantRef};
use crate::phase::{CombatPhaseMachine, Phase, PhaseHandler, PhaseSignals, TransitionError};
use crate::scheduler::{JitterSource, SchedulerError, TurnScheduler};

/// How a finished encounter ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Outcome {
    Victory,
    Defeat,
}

impl Outcome {
    pub fn phase(self) -> Phase {
        match self {
            Outcome::Victory => Phase::Victory,
            Outcome::Defeat => Phase::Defeat,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EncounterError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error(transparent)]
    Enqueue(#[from] EnqueueError),

    #[error("encounter already running (phase {phase})")]
    AlreadyRunning { phase: Phase },

    #[error("encounter has not started")]
    NotStarted,

    #[error("encounter already ended in {outcome}")]
    Finished { outcome: Outcome },

    #[error("actions can only be submitted during an actor's turn (phase {phase})")]
    NotActorTurn { phase: Phase },
}

impl CombatError for EncounterError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Scheduler(e) => e.severity(),
            Self::Transition(e) => e.severity(),
            Self::Enqueue(e) => e.severity(),
            Self::AlreadyRunning { .. } | Self::NotStarted | Self::NotActorTurn { .. } => {
                ErrorSeverity::Validation
            }
            Self::Finished { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Scheduler(e) => e.error_code(),
            Self::Transition(e) => e.error_code(),
            Self::Enqueue(e) => e.error_code(),
            Self::AlreadyRunning { .. } => "ENCOUNTER_ALREADY_RUNNING",
            Self::NotStarted => "ENCOUNTER_NOT_STARTED",
            Self::Finished { .. } => "ENCOUNTER_FINISHED",
            Self::NotActorTurn { .. } => "ENCOUNTER_NOT_ACTOR_TURN",
        }
    }
}

pub type Result<T> = std::result::Result<T, EncounterError>;

/// Plain-data view of an encounter for hosts and tools.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EncounterSnapshot {
    pub phase: Phase,
    pub round: u32,
    pub current: Option<ParticipantId>,
    /// The turn in progress, as it would be reported by a turn notification.
    pub turn: Option<TurnSnapshot>,
    pub order: Vec<ParticipantId>,
    pub pending: Vec<ParticipantId>,
    pub queued_actions: usize,
    pub outcome: Option<Outcome>,
    pub history: Vec<ActionRecord>,
}

pub struct Encounter {
    config: CombatConfig,
    scheduler: TurnScheduler,
    phases: CombatPhaseMachine,
    runner: ActionRunner,
    outcome: Option<Outcome>,
    events: Outbox<CombatEvent>,
}

impl Encounter {
    pub fn new(config: CombatConfig) -> Self {
        let scheduler = TurnScheduler::new(config.scheduler.clone());
        Self::assemble(config, scheduler)
    }

    /// Builds an encounter whose initiative rolls come from `jitter`.
    pub fn with_jitter(config: CombatConfig, jitter: Box<dyn JitterSource>) -> Self {
        let scheduler = TurnScheduler::with_jitter(config.scheduler.clone(), jitter);
        Self::assemble(config, scheduler)
    }

    fn assemble(config: CombatConfig, scheduler: TurnScheduler) -> Self {
        let phases = CombatPhaseMachine::new(config.phases.clone());
        // The encounter starts the runner when ExecutingAction is entered.
        let runner = ActionRunner::new(RunnerConfig {
            auto_execute: false,
            ..config.runner.clone()
        });
        Self {
            config,
            scheduler,
            phases,
            runner,
            outcome: None,
            events: Outbox::new(),
        }
    }

    /// Replaces the handler of one phase.
    pub fn with_phase_handler(mut self, phase: Phase, handler: Box<dyn PhaseHandler>) -> Self {
        self.phases = self.phases.with_handler(phase, handler);
        self
    }

    /// Schedules `participants`, starts round 1 and hands out the first turn.
    ///
    /// Fails with [`SchedulerError::NoAliveParticipants`] when nobody alive was
    /// supplied; the encounter then stays Idle.
    pub fn begin(
        &mut self,
        participants: impl IntoIterator<Item = ParticipantRef>,
    ) -> Result<ParticipantId> {
        if self.phases.current() != Phase::Idle {
            return Err(EncounterError::AlreadyRunning {
                phase: self.phases.current(),
            });
        }

        self.outcome = None;
        self.runner.reset();
        self.scheduler.initialize(participants);

        let first = match self.scheduler.start_encounter() {
            Ok(id) => id,
            Err(error) => {
                self.pump();
                return Err(error.into());
            }
        };
        info!(
            target: "combat::encounter",
            participants = self.scheduler.order().len(),
            first = %first,
            "Encounter begun"
        );
        self.enter_turn();
        self.pump();
        Ok(first)
    }

    /// Queues an action for the current actor.
    ///
    /// Player submissions move straight to ExecutingAction. Enemy submissions
    /// wait until the enemy turn's thinking delay has passed.
    pub fn submit_action(
        &mut self,
        action: Box<dyn CombatAction>,
        priority: i32,
    ) -> Result<ActionId> {
        self.ensure_running()?;
        let phase = self.phases.current();
        if !phase.is_actor_turn() {
            warn!(target: "combat::encounter", %phase, "Action submitted outside an actor turn");
            return Err(EncounterError::NotActorTurn { phase });
        }

        let id = self.runner.enqueue(action, priority)?;
        if matches!(phase, Phase::ActorTurnPlayer | Phase::WaitingForDecision) {
            self.drive(Phase::ExecutingAction);
        }
        self.pump();
        Ok(id)
    }

    /// Ends the current actor's turn at their request. Actions the actor
    /// queued but that have not started are discarded.
    pub fn end_turn(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.phases.transition_to(Phase::TurnTransition)?;
        if self.runner.queue_len() > 0 {
            let discarded = self.runner.clear_queue();
            debug!(
                target: "combat::encounter",
                discarded,
                "Unstarted actions dropped at turn end"
            );
        }
        self.pump();
        Ok(())
    }

    /// Ends the current turn regardless of what is executing.
    ///
    /// With [`advance_on_force_end`](crate::config::SchedulerConfig::advance_on_force_end)
    /// the next turn starts immediately (or the encounter is decided);
    /// otherwise the encounter waits out the TurnTransition hold.
    pub fn force_end_turn(&mut self) -> Result<()> {
        self.ensure_running()?;
        self.runner.clear_all();
        match self.phases.force_transition(Phase::TurnTransition) {
            Ok(()) | Err(TransitionError::AlreadyInPhase { .. }) => {}
            Err(error) => {
                self.pump();
                return Err(error.into());
            }
        }
        self.pump();

        if let Some(outcome) = self.judge() {
            self.finish(outcome);
            self.pump();
            return Ok(());
        }
        match self.scheduler.force_end_current_turn() {
            Ok(Some(_)) => self.enter_turn(),
            Ok(None) => {}
            Err(SchedulerError::NoAliveParticipants) => self.finish(Outcome::Defeat),
            Err(error) => {
                self.pump();
                return Err(error.into());
            }
        }
        self.pump();
        Ok(())
    }

    /// Adds a participant mid-combat. It takes its first turn next round.
    pub fn admit(&mut self, participant: ParticipantRef) -> bool {
        let admitted = self.scheduler.admit(participant);
        self.pump();
        admitted
    }

    /// Removes a participant. Withdrawing the current actor ends their turn.
    pub fn withdraw(&mut self, id: ParticipantId) -> bool {
        let was_current = self.scheduler.is_turn_of(id);
        if !self.scheduler.withdraw(id) {
            return false;
        }
        if was_current && self.phases.current().is_actor_turn() {
            debug!(target: "combat::encounter", participant = %id, "Current actor withdrawn");
            self.runner.clear_all();
            self.drive(Phase::TurnTransition);
        }
        self.pump();
        true
    }

    /// Host-initiated phase change, subject to the table and locks.
    pub fn request_phase(&mut self, phase: Phase) -> std::result::Result<(), TransitionError> {
        let result = self.phases.transition_to(phase);
        self.pump();
        result
    }

    pub fn lock_transitions(&mut self, locked: bool) {
        self.phases.lock_transitions(locked);
    }

    pub fn start_actions(&mut self) {
        self.runner.start();
        self.pump();
    }

    pub fn pause_actions(&mut self) {
        self.runner.pause();
        self.pump();
    }

    pub fn resume_actions(&mut self) {
        self.runner.resume();
        self.pump();
    }

    pub fn stop_actions(&mut self) {
        self.runner.stop();
        self.pump();
    }

    pub fn cancel_action(&mut self) -> bool {
        let cancelled = self.runner.cancel_current();
        self.pump();
        cancelled
    }

    pub fn clear_actions(&mut self) -> usize {
        let discarded = self.runner.clear_queue();
        self.pump();
        discarded
    }

    pub fn undo_last_action(&mut self) -> std::result::Result<ActionId, UndoError> {
        self.runner.undo_last()
    }

    /// Advances every component by `delta` and settles the resulting
    /// notifications.
    pub fn tick(&mut self, delta: Duration) {
        self.scheduler.tick(delta);
        self.runner.tick(delta);
        self.pump();

        let signals = PhaseSignals {
            queued_actions: self.runner.queue_len(),
        };
        self.phases.tick(delta, signals);
        self.pump();
    }

    /// Every notification since the last drain, in emission order.
    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    /// Tears the encounter down and returns to Idle.
    pub fn reset(&mut self) {
        info!(target: "combat::encounter", outcome = ?self.outcome, "Encounter reset");
        self.runner.reset();
        self.scheduler.initialize(Vec::new());
        self.scheduler.drain_events();
        self.phases.reset();
        self.outcome = None;
        self.pump();
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phases.current()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn round(&self) -> u32 {
        self.scheduler.round()
    }

    pub fn current_id(&self) -> Option<ParticipantId> {
        self.scheduler.current_id()
    }

    pub fn current_participant(&self) -> Option<&ParticipantRef> {
        self.scheduler.current_participant()
    }

    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    pub fn phases(&self) -> &CombatPhaseMachine {
        &self.phases
    }

    pub fn runner(&self) -> &ActionRunner {
        &self.runner
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            phase: self.phases.current(),
            round: self.scheduler.round(),
            current: self.scheduler.current_id(),
            turn: self
                .scheduler
                .current()
                .map(|entry| entry.snapshot(self.scheduler.round(), self.scheduler.clock())),
            order: self.scheduler.order().iter().map(|entry| entry.id()).collect(),
            pending: self.scheduler.pending().collect(),
            queued_actions: self.runner.queue_len(),
            outcome: self.outcome,
            history: self.runner.history().map(|entry| entry.record()).collect(),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if let Some(outcome) = self.outcome {
            return Err(EncounterError::Finished { outcome });
        }
        if self.phases.current() == Phase::Idle {
            return Err(EncounterError::NotStarted);
        }
        Ok(())
    }

    /// Drains every outbox until all components are quiet.
    fn pump(&mut self) {
        loop {
            let turns = self.scheduler.drain_events();
            let actions = self.runner.drain_events();
            let phases = self.phases.drain_events();
            if turns.is_empty() && actions.is_empty() && phases.is_empty() {
                return;
            }

            for event in turns {
                self.events.push(CombatEvent::Turn(event.clone()));
                self.on_turn_event(&event);
            }
            for event in actions {
                self.events.push(CombatEvent::Action(event.clone()));
                self.on_action_event(&event);
            }
            for event in phases {
                self.events.push(CombatEvent::Phase(event));
                self.on_phase_event(event);
            }
        }
    }

    fn on_turn_event(&mut self, event: &TurnEvent) {
        if let TurnEvent::RoundCompleted { round } = event {
            debug!(target: "combat::encounter", round, "Round completed");
        }
    }

    fn on_action_event(&mut self, event: &ActionEvent) {
        match event {
            ActionEvent::Completed(_) => self.scheduler.record_action(),
            ActionEvent::QueueEmpty if self.phases.current() == Phase::ExecutingAction => {
                self.after_actions();
            }
            _ => {}
        }
    }

    fn on_phase_event(&mut self, event: PhaseEvent) {
        match event {
            PhaseEvent::Changed {
                to: Phase::ExecutingAction,
                ..
            } => {
                if self.runner.is_executing() {
                    return;
                }
                if self.runner.queue_len() == 0 && self.runner.current().is_none() {
                    self.after_actions();
                } else {
                    self.runner.start();
                }
            }
            PhaseEvent::HoldElapsed {
                phase: Phase::TurnTransition,
            } => self.next_turn(),
            _ => {}
        }
    }

    /// The action queue ran dry during ExecutingAction.
    fn after_actions(&mut self) {
        if let Some(outcome) = self.judge() {
            self.finish(outcome);
            return;
        }
        let player_turn = self
            .scheduler
            .current_participant()
            .is_some_and(|p| p.is_alive() && p.is_player_controlled());
        let next = if player_turn {
            Phase::WaitingForDecision
        } else {
            Phase::TurnTransition
        };
        self.drive(next);
    }

    /// The transition hold elapsed: judge the outcome or hand out the next turn.
    fn next_turn(&mut self) {
        if let Some(outcome) = self.judge() {
            self.finish(outcome);
            return;
        }
        match self.scheduler.advance() {
            Ok(_) => self.enter_turn(),
            Err(SchedulerError::NoAliveParticipants) => self.finish(Outcome::Defeat),
            Err(error) => {
                warn!(target: "combat::encounter", %error, "Could not advance turn");
            }
        }
    }

    fn enter_turn(&mut self) {
        let player = self
            .scheduler
            .current_participant()
            .is_some_and(|p| p.is_player_controlled());
        self.drive(if player {
            Phase::ActorTurnPlayer
        } else {
            Phase::ActorTurnEnemy
        });
    }

    /// Defeat when no player-controlled participant is alive, Victory when no
    /// AI participant is.
    fn judge(&self) -> Option<Outcome> {
        let alive = |controller: Controller| {
            self.scheduler
                .order()
                .iter()
                .any(|entry| entry.is_alive() && entry.participant().controller() == controller)
        };
        if !alive(Controller::Player) {
            Some(Outcome::Defeat)
        } else if !alive(Controller::Ai) {
            Some(Outcome::Victory)
        } else {
            None
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        info!(
            target: "combat::encounter",
            %outcome,
            round = self.scheduler.round(),
            "Encounter decided"
        );
        self.runner.clear_all();
        self.scheduler.end_current_turn();
        self.drive(outcome.phase());
        self.outcome = Some(outcome);
    }

    /// Orchestrator-driven transition: table-checked, ignores locks.
    fn drive(&mut self, target: Phase) {
        if let Err(error) = self.phases.force_transition(target) {
            debug!(target: "combat::encounter", %error, "Orchestrated transition skipped");
        }
    }
}
