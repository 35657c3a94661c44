//! High-level runtime orchestrator.
//!
//! The runtime owns the simulation worker, wires up command/event channels,
//! and exposes a builder-based API for clients to drive encounters.

use std::time::Duration;

use combat_core::{
    CombatConfig, Encounter, JitterSource, Outcome, ParticipantRef, Phase, PhaseEvent,
    SeededJitter, TurnEvent, TurnSnapshot,
};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::{Decision, DecisionProvider, ProviderKind, Result, RuntimeError, RuntimeHandle};
use crate::events::{Event, EventBus, Topic};
use crate::workers::SimulationWorker;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    /// Wall-clock period between encounter ticks.
    pub tick_interval: Duration,
    /// Simulated time per tick as a multiple of `tick_interval`.
    pub time_scale: f32,
    pub event_buffer_size: usize,
    pub command_buffer_size: usize,
    /// Seed for initiative jitter. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl RuntimeConfig {
    /// Simulated time advanced on every tick. A negative or NaN scale stops
    /// the clock; a scale too large for a `Duration` saturates.
    pub fn tick_delta(&self) -> Duration {
        let secs = self.tick_interval.as_secs_f32() * self.time_scale;
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            tick_interval: Duration::from_millis(16),
            time_scale: 1.0,
            event_buffer_size: 100,
            command_buffer_size: 32,
            seed: None,
        }
    }
}

/// Main runtime that orchestrates an encounter
///
/// Runtime owns the worker and the decision providers.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    roster: Vec<ParticipantRef>,

    player_provider: Option<Box<dyn DecisionProvider>>,
    ai_provider: Option<Box<dyn DecisionProvider>>,

    sim_worker_handle: JoinHandle<()>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.handle.subscribe(topic)
    }

    pub fn roster(&self) -> &[ParticipantRef] {
        &self.roster
    }

    /// Set the player decision provider
    pub fn set_player_provider(&mut self, provider: impl DecisionProvider + 'static) {
        self.player_provider = Some(Box::new(provider));
    }

    /// Set the AI decision provider
    pub fn set_ai_provider(&mut self, provider: impl DecisionProvider + 'static) {
        self.ai_provider = Some(Box::new(provider));
    }

    fn provider(&self, kind: ProviderKind) -> Result<&dyn DecisionProvider> {
        let provider = match kind {
            ProviderKind::Player => &self.player_provider,
            ProviderKind::Ai => &self.ai_provider,
        };
        provider
            .as_deref()
            .ok_or(RuntimeError::ProviderNotSet { kind })
    }

    /// Begin the encounter with the configured roster and play it out.
    ///
    /// Every "turn started" notification is routed to the provider matching
    /// the actor's controller. Player turns end once their actions have run;
    /// enemy turns end on their own. Returns when Victory or Defeat is
    /// reached, or fails with [`RuntimeError::RoundLimit`] when `max_rounds`
    /// is exceeded.
    ///
    /// Requires both player and AI providers to be configured.
    pub async fn run_until_finished(&self, max_rounds: Option<u32>) -> Result<Outcome> {
        self.provider(ProviderKind::Player)?;
        self.provider(ProviderKind::Ai)?;

        let mut turns = self.handle.subscribe(Topic::Turn);
        let mut phases = self.handle.subscribe(Topic::Phase);

        let first = self.handle.begin(self.roster.clone()).await?;
        info!(target: "runtime", first = %first, "Encounter started");

        loop {
            tokio::select! {
                biased;
                event = phases.recv() => match event {
                    Ok(Event::Phase(PhaseEvent::Changed { from, to })) => {
                        if let Some(outcome) = outcome_of(to) {
                            info!(target: "runtime", %outcome, "Encounter finished");
                            return Ok(outcome);
                        }
                        if from == Phase::ExecutingAction && to == Phase::WaitingForDecision {
                            self.finish_player_turn().await?;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "runtime", skipped, "Phase subscriber lagged");
                        if let Some(outcome) = self.handle.snapshot().await?.outcome {
                            return Ok(outcome);
                        }
                    }
                    Err(RecvError::Closed) => return Err(RuntimeError::EventStreamClosed),
                },
                event = turns.recv() => match event {
                    Ok(Event::Turn(TurnEvent::TurnStarted(turn))) => {
                        self.start_turn(&turn, max_rounds).await?;
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(target: "runtime", skipped, "Turn subscriber lagged, resyncing");
                        if let Some(turn) = self.handle.snapshot().await?.turn {
                            self.start_turn(&turn, max_rounds).await?;
                        }
                    }
                    Err(RecvError::Closed) => return Err(RuntimeError::EventStreamClosed),
                },
            }
        }
    }

    async fn start_turn(&self, turn: &TurnSnapshot, max_rounds: Option<u32>) -> Result<()> {
        if let Some(max_rounds) = max_rounds
            && turn.round > max_rounds
        {
            return Err(RuntimeError::RoundLimit { max_rounds });
        }
        self.play_turn(turn).await
    }

    async fn play_turn(&self, turn: &TurnSnapshot) -> Result<()> {
        let kind = ProviderKind::from(turn.controller);
        let provider = self.provider(kind)?;
        let snapshot = self.handle.snapshot().await?;

        if snapshot.current != Some(turn.participant) {
            debug!(target: "runtime", actor = %turn.participant, "Stale turn notification skipped");
            return Ok(());
        }
        // A resync after lag may replay a turn that is already under way.
        let under_way = snapshot.queued_actions > 0
            || snapshot.turn.as_ref().is_some_and(|t| t.actions_performed > 0)
            || !matches!(
                snapshot.phase,
                Phase::ActorTurnPlayer | Phase::ActorTurnEnemy | Phase::WaitingForDecision
            );
        if under_way {
            debug!(
                target: "runtime",
                actor = %turn.name,
                phase = %snapshot.phase,
                "Turn already under way"
            );
            return Ok(());
        }

        let actions = match provider.decide(turn, &snapshot).await? {
            Decision::Act(actions) if !actions.is_empty() => actions,
            Decision::Act(_) | Decision::Pass => {
                debug!(target: "runtime", actor = %turn.name, %kind, "Turn passed");
                return self.end_turn_quietly().await;
            }
        };

        let mut submitted = 0;
        for action in actions {
            match self.handle.submit_action(action, 0).await {
                Ok(id) => {
                    debug!(target: "runtime", actor = %turn.name, action = %id, "Action submitted");
                    submitted += 1;
                }
                Err(RuntimeError::Encounter(error)) => {
                    warn!(target: "runtime", actor = %turn.name, %error, "Submission refused");
                    break;
                }
                Err(error) => return Err(error),
            }
        }

        if submitted == 0 {
            return self.end_turn_quietly().await;
        }
        Ok(())
    }

    async fn finish_player_turn(&self) -> Result<()> {
        let snapshot = self.handle.snapshot().await?;
        if snapshot.phase == Phase::WaitingForDecision && snapshot.queued_actions == 0 {
            self.end_turn_quietly().await?;
        }
        Ok(())
    }

    /// Ends the turn, tolerating refusals caused by the encounter having
    /// moved on in the meantime.
    async fn end_turn_quietly(&self) -> Result<()> {
        match self.handle.end_turn().await {
            Ok(()) => Ok(()),
            Err(RuntimeError::Encounter(error)) => {
                debug!(target: "runtime", %error, "End of turn refused");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        drop(self.handle);

        self.sim_worker_handle
            .await
            .map_err(RuntimeError::WorkerJoin)
    }
}

fn outcome_of(phase: Phase) -> Option<Outcome> {
    match phase {
        Phase::Victory => Some(Outcome::Victory),
        Phase::Defeat => Some(Outcome::Defeat),
        _ => None,
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    roster: Option<Vec<ParticipantRef>>,
    jitter: Option<Box<dyn JitterSource>>,
    player_provider: Option<Box<dyn DecisionProvider>>,
    ai_provider: Option<Box<dyn DecisionProvider>>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            roster: None,
            jitter: None,
            player_provider: None,
            ai_provider: None,
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override only the combat tuning, keeping the runtime settings.
    pub fn combat_config(mut self, combat: CombatConfig) -> Self {
        self.config.combat = combat;
        self
    }

    /// Set the participants the encounter begins with (required)
    pub fn roster(mut self, roster: impl IntoIterator<Item = ParticipantRef>) -> Self {
        self.roster = Some(roster.into_iter().collect());
        self
    }

    /// Replace the jitter source. Takes precedence over `RuntimeConfig::seed`.
    pub fn jitter(mut self, jitter: Box<dyn JitterSource>) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Set player decision provider (optional)
    pub fn player_provider(mut self, provider: impl DecisionProvider + 'static) -> Self {
        self.player_provider = Some(Box::new(provider));
        self
    }

    /// Set AI decision provider (optional)
    pub fn ai_provider(mut self, provider: impl DecisionProvider + 'static) -> Self {
        self.ai_provider = Some(Box::new(provider));
        self
    }

    /// Spawn the simulation worker and return the runtime.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn build(self) -> Result<Runtime> {
        let roster = self.roster.ok_or(RuntimeError::MissingRoster)?;
        let config = self.config;

        let jitter = match (self.jitter, config.seed) {
            (Some(jitter), _) => jitter,
            (None, Some(seed)) => Box::new(SeededJitter::new(seed)),
            (None, None) => Box::new(SeededJitter::from_entropy()),
        };
        let encounter = Encounter::with_jitter(config.combat.clone(), jitter);

        let (command_tx, command_rx) = mpsc::channel(config.command_buffer_size);
        let event_bus = EventBus::with_capacity(config.event_buffer_size);

        let worker = SimulationWorker::new(
            encounter,
            command_rx,
            event_bus.clone(),
            config.tick_interval,
            config.tick_delta(),
        );
        let sim_worker_handle = tokio::spawn(worker.run());

        debug!(
            target: "runtime",
            participants = roster.len(),
            tick_ms = config.tick_interval.as_millis() as u64,
            "Runtime built"
        );

        Ok(Runtime {
            handle: RuntimeHandle::new(command_tx, event_bus),
            roster,
            player_provider: self.player_provider,
            ai_provider: self.ai_provider,
            sim_worker_handle,
        })
    }
}
