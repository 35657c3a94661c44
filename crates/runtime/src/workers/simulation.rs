//! Simulation worker that owns the authoritative [`Encounter`].
//!
//! Receives commands from [`crate::RuntimeHandle`], advances the encounter on
//! a fixed interval, and publishes every drained notification to the
//! [`EventBus`].

use std::time::Duration;

use combat_core::{
    ActionId, CombatAction, Encounter, EncounterError, EncounterSnapshot, ParticipantId,
    ParticipantRef, Phase, TransitionError, UndoError,
};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::RunnerControl;
use crate::events::{Event, EventBus};

const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// Commands that can be sent to the simulation worker
pub enum Command {
    Begin {
        participants: Vec<ParticipantRef>,
        reply: oneshot::Sender<Result<ParticipantId, EncounterError>>,
    },
    SubmitAction {
        action: Box<dyn CombatAction>,
        priority: i32,
        reply: oneshot::Sender<Result<ActionId, EncounterError>>,
    },
    EndTurn {
        reply: oneshot::Sender<Result<(), EncounterError>>,
    },
    ForceEndTurn {
        reply: oneshot::Sender<Result<(), EncounterError>>,
    },
    Admit {
        participant: ParticipantRef,
        reply: oneshot::Sender<bool>,
    },
    Withdraw {
        id: ParticipantId,
        reply: oneshot::Sender<bool>,
    },
    RequestPhase {
        phase: Phase,
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
    LockTransitions {
        locked: bool,
        reply: oneshot::Sender<()>,
    },
    Runner {
        control: RunnerControl,
        reply: oneshot::Sender<()>,
    },
    CancelAction {
        reply: oneshot::Sender<bool>,
    },
    ClearActions {
        reply: oneshot::Sender<usize>,
    },
    UndoLastAction {
        reply: oneshot::Sender<Result<ActionId, UndoError>>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    /// Query the current encounter state (read-only).
    Snapshot {
        reply: oneshot::Sender<EncounterSnapshot>,
    },
}

/// Background task that processes encounter commands and ticks.
pub struct SimulationWorker {
    encounter: Encounter,
    command_rx: mpsc::Receiver<Command>,
    event_bus: EventBus,
    tick_interval: Duration,
    tick_delta: Duration,
}

impl SimulationWorker {
    pub fn new(
        encounter: Encounter,
        command_rx: mpsc::Receiver<Command>,
        event_bus: EventBus,
        tick_interval: Duration,
        tick_delta: Duration,
    ) -> Self {
        Self {
            encounter,
            command_rx,
            event_bus,
            tick_interval,
            tick_delta,
        }
    }

    /// Main worker loop. Exits once every command sender is dropped.
    pub async fn run(mut self) {
        let period = self.tick_interval.max(MIN_TICK_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => {
                        self.handle_command(cmd);
                        self.publish();
                    }
                    None => break,
                },
                _ = ticker.tick() => {
                    self.encounter.tick(self.tick_delta);
                    self.publish();
                }
            }
        }

        info!(
            target: "runtime::worker",
            phase = %self.encounter.phase(),
            round = self.encounter.round(),
            "Simulation worker stopped"
        );
    }

    fn publish(&mut self) {
        for event in self.encounter.drain_events() {
            self.event_bus.publish(Event::from(event));
        }
    }

    fn handle_command(&mut self, cmd: Command) {
        let encounter = &mut self.encounter;
        match cmd {
            Command::Begin {
                participants,
                reply,
            } => {
                let _ = reply.send(encounter.begin(participants));
            }
            Command::SubmitAction {
                action,
                priority,
                reply,
            } => {
                let result = encounter.submit_action(action, priority);
                if let Err(error) = &result {
                    debug!(target: "runtime::worker", %error, "Action submission refused");
                }
                let _ = reply.send(result);
            }
            Command::EndTurn { reply } => {
                let _ = reply.send(encounter.end_turn());
            }
            Command::ForceEndTurn { reply } => {
                let _ = reply.send(encounter.force_end_turn());
            }
            Command::Admit { participant, reply } => {
                let _ = reply.send(encounter.admit(participant));
            }
            Command::Withdraw { id, reply } => {
                let _ = reply.send(encounter.withdraw(id));
            }
            Command::RequestPhase { phase, reply } => {
                let _ = reply.send(encounter.request_phase(phase));
            }
            Command::LockTransitions { locked, reply } => {
                encounter.lock_transitions(locked);
                let _ = reply.send(());
            }
            Command::Runner { control, reply } => {
                match control {
                    RunnerControl::Start => encounter.start_actions(),
                    RunnerControl::Pause => encounter.pause_actions(),
                    RunnerControl::Resume => encounter.resume_actions(),
                    RunnerControl::Stop => encounter.stop_actions(),
                }
                let _ = reply.send(());
            }
            Command::CancelAction { reply } => {
                let _ = reply.send(encounter.cancel_action());
            }
            Command::ClearActions { reply } => {
                let _ = reply.send(encounter.clear_actions());
            }
            Command::UndoLastAction { reply } => {
                let _ = reply.send(encounter.undo_last_action());
            }
            Command::Reset { reply } => {
                encounter.reset();
                let _ = reply.send(());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(encounter.snapshot());
            }
        }
    }
}
