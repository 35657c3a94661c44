//! Built-in phase handlers.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Countdown;
use crate::config::PhaseConfig;

use super::{Phase, PhaseContext, PhaseFlow, PhaseHandler};

/// Builds the default handler for `phase`.
pub fn default_handler(phase: Phase, config: &PhaseConfig) -> Box<dyn PhaseHandler> {
    match phase {
        Phase::Idle => Box::new(IdleHandler),
        Phase::ActorTurnPlayer => Box::new(PlayerTurnHandler),
        Phase::WaitingForDecision => Box::new(DecisionHandler::new(config.decision_timeout())),
        Phase::ActorTurnEnemy => Box::new(EnemyTurnHandler::new(
            config.enemy_think(),
            config.decision_timeout(),
        )),
        Phase::ExecutingAction => Box::new(ExecutingHandler),
        Phase::TurnTransition => Box::new(TransitionHoldHandler::new(config.transition_hold())),
        Phase::Victory | Phase::Defeat => Box::new(OutcomeHandler { phase }),
    }
}

pub struct IdleHandler;

impl PhaseHandler for IdleHandler {}

/// Hands control to the decision wait on the first update.
pub struct PlayerTurnHandler;

impl PhaseHandler for PlayerTurnHandler {
    fn on_update(&mut self, _ctx: &PhaseContext) -> PhaseFlow {
        PhaseFlow::Transition(Phase::WaitingForDecision)
    }
}

/// Waits for the player's decision; escalates to TurnTransition on timeout.
pub struct DecisionHandler {
    timeout: Duration,
    remaining: Countdown,
}

impl DecisionHandler {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            remaining: Countdown::new(timeout),
        }
    }
}

impl PhaseHandler for DecisionHandler {
    fn on_enter(&mut self, _ctx: &PhaseContext) {
        self.remaining = Countdown::new(self.timeout);
    }

    fn on_update(&mut self, ctx: &PhaseContext) -> PhaseFlow {
        if self.remaining.advance(ctx.delta) {
            warn!(
                target: "combat::phase",
                waited = ?ctx.time_in_phase,
                "No decision before timeout, ending turn"
            );
            PhaseFlow::Transition(Phase::TurnTransition)
        } else {
            PhaseFlow::Continue
        }
    }
}

/// Enforces a minimum thinking pause before enemy actions execute, and gives
/// up on the turn when nothing is queued before the decision timeout.
pub struct EnemyTurnHandler {
    think: Duration,
    timeout: Duration,
    remaining: Countdown,
    patience: Countdown,
}

impl EnemyTurnHandler {
    /// `timeout` is raised to `think` when shorter.
    pub fn new(think: Duration, timeout: Duration) -> Self {
        let timeout = timeout.max(think);
        Self {
            think,
            timeout,
            remaining: Countdown::new(think),
            patience: Countdown::new(timeout),
        }
    }
}

impl PhaseHandler for EnemyTurnHandler {
    fn on_enter(&mut self, _ctx: &PhaseContext) {
        self.remaining = Countdown::new(self.think);
        self.patience = Countdown::new(self.timeout);
    }

    fn on_update(&mut self, ctx: &PhaseContext) -> PhaseFlow {
        let thought = self.remaining.advance(ctx.delta);
        let out_of_time = self.patience.advance(ctx.delta);
        if thought && ctx.signals.queued_actions > 0 {
            debug!(
                target: "combat::phase",
                queued = ctx.signals.queued_actions,
                "Enemy decision ready"
            );
            PhaseFlow::Transition(Phase::ExecutingAction)
        } else if out_of_time {
            warn!(
                target: "combat::phase",
                waited = ?ctx.time_in_phase,
                "Enemy chose nothing before timeout, ending turn"
            );
            PhaseFlow::Transition(Phase::TurnTransition)
        } else {
            PhaseFlow::Continue
        }
    }
}

/// Holds the transition lock while the action queue runs.
pub struct ExecutingHandler;

impl PhaseHandler for ExecutingHandler {
    fn locks_transitions(&self) -> bool {
        true
    }
}

/// Pauses between turns, then asks for the next turn once.
pub struct TransitionHoldHandler {
    hold: Duration,
    remaining: Countdown,
    reported: bool,
}

impl TransitionHoldHandler {
    pub fn new(hold: Duration) -> Self {
        Self {
            hold,
            remaining: Countdown::new(hold),
            reported: false,
        }
    }
}

impl PhaseHandler for TransitionHoldHandler {
    fn on_enter(&mut self, _ctx: &PhaseContext) {
        self.remaining = Countdown::new(self.hold);
        self.reported = false;
    }

    fn on_update(&mut self, ctx: &PhaseContext) -> PhaseFlow {
        if self.reported || !self.remaining.advance(ctx.delta) {
            return PhaseFlow::Continue;
        }
        self.reported = true;
        PhaseFlow::Elapsed
    }
}

pub struct OutcomeHandler {
    phase: Phase,
}

impl PhaseHandler for OutcomeHandler {
    fn on_enter(&mut self, ctx: &PhaseContext) {
        info!(
            target: "combat::phase",
            outcome = %self.phase,
            after = ?ctx.time_in_phase,
            "Encounter finished"
        );
    }
}
