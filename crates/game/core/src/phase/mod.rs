//! Combat phase state machine.
//!
//! [`CombatPhaseMachine`] keeps exactly one active [`Phase`], validates every
//! transition request against the fixed table in [`Phase::allowed_targets`],
//! and dispatches the host's `tick` to the active phase's handler.
//!
//! Transitions are refused (with no side effects) when:
//! - the target is not listed for the current phase
//! - the target is the current phase
//! - transitions are locked, either explicitly through
//!   [`lock_transitions`](CombatPhaseMachine::lock_transitions) or by a locking
//!   phase such as ExecutingAction
//!
//! [`force_transition`](CombatPhaseMachine::force_transition) lifts the lock
//! for one otherwise-valid transition. Transitions a handler asks for (the
//! decision timeout, for one) ignore the host-held lock but not a locking
//! phase, so holding the lock never freezes a turn.

mod errors;
mod handler;
pub mod handlers;
mod kind;

pub use errors::TransitionError;
pub use handler::{PhaseContext, PhaseFlow, PhaseHandler, PhaseSignals};
pub use kind::Phase;

use std::collections::HashMap;
use std::time::Duration;

use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::config::PhaseConfig;
use crate::event::{Outbox, PhaseEvent};

pub type Result<T> = std::result::Result<T, TransitionError>;

pub struct CombatPhaseMachine {
    config: PhaseConfig,
    current: Phase,
    previous: Option<Phase>,
    handlers: HashMap<Phase, Box<dyn PhaseHandler>>,
    /// Lock set by the host.
    held_lock: bool,
    /// Lock owned by the active phase; dropped when it exits.
    phase_lock: bool,
    bypass: bool,
    time_in_phase: Duration,
    fixed_accumulator: Duration,
    signals: PhaseSignals,
    events: Outbox<PhaseEvent>,
}

impl CombatPhaseMachine {
    /// Creates a machine in Idle with the built-in handlers.
    pub fn new(config: PhaseConfig) -> Self {
        let handlers = Phase::iter()
            .map(|phase| (phase, handlers::default_handler(phase, &config)))
            .collect();

        let mut machine = Self {
            config,
            current: Phase::Idle,
            previous: None,
            handlers,
            held_lock: false,
            phase_lock: false,
            bypass: false,
            time_in_phase: Duration::ZERO,
            fixed_accumulator: Duration::ZERO,
            signals: PhaseSignals::default(),
            events: Outbox::new(),
        };
        let ctx = machine.context(Duration::ZERO);
        machine.handler_mut(Phase::Idle).on_enter(&ctx);
        machine
    }

    /// Replaces the handler for `phase`. If `phase` is active, the new handler
    /// is entered immediately.
    pub fn with_handler(mut self, phase: Phase, handler: Box<dyn PhaseHandler>) -> Self {
        self.handlers.insert(phase, handler);
        if phase == self.current {
            let ctx = self.context(Duration::ZERO);
            let handler = self.handler_mut(phase);
            handler.on_enter(&ctx);
            let locks = handler.locks_transitions();
            self.phase_lock = locks;
        }
        self
    }

    pub fn config(&self) -> &PhaseConfig {
        &self.config
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    pub fn previous(&self) -> Option<Phase> {
        self.previous
    }

    pub fn time_in_phase(&self) -> Duration {
        self.time_in_phase
    }

    pub fn is_locked(&self) -> bool {
        self.held_lock || self.phase_lock
    }

    /// Sets or clears the host-held transition lock.
    pub fn lock_transitions(&mut self, locked: bool) {
        debug!(target: "combat::phase", locked, "Transition lock changed");
        self.held_lock = locked;
    }

    /// Whether a regular transition to `target` would succeed right now.
    pub fn can_transition_to(&self, target: Phase) -> bool {
        self.check(target).is_ok()
    }

    /// Requests a regular transition.
    pub fn transition_to(&mut self, target: Phase) -> Result<()> {
        if let Err(error) = self.check(target) {
            warn!(
                target: "combat::phase",
                from = %self.current,
                to = %target,
                error = %error,
                "Phase transition rejected"
            );
            return Err(error);
        }
        self.switch(target);
        Ok(())
    }

    /// Performs a table-valid transition even while locked. The host-held
    /// lock is restored afterwards whatever the outcome.
    pub fn force_transition(&mut self, target: Phase) -> Result<()> {
        let held = self.held_lock;
        self.held_lock = false;
        self.bypass = true;

        let result = self.transition_to(target);

        self.bypass = false;
        self.held_lock = held;
        result
    }

    /// Tears the encounter down: exits the active phase and enters Idle
    /// regardless of the table. Clears the host-held lock.
    pub fn reset(&mut self) {
        self.held_lock = false;
        if self.current != Phase::Idle {
            self.switch(Phase::Idle);
        }
    }

    /// Runs the active phase's per-tick update and as many fixed-step
    /// updates as `delta` covers.
    pub fn tick(&mut self, delta: Duration, signals: PhaseSignals) {
        self.signals = signals;
        self.time_in_phase = self.time_in_phase.saturating_add(delta);
        self.fixed_accumulator = self.fixed_accumulator.saturating_add(delta);

        let ctx = self.context(delta);
        let flow = self.handler_mut(self.current).on_update(&ctx);
        self.apply(flow);

        let step = self.config.fixed_step();
        if step.is_zero() {
            return;
        }
        let mut steps = 0;
        while self.fixed_accumulator >= step {
            if steps == PhaseConfig::MAX_FIXED_STEPS_PER_TICK {
                debug!(
                    target: "combat::phase",
                    dropped = ?self.fixed_accumulator,
                    "Fixed-step backlog dropped"
                );
                self.fixed_accumulator = Duration::ZERO;
                break;
            }
            self.fixed_accumulator -= step;
            steps += 1;

            let ctx = self.context(step);
            let flow = self.handler_mut(self.current).on_fixed_update(&ctx);
            self.apply(flow);
        }
    }

    pub fn drain_events(&mut self) -> Vec<PhaseEvent> {
        self.events.drain()
    }

    fn check(&self, target: Phase) -> Result<()> {
        if target == self.current {
            return Err(TransitionError::AlreadyInPhase { phase: target });
        }
        if self.is_locked() && !self.bypass {
            return Err(TransitionError::Locked {
                current: self.current,
            });
        }
        if !self.current.can_transition_to(target) {
            return Err(TransitionError::NotAllowed {
                from: self.current,
                to: target,
            });
        }
        Ok(())
    }

    fn apply(&mut self, flow: PhaseFlow) {
        match flow {
            PhaseFlow::Continue => {}
            PhaseFlow::Transition(target) => {
                // Phase timers outrank the host lock; a locking phase still holds.
                let held = self.held_lock;
                self.held_lock = false;
                // Rejections are already logged by transition_to.
                let _ = self.transition_to(target);
                self.held_lock = held;
            }
            PhaseFlow::Elapsed => {
                debug!(target: "combat::phase", phase = %self.current, "Phase hold elapsed");
                self.events.push(PhaseEvent::HoldElapsed {
                    phase: self.current,
                });
            }
        }
    }

    fn switch(&mut self, target: Phase) {
        let from = self.current;

        let ctx = self.context(Duration::ZERO);
        self.handler_mut(from).on_exit(&ctx);
        self.phase_lock = false;

        self.previous = Some(from);
        self.current = target;
        self.time_in_phase = Duration::ZERO;
        self.fixed_accumulator = Duration::ZERO;

        let ctx = self.context(Duration::ZERO);
        let handler = self.handler_mut(target);
        handler.on_enter(&ctx);
        let locks = handler.locks_transitions();
        self.phase_lock = locks;

        info!(target: "combat::phase", from = %from, to = %target, "Phase changed");
        self.events.push(PhaseEvent::Changed { from, to: target });
    }

    fn context(&self, delta: Duration) -> PhaseContext {
        PhaseContext {
            delta,
            time_in_phase: self.time_in_phase,
            signals: self.signals,
        }
    }

    fn handler_mut(&mut self, phase: Phase) -> &mut dyn PhaseHandler {
        self.handlers
            .entry(phase)
            .or_insert_with(|| handlers::default_handler(phase, &self.config))
            .as_mut()
    }

    #[cfg(test)]
    pub(crate) fn jump(&mut self, phase: Phase) {
        if self.current != phase {
            self.switch(phase);
        }
        self.events.clear();
    }
}
