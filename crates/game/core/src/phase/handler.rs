use std::time::Duration;

use super::Phase;

/// Inputs the machine hands to the active phase's hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseContext {
    /// Time since the previous hook call (`tick` delta or one fixed step).
    pub delta: Duration,
    /// Time spent in the active phase, including `delta`.
    pub time_in_phase: Duration,
    /// External facts the orchestrator reports every tick.
    pub signals: PhaseSignals,
}

/// Facts about the rest of the encounter that phase-local logic may use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseSignals {
    /// Actions waiting in the runner's queue.
    pub queued_actions: usize,
}

/// What the active phase wants after an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseFlow {
    Continue,
    /// Request a table-checked transition. The host-held lock does not apply;
    /// a locking phase (ExecutingAction) still refuses it.
    Transition(Phase),
    /// The phase's local wait is over and the next phase is an external
    /// decision; the machine reports [`PhaseEvent::HoldElapsed`](crate::event::PhaseEvent).
    Elapsed,
}

/// Per-phase behavior. One instance per [`Phase`] lives in the machine's
/// registry; it is reused across visits, so `on_enter` must reset any state a
/// previous visit left behind.
pub trait PhaseHandler: Send {
    fn on_enter(&mut self, _ctx: &PhaseContext) {}

    fn on_update(&mut self, _ctx: &PhaseContext) -> PhaseFlow {
        PhaseFlow::Continue
    }

    fn on_fixed_update(&mut self, _ctx: &PhaseContext) -> PhaseFlow {
        PhaseFlow::Continue
    }

    fn on_exit(&mut self, _ctx: &PhaseContext) {}

    /// Whether transitions are locked while this phase is active. Only a
    /// forced transition leaves a locking phase.
    fn locks_transitions(&self) -> bool {
        false
    }
}
