//! Scripted actions for headless encounters and tests.

use std::sync::Arc;
use std::time::Duration;

use combat_core::{
    ActionCategory, ActionContext, ActionPoll, CombatAction, Participant, UndoError,
};

use crate::roster::RosterParticipant;

/// Completes once `duration` has elapsed since it started.
#[derive(Clone, Debug)]
pub struct TimedAction {
    name: String,
    category: ActionCategory,
    duration: Duration,
    cancelled: bool,
}

impl TimedAction {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            category: ActionCategory::Other,
            duration,
            cancelled: false,
        }
    }

    pub fn with_category(mut self, category: ActionCategory) -> Self {
        self.category = category;
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl CombatAction for TimedAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> ActionCategory {
        self.category
    }

    fn execute(&mut self, ctx: &ActionContext) -> ActionPoll {
        self.poll(ctx)
    }

    fn poll(&mut self, ctx: &ActionContext) -> ActionPoll {
        if ctx.elapsed >= self.duration {
            ActionPoll::Complete
        } else {
            ActionPoll::Pending
        }
    }

    fn cancel(&mut self) {
        self.cancelled = true;
    }
}

/// Knocks `target` out when it completes. Refuses to start against a target
/// that is already down; undo brings the target back.
#[derive(Debug)]
pub struct KnockoutAction {
    name: String,
    target: Arc<RosterParticipant>,
    wind_up: Duration,
}

impl KnockoutAction {
    pub fn new(target: Arc<RosterParticipant>, wind_up: Duration) -> Self {
        Self {
            name: format!("knock out {}", target.name()),
            target,
            wind_up,
        }
    }

    pub fn target(&self) -> &Arc<RosterParticipant> {
        &self.target
    }
}

impl CombatAction for KnockoutAction {
    fn name(&self) -> &str {
        &self.name
    }

    fn category(&self) -> ActionCategory {
        ActionCategory::Attack
    }

    fn can_execute(&self) -> bool {
        self.target.is_alive()
    }

    fn execute(&mut self, ctx: &ActionContext) -> ActionPoll {
        self.poll(ctx)
    }

    fn poll(&mut self, ctx: &ActionContext) -> ActionPoll {
        if ctx.elapsed < self.wind_up {
            return ActionPoll::Pending;
        }
        self.target.knock_out();
        ActionPoll::Complete
    }

    fn undo(&mut self) -> Result<(), UndoError> {
        if self.target.is_alive() {
            return Err(UndoError::Failed(format!(
                "{} is not knocked out",
                self.target.name()
            )));
        }
        self.target.revive();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{ActionId, Controller, ParticipantId, Timestamp};

    use crate::roster::RosterEntry;

    fn ctx(elapsed_ms: u64) -> ActionContext {
        ActionContext {
            id: ActionId(0),
            now: Timestamp(Duration::from_millis(elapsed_ms)),
            delta: Duration::from_millis(50),
            elapsed: Duration::from_millis(elapsed_ms),
        }
    }

    fn goblin() -> Arc<RosterParticipant> {
        Arc::new(RosterParticipant::new(
            ParticipantId(2),
            &RosterEntry::new("Goblin", 6, Controller::Ai),
        ))
    }

    #[test]
    fn timed_action_waits_for_duration() {
        let mut action = TimedAction::new("channel", Duration::from_millis(200));
        assert_eq!(action.execute(&ctx(0)), ActionPoll::Pending);
        assert_eq!(action.poll(&ctx(150)), ActionPoll::Pending);
        assert_eq!(action.poll(&ctx(200)), ActionPoll::Complete);
    }

    #[test]
    fn zero_duration_completes_on_execute() {
        let mut action = TimedAction::new("blink", Duration::ZERO).with_category(ActionCategory::Move);
        assert_eq!(action.category(), ActionCategory::Move);
        assert_eq!(action.execute(&ctx(0)), ActionPoll::Complete);
    }

    #[test]
    fn knockout_downs_target_and_undo_revives() {
        let target = goblin();
        let mut action = KnockoutAction::new(Arc::clone(&target), Duration::from_millis(100));
        assert!(action.can_execute());
        assert_eq!(action.name(), "knock out Goblin");

        assert_eq!(action.execute(&ctx(0)), ActionPoll::Pending);
        assert!(target.is_alive());
        assert_eq!(action.poll(&ctx(100)), ActionPoll::Complete);
        assert!(!target.is_alive());
        assert!(!action.can_execute());

        assert_eq!(action.undo(), Ok(()));
        assert!(target.is_alive());
        assert!(matches!(action.undo(), Err(UndoError::Failed(_))));
    }
}
