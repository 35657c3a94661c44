use std::time::Duration;

use crate::clock::Timestamp;

use super::{ActionId, UndoError};

/// Coarse classification of an action, carried by runner notifications.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum ActionCategory {
    Attack,
    Defend,
    Skill,
    Item,
    Move,
    Wait,
    #[default]
    Other,
}

/// Result of driving an action one step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionPoll {
    /// Still running; poll again next tick.
    Pending,
    Complete,
}

/// What the runner tells an action each time it drives it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActionContext {
    pub id: ActionId,
    /// Runner clock at this call.
    pub now: Timestamp,
    /// Time since the previous call (zero for `execute`).
    pub delta: Duration,
    /// Time since the action started.
    pub elapsed: Duration,
}

/// A host-supplied action executed by the [`ActionRunner`](super::ActionRunner).
///
/// `execute` is called exactly once after `can_execute` passes and doubles as
/// the first poll. Actions that finish instantly return
/// [`ActionPoll::Complete`]; time-extended ones return `Pending` and are
/// polled once per tick until they complete or get cancelled.
pub trait CombatAction: Send {
    fn name(&self) -> &str;

    fn category(&self) -> ActionCategory {
        ActionCategory::Other
    }

    /// Pre-execution check, evaluated when the action is dequeued.
    fn can_execute(&self) -> bool {
        true
    }

    fn execute(&mut self, ctx: &ActionContext) -> ActionPoll;

    fn poll(&mut self, _ctx: &ActionContext) -> ActionPoll {
        ActionPoll::Complete
    }

    /// Cooperative cancellation. The action is never polled again afterwards.
    fn cancel(&mut self) {}

    fn undo(&mut self) -> Result<(), UndoError> {
        Err(UndoError::Unsupported)
    }
}
