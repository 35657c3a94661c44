use std::fmt;

use crate::clock::Timestamp;
use crate::event::ActionTag;

use super::{ActionCategory, CombatAction};

/// Monotonic identifier assigned to every accepted submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionStatus {
    Queued,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// One submission owned by the runner: the action plus its bookkeeping.
pub struct QueuedAction {
    id: ActionId,
    action: Box<dyn CombatAction>,
    priority: i32,
    pub(crate) status: ActionStatus,
    queued_at: Timestamp,
    pub(crate) started_at: Option<Timestamp>,
    pub(crate) ended_at: Option<Timestamp>,
}

impl QueuedAction {
    pub(crate) fn new(
        id: ActionId,
        action: Box<dyn CombatAction>,
        priority: i32,
        queued_at: Timestamp,
    ) -> Self {
        Self {
            id,
            action,
            priority,
            status: ActionStatus::Queued,
            queued_at,
            started_at: None,
            ended_at: None,
        }
    }

    pub fn id(&self) -> ActionId {
        self.id
    }

    pub fn name(&self) -> &str {
        self.action.name()
    }

    pub fn category(&self) -> ActionCategory {
        self.action.category()
    }

    /// Informational only; never changes dequeue order.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn status(&self) -> ActionStatus {
        self.status
    }

    pub fn queued_at(&self) -> Timestamp {
        self.queued_at
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<Timestamp> {
        self.ended_at
    }

    pub(crate) fn action_mut(&mut self) -> &mut dyn CombatAction {
        self.action.as_mut()
    }

    pub fn tag(&self) -> ActionTag {
        ActionTag {
            id: self.id,
            name: self.name().to_owned(),
            category: self.category(),
            priority: self.priority,
        }
    }

    /// Plain-data copy of this entry.
    pub fn record(&self) -> ActionRecord {
        ActionRecord {
            id: self.id,
            name: self.name().to_owned(),
            category: self.category(),
            priority: self.priority,
            status: self.status,
            queued_at: self.queued_at,
            started_at: self.started_at,
            ended_at: self.ended_at,
        }
    }
}

impl fmt::Debug for QueuedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedAction")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("priority", &self.priority)
            .field("status", &self.status)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionRecord {
    pub id: ActionId,
    pub name: String,
    pub category: ActionCategory,
    pub priority: i32,
    pub status: ActionStatus,
    pub queued_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
}
