//! Action submission and sequential execution.
//!
//! Hosts implement [`CombatAction`] and hand boxed actions to the
//! [`ActionRunner`], which runs them one at a time in submission order.

mod errors;
mod queued;
mod runner;
mod traits;

pub use errors::{EnqueueError, UndoError};
pub use queued::{ActionId, ActionRecord, ActionStatus, QueuedAction};
pub use runner::ActionRunner;
pub use traits::{ActionCategory, ActionContext, ActionPoll, CombatAction};
