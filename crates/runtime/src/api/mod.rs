//! Public API surface for runtime clients.
//!
//! Re-exports the handle, error types, and provider traits needed to drive an
//! encounter from outside the worker task.
mod errors;
mod handle;
mod providers;

pub use errors::{ProviderKind, Result, RuntimeError};
pub use handle::{RunnerControl, RuntimeHandle};
pub use providers::{Decision, DecisionProvider, PassProvider};
