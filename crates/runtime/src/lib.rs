//! Async host for combat encounters.
//!
//! The core library is synchronous and host-driven. This crate gives it a home
//! on a tokio runtime: a background worker owns the [`combat_core::Encounter`],
//! ticks it on a fixed interval and publishes every notification to an
//! [`EventBus`]. Clients talk to the worker through a cloneable
//! [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the types downstream clients interact with
//! - [`events`] provides the topic-based event bus
//! - [`providers`] ships ready-made decision providers for headless runs
//! - `workers` keeps the simulation task internal to the crate
pub mod api;
pub mod events;
pub mod providers;
pub mod runtime;

mod workers;

pub use api::{
    Decision, DecisionProvider, PassProvider, ProviderKind, Result, RunnerControl, RuntimeError,
    RuntimeHandle,
};
pub use events::{Event, EventBus, Topic};
pub use providers::ScriptedProvider;
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
