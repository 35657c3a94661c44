//! Decision provider implementations for headless encounters.

pub mod scripted;

pub use scripted::ScriptedProvider;
