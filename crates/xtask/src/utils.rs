//! Utility functions for xtask commands

use std::path::PathBuf;

/// Directory holding the bundled roster and combat config.
pub fn content_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("game")
        .join("content")
        .join("data")
}

pub fn default_roster() -> PathBuf {
    content_data_dir().join("roster.ron")
}

pub fn default_config() -> PathBuf {
    content_data_dir().join("combat.toml")
}
