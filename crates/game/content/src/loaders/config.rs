//! Combat configuration loader.

use std::path::Path;

use anyhow::Context;
use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load a [`CombatConfig`] from a TOML file. Missing tables and keys fall
    /// back to their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::TurnOrderMode;
    use tempfile::TempDir;

    #[test]
    fn bundled_config_matches_defaults() {
        let config = ConfigLoader::parse(include_str!("../../data/combat.toml")).unwrap();
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            [scheduler]
            order = "speed"

            [runner]
            capacity = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.order, TurnOrderMode::Speed);
        assert_eq!(config.runner.capacity, 8);
        assert_eq!(config.runner.history_len, 32);
        assert_eq!(config.phases, CombatConfig::default().phases);
    }

    #[test]
    fn load_reports_path_and_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("combat.toml");

        let missing = ConfigLoader::load(&path).unwrap_err();
        assert!(missing.to_string().contains("Failed to read file"));

        std::fs::write(&path, "[scheduler]\norder = \"sideways\"\n").unwrap();
        let invalid = ConfigLoader::load(&path).unwrap_err();
        assert!(format!("{invalid:#}").contains("Failed to parse config TOML"));
    }
}
