//! Roster loader.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};
use crate::roster::RosterEntry;

/// Roster structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterFile {
    pub participants: Vec<RosterEntry>,
}

/// Loader for encounter rosters from RON files.
pub struct RosterLoader;

impl RosterLoader {
    /// Load the roster entries of a RON file containing a [`RosterFile`].
    pub fn load(path: &Path) -> LoadResult<Vec<RosterEntry>> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<Vec<RosterEntry>> {
        let roster: RosterFile = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;

        if roster.participants.is_empty() {
            anyhow::bail!("Roster lists no participants");
        }
        Ok(roster.participants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::Controller;
    use tempfile::TempDir;

    #[test]
    fn bundled_roster_loads() {
        let entries = RosterLoader::parse(include_str!("../../data/roster.ron")).unwrap();

        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0].name, "Aria");
        assert_eq!(entries[0].controller, Controller::Player);
        assert!(entries[0].starts_alive());
        assert!(!entries[4].starts_alive());
    }

    #[test]
    fn load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("duel.ron");
        std::fs::write(
            &path,
            r#"RosterFile(participants: [
                (name: "Hero", speed: 10, controller: Player),
                (name: "Wolf", speed: 7, controller: Ai),
            ])"#,
        )
        .unwrap();

        let entries = RosterLoader::load(&path).unwrap();
        assert_eq!(entries[1], RosterEntry::new("Wolf", 7, Controller::Ai));
    }

    #[test]
    fn empty_roster_is_rejected() {
        let error = RosterLoader::parse("RosterFile(participants: [])").unwrap_err();
        assert!(error.to_string().contains("no participants"));
    }
}
