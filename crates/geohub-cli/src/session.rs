use std::path::{Path, PathBuf};

use geohub_sdk::WorkspaceId;
use serde::{Deserialize, Serialize};

const SESSION_FILE: &str = "session.json";

/// What the CLI remembers between invocations.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub last_workspace: Option<WorkspaceId>,
}

impl Session {
    fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(SESSION_FILE)
    }

    /// Missing or unreadable session files start a fresh session.
    pub fn load(data_dir: &Path) -> Self {
        std::fs::read(Self::path(data_dir))
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, data_dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(data_dir)?;
        std::fs::write(Self::path(data_dir), serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_last_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let session = Session {
            last_workspace: Some(WorkspaceId::new("ws-42")),
        };
        session.save(dir.path()).unwrap();
        assert_eq!(Session::load(dir.path()), session);
    }

    #[test]
    fn garbage_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), b"{not json").unwrap();
        assert_eq!(Session::load(dir.path()), Session::default());
    }
}
