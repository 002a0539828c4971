use std::path::{Path, PathBuf};
use std::time::Duration;

use geohub_demo::DemoCatalog;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Name of the optional config file inside the data directory.
pub const CONFIG_FILE: &str = "geohub.toml";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Root of the disk store.
    pub data_dir: PathBuf,
    /// Upper bound on stored blob bytes; `None` means unbounded.
    pub storage_quota_bytes: Option<u64>,
    pub http_timeout_secs: u64,
    /// `exiftool` executable used for GPS extraction; `None` disables it.
    pub exiftool: Option<PathBuf>,
    pub demo: DemoCatalog,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".geohub"),
            storage_quota_bytes: None,
            http_timeout_secs: 30,
            exiftool: Some(PathBuf::from("exiftool")),
            demo: DemoCatalog::default(),
        }
    }
}

impl HubConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))
    }

    /// Load `geohub.toml` from `data_dir` if present, else defaults. Either
    /// way `data_dir` wins over whatever the file says.
    pub fn load_from_dir(data_dir: &Path) -> SdkResult<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            Self::load(&path)?
        } else {
            Self::default()
        };
        config.data_dir = data_dir.to_path_buf();
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}
