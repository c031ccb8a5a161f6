pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing directly at a config file
pub const CONFIG_PATH_ENV: &str = "ODIN_CONFIG_PATH";

const LOCAL_CANDIDATES: [&str; 2] = ["odin.yaml", ".odin.yaml"];

/// Operator defaults for the odin CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OdinConfig {
    pub region: String,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
    pub poll_interval_secs: u64,
    /// `0` waits without limit
    pub wait_timeout_secs: u64,
    pub instance_class: String,
    pub subnet_group: Option<String>,
    pub security_groups: Vec<String>,
    pub engine_version: Option<String>,
}

impl Default for OdinConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            profile: None,
            poll_interval_secs: 5,
            wait_timeout_secs: 7200,
            instance_class: "db.m1.small".to_string(),
            subnet_group: None,
            security_groups: Vec::new(),
            engine_version: None,
        }
    }
}

impl OdinConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn wait_timeout(&self) -> Option<Duration> {
        (self.wait_timeout_secs > 0).then(|| Duration::from_secs(self.wait_timeout_secs))
    }

    /// Parse a YAML document; an empty document yields the defaults
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }
}

/// Directory holding the user-wide config file (`~/.config/odin` on Linux)
pub fn get_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("odin"))
}

/// Locate the config file.
///
/// Search order:
/// 1. `ODIN_CONFIG_PATH` (direct path)
/// 2. Current directory: `odin.yaml`, `.odin.yaml`
/// 3. `~/.config/odin/config.yaml` (user-wide)
///
/// Returns `None` when no file exists anywhere.
pub fn find_config_file() -> Result<Option<PathBuf>> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(Some(path));
        }
        tracing::warn!(path = %path.display(), "{} points to a missing file", CONFIG_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;
    for filename in &LOCAL_CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(Some(path));
        }
    }

    if let Ok(config_dir) = get_config_dir() {
        let global_config = config_dir.join("config.yaml");
        if global_config.exists() {
            return Ok(Some(global_config));
        }
    }

    Ok(None)
}

/// Read and parse a config file
pub fn load_from(path: &Path) -> Result<OdinConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    OdinConfig::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config from `explicit` when given, otherwise from the first
/// discovered file. Nothing found means defaults.
pub fn load(explicit: Option<&Path>) -> Result<OdinConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file()?,
    };

    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Loading config");
            load_from(&path)
        }
        None => {
            tracing::debug!("No config file found, using defaults");
            Ok(OdinConfig::default())
        }
    }
}
