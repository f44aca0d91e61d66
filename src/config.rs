use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::watcher::types::{DEFAULT_MAX_IDLE_SECS, DEFAULT_SCAN_INTERVAL_SECS};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub watch: WatchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Directory to watch
    pub target: Option<PathBuf>,
    /// Idle threshold in seconds, for the folder and for each file
    pub max_idle_secs: u64,
    /// Poll interval in seconds
    pub scan_interval_secs: u64,
    /// Only sweep once the folder itself is idle
    pub folder_gate: bool,
    /// Log deletions instead of performing them
    pub dry_run: bool,
    /// Threads used to evaluate files during a sweep
    pub jobs: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            target: None,
            max_idle_secs: DEFAULT_MAX_IDLE_SECS,
            scan_interval_secs: DEFAULT_SCAN_INTERVAL_SECS,
            folder_gate: true,
            dry_run: false,
            jobs: 1,
        }
    }
}

impl Config {
    /// `$XDG_CONFIG_HOME/idle-sweeper/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("idle-sweeper").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; an
    /// explicitly requested file has to exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError { path, source: e })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        validate_scan_interval(self.watch.scan_interval_secs)?;
        validate_jobs(self.watch.jobs)?;
        Ok(())
    }
}

pub(crate) fn validate_scan_interval(secs: u64) -> std::result::Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Invalid(
            "scan interval must be at least 1 second".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn validate_jobs(jobs: usize) -> std::result::Result<(), ConfigError> {
    if jobs == 0 {
        return Err(ConfigError::Invalid("jobs must be at least 1".to_string()));
    }
    Ok(())
}
