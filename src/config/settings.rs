//! Application settings and paths.
//!
//! Resolves the XDG settings file location and merges file values with
//! command-line overrides into one validated, immutable settings value.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::icmp::DEFAULT_PAYLOAD_SIZE;
use crate::scanner::{SweepConfig, DEFAULT_CONCURRENCY, DEFAULT_ESCALATION_FACTOR, DEFAULT_TIMEOUT};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest ICMP echo payload that fits in one IPv4 datagram.
const MAX_PAYLOAD_SIZE: usize = 65507;

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/pingscan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve paths using XDG directories. Nothing is created on disk.
    pub fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "pingscan", "pingscan")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Sweep settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Maximum hosts probed at once.
    pub concurrency: usize,
    /// First-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Multiplier for the retry timeout.
    pub escalation_factor: u32,
    /// Probes per second, 0 for unlimited.
    pub rate_limit: u32,
    /// Echo payload size in bytes.
    pub payload_size: usize,
    /// Largest subnet to expand, 0 for no limit.
    pub max_hosts: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            escalation_factor: DEFAULT_ESCALATION_FACTOR,
            rate_limit: 0,
            payload_size: DEFAULT_PAYLOAD_SIZE,
            max_hosts: 0,
        }
    }
}

/// Values given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub concurrency: Option<usize>,
    pub timeout_ms: Option<u64>,
    pub escalation_factor: Option<u32>,
    pub rate_limit: Option<u32>,
    pub payload_size: Option<usize>,
    pub max_hosts: Option<usize>,
}

impl AppSettings {
    /// Load settings from the default location, or defaults if the file
    /// does not exist.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::new()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    /// Apply command-line overrides and validate the result.
    pub fn with_overrides(mut self, overrides: &Overrides) -> ConfigResult<Self> {
        if let Some(v) = overrides.concurrency {
            self.concurrency = v;
        }
        if let Some(v) = overrides.timeout_ms {
            self.timeout_ms = v;
        }
        if let Some(v) = overrides.escalation_factor {
            self.escalation_factor = v;
        }
        if let Some(v) = overrides.rate_limit {
            self.rate_limit = v;
        }
        if let Some(v) = overrides.payload_size {
            self.payload_size = v;
        }
        if let Some(v) = overrides.max_hosts {
            self.max_hosts = v;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject settings the scheduler cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout",
                reason: "must be at least 1ms".to_string(),
            });
        }
        if self.escalation_factor == 0 {
            return Err(ConfigError::InvalidValue {
                field: "escalation",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.payload_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "size",
                reason: format!("must be at most {} bytes", MAX_PAYLOAD_SIZE),
            });
        }
        Ok(())
    }

    /// Scheduler configuration derived from these settings.
    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig::new()
            .with_concurrency(self.concurrency)
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_escalation_factor(self.escalation_factor)
            .with_rate_limit(self.rate_limit)
    }
}
