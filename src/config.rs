use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// User configuration loaded from `<home>/config.yaml`.
///
/// Every key is optional; a missing file yields the defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SessionConfig {
    /// Catalog cap used when a caller passes limit 0. Default: 50
    #[serde(default = "default_max_listed_sessions")]
    pub max_listed_sessions: usize,
    /// Exited sessions kept by cleanup, newest first. Default: 50
    #[serde(default = "default_max_exited_sessions")]
    pub max_exited_sessions: usize,
    /// Exited sessions older than this are removed by cleanup; 0 disables. Default: 30
    #[serde(default = "default_max_exited_session_age_days")]
    pub max_exited_session_age_days: u32,
    /// Checkpoint cadence of a live browser process. Default: 15
    #[serde(default = "default_snapshot_interval_secs")]
    pub snapshot_interval_secs: u64,
    /// Executable used to resume sessions; defaults to the running binary.
    #[serde(default)]
    pub browser_command: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_listed_sessions: default_max_listed_sessions(),
            max_exited_sessions: default_max_exited_sessions(),
            max_exited_session_age_days: default_max_exited_session_age_days(),
            snapshot_interval_secs: default_snapshot_interval_secs(),
            browser_command: None,
        }
    }
}

fn default_max_listed_sessions() -> usize {
    50
}

fn default_max_exited_sessions() -> usize {
    50
}

fn default_max_exited_session_age_days() -> u32 {
    30
}

fn default_snapshot_interval_secs() -> u64 {
    15
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset. Default: info
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Write tracing output to `<home>/logs/paneweave.log`. Default: true
    #[serde(default = "default_file_log")]
    pub file_log: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_log: default_file_log(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_file_log() -> bool {
    true
}

impl Config {
    /// Loads the config file, or the defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))
            }
        };
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file as YAML: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.session.snapshot_interval_secs == 0 {
            anyhow::bail!("session.snapshot_interval_secs must be at least 1");
        }
        if let Some(command) = &self.session.browser_command {
            if command.trim().is_empty() {
                anyhow::bail!("session.browser_command must not be empty when set");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
