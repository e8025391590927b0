//! Centralized home-based storage paths for all paneweave persistence.
//!
//! Everything lives under a single home directory (`~/.paneweave/` unless
//! `PANEWEAVE_HOME` points elsewhere):
//! - `sessions/` - Session records, one JSON file per session
//! - `snapshots/` - Resumable session state, one JSON file per session
//! - `locks/` - Liveness lock files held by running browser processes
//! - `logs/paneweave.log` - Tracing output
//! - `config.yaml` - User configuration

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// The name of the paneweave directory inside the user's home.
const PANEWEAVE_DIR: &str = ".paneweave";

/// Environment variable overriding the home directory.
pub const HOME_ENV: &str = "PANEWEAVE_HOME";

/// Resolves the home directory without touching the filesystem.
///
/// # Errors
///
/// Returns an error if `PANEWEAVE_HOME` is unset and the user's home
/// directory cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    if let Some(custom) = std::env::var_os(HOME_ENV) {
        if !custom.is_empty() {
            return Ok(PathBuf::from(custom));
        }
    }
    let home = dirs::home_dir().context("Could not determine home directory for session storage")?;
    Ok(home.join(PANEWEAVE_DIR))
}

/// Returns the home directory, creating it if it doesn't exist.
pub fn ensure_home_dir() -> Result<PathBuf> {
    let dir = home_dir()?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create paneweave directory: {}", dir.display()))?;
    Ok(dir)
}

/// Returns the session records directory: `<root>/sessions/`
///
/// Not created here: a missing directory means no session was ever saved.
pub fn sessions_dir(root: &Path) -> PathBuf {
    root.join("sessions")
}

/// Returns the snapshot directory: `<root>/snapshots/`
pub fn snapshots_dir(root: &Path) -> PathBuf {
    root.join("snapshots")
}

/// Returns the lock directory: `<root>/locks/`
pub fn locks_dir(root: &Path) -> PathBuf {
    root.join("locks")
}

/// Returns the record path for a session: `<root>/sessions/<id>.json`
pub fn session_record_path(root: &Path, session_id: &str) -> PathBuf {
    sessions_dir(root).join(format!("{}.json", session_id))
}

/// Returns the snapshot path for a session: `<root>/snapshots/<id>.json`
pub fn snapshot_path(root: &Path, session_id: &str) -> PathBuf {
    snapshots_dir(root).join(format!("{}.json", session_id))
}

/// Returns the lock file path for a session: `<locks>/session_<id>.lock`
pub fn session_lock_path(lock_dir: &Path, session_id: &str) -> PathBuf {
    lock_dir.join(format!("session_{}.lock", session_id))
}

/// Returns the config file path: `<root>/config.yaml`
pub fn config_path(root: &Path) -> PathBuf {
    root.join("config.yaml")
}

/// Returns the log file path: `<root>/logs/paneweave.log`
///
/// Creates the logs directory if it doesn't exist.
pub fn log_path(root: &Path) -> Result<PathBuf> {
    let logs = root.join("logs");
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs.join("paneweave.log"))
}

#[cfg(test)]
#[path = "tests/paths_tests.rs"]
mod tests;
