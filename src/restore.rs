//! Restore orchestration: validate a snapshot, then resume it in a new,
//! detached browser process that takes ownership of the same session id.

use crate::domain::{SessionId, SESSION_STATE_VERSION};
use crate::error::SessionError;
use crate::store::SessionStore;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Subcommand and flag understood by the resumed process.
pub const BROWSE_SUBCOMMAND: &str = "browse";
pub const RESTORE_FLAG: &str = "--restore-session";

/// Starts a new process that resumes a session.
pub trait ProcessSpawner: Send + Sync {
    /// Returns once the OS reports the process started; the pid is informational.
    fn spawn_with_session(&self, id: &SessionId) -> std::io::Result<u32>;
}

/// Spawns `<executable> browse --restore-session <id>` with no inherited
/// standard streams, in its own process group.
#[derive(Debug, Clone)]
pub struct DetachedSpawner {
    executable: PathBuf,
}

impl DetachedSpawner {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub fn executable(&self) -> &std::path::Path {
        &self.executable
    }

    fn command(&self, id: &SessionId) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(BROWSE_SUBCOMMAND)
            .arg(RESTORE_FLAG)
            .arg(id.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Keeps terminal signals aimed at the caller away from the child.
            cmd.process_group(0);
        }
        cmd
    }
}

impl ProcessSpawner for DetachedSpawner {
    fn spawn_with_session(&self, id: &SessionId) -> std::io::Result<u32> {
        let mut child = self.command(id).spawn()?;
        let pid = child.id();
        // Reap in the background so a long-lived caller never keeps a zombie.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(pid)
    }
}

/// Outcome of a successful restore request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub session_id: SessionId,
    pub pid: u32,
    pub tabs: usize,
    pub panes: usize,
}

pub struct RestoreOrchestrator<'a> {
    store: &'a dyn SessionStore,
    spawner: &'a dyn ProcessSpawner,
}

impl<'a> RestoreOrchestrator<'a> {
    pub fn new(store: &'a dyn SessionStore, spawner: &'a dyn ProcessSpawner) -> Self {
        Self { store, spawner }
    }

    /// Validates that the session is resumable, then spawns the resuming process.
    ///
    /// The caller's own session and sessions owned by a live process are
    /// refused before anything is spawned.
    ///
    /// Fire and forget: the call does not wait for the new process to take
    /// the session lock, and two calls in quick succession both spawn. The
    /// second process then fails to start with `AlreadyLive`.
    pub fn restore(
        &self,
        raw_id: &str,
        current: Option<&SessionId>,
    ) -> Result<RestoreReport, SessionError> {
        let Some(id) = SessionId::parse(raw_id) else {
            let reason = if raw_id.trim().is_empty() {
                "session id is empty"
            } else {
                "session id is not valid"
            };
            return Err(failed(raw_id, reason));
        };
        if current == Some(&id) {
            return Err(failed(id.as_str(), "cannot restore the current session"));
        }

        match self.store.find(&id) {
            Ok(Some(_)) => {}
            Ok(None) => return Err(failed(id.as_str(), "session not found")),
            Err(e) => return Err(failed(id.as_str(), format!("store lookup failed: {}", e))),
        }
        if self.store.is_live(&id) {
            return Err(failed(id.as_str(), "session is owned by a live process"));
        }

        let state = match self.store.get_state_strict(&id) {
            Ok(Some(state)) => state,
            Ok(None) => return Err(failed(id.as_str(), "session has no saved state")),
            Err(e) => return Err(failed(id.as_str(), format!("unusable saved state: {}", e))),
        };
        if state.version > SESSION_STATE_VERSION {
            return Err(failed(
                id.as_str(),
                format!(
                    "snapshot version {} is newer than supported version {}",
                    state.version, SESSION_STATE_VERSION
                ),
            ));
        }

        let (tabs, panes) = (state.tab_count(), state.pane_count());
        tracing::info!(session_id = %id, tabs, panes, "restoring session");

        let pid = self.spawner.spawn_with_session(&id).map_err(|e| {
            tracing::warn!(session_id = %id, error = %e, "failed to spawn resuming process");
            SessionError::SpawnFailed {
                id: id.to_string(),
                reason: e.to_string(),
            }
        })?;

        tracing::info!(session_id = %id, pid, "resuming process started");
        Ok(RestoreReport {
            session_id: id,
            pid,
            tabs,
            panes,
        })
    }
}

fn failed(id: &str, reason: impl Into<String>) -> SessionError {
    let reason = reason.into();
    tracing::warn!(session_id = %id, reason = %reason, "restore rejected");
    SessionError::RestoreFailed {
        id: id.to_string(),
        reason,
    }
}

#[cfg(test)]
#[path = "tests/restore_tests.rs"]
mod tests;
