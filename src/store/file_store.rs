//! File-backed session store.
//!
//! Layout under the store root:
//! - `sessions/<id>.json` - session record
//! - `snapshots/<id>.json` - latest resumable state
//! - `locks/session_<id>.lock` - held by the owning process
//!
//! Writes go to a temp file and are renamed into place, so readers never
//! observe a half-written record.

use super::liveness::{self, SessionLock};
use super::SessionStore;
use crate::domain::{
    parse_state, parse_state_strict, Session, SessionId, SessionState, StateDecodeError,
};
use crate::error::StoreError;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

impl FileSessionStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Claims ownership of a session for the calling process.
    pub fn acquire_lock(&self, id: &SessionId) -> Result<SessionLock, StoreError> {
        SessionLock::acquire(&paths::locks_dir(&self.root), id)
    }

    fn lock_path(&self, id: &SessionId) -> PathBuf {
        paths::session_lock_path(&paths::locks_dir(&self.root), id.as_str())
    }

    fn read_state_text(&self, id: &SessionId) -> Result<Option<(PathBuf, String)>, StoreError> {
        let path = paths::snapshot_path(&self.root, id.as_str());
        Ok(read_optional(&path)?.map(|text| (path, text)))
    }
}

/// Reads a file, mapping a missing file to `None`.
fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let Some(text) = read_optional(path)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| StoreError::Corrupt {
            path: path.to_path_buf(),
            source,
        })
}

/// Writes JSON to a temp file, then renames it over the target.
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content).map_err(|e| StoreError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))?;
    Ok(())
}

fn remove_if_exists(path: &Path) -> Result<(), StoreError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::io(path, e)),
    }
}

impl SessionStore for FileSessionStore {
    fn get_active_session(&self) -> Result<Option<Session>, StoreError> {
        let sessions = match self.list() {
            Ok(sessions) => sessions,
            Err(e) if e.is_schema_missing() => return Ok(None),
            Err(e) => return Err(e),
        };
        Ok(sessions
            .into_iter()
            .filter(|s| s.is_browser() && !s.has_ended() && self.is_live(&s.id))
            .max_by(|a, b| a.started_at.cmp(&b.started_at)))
    }

    fn list(&self) -> Result<Vec<Session>, StoreError> {
        let dir = paths::sessions_dir(&self.root);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::SchemaMissing { path: dir });
            }
            Err(e) => return Err(StoreError::io(&dir, e)),
        };

        let mut sessions = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match read_json::<Session>(&path) {
                Ok(Some(session)) => {
                    if !session.id.is_canonical() {
                        tracing::debug!(session_id = %session.id, "session id predates the current format");
                    }
                    sessions.push(session);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable session record"),
            }
        }
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }

    fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        read_json(&paths::session_record_path(&self.root, id.as_str()))
    }

    fn get_state(&self, id: &SessionId) -> Result<Option<SessionState>, StoreError> {
        let Some((path, text)) = self.read_state_text(id)? else {
            return Ok(None);
        };
        parse_state(&text)
            .map(Some)
            .map_err(|source| StoreError::Corrupt { path, source })
    }

    fn get_state_strict(&self, id: &SessionId) -> Result<Option<SessionState>, StoreError> {
        let Some((path, text)) = self.read_state_text(id)? else {
            return Ok(None);
        };
        match parse_state_strict(&text) {
            Ok(state) => Ok(Some(state)),
            Err(StateDecodeError::Json(source)) => Err(StoreError::Corrupt { path, source }),
            Err(StateDecodeError::Tree(e)) => Err(StoreError::Invalid {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        session.validate().map_err(|reason| StoreError::Invalid {
            id: session.id.to_string(),
            reason,
        })?;
        write_json_atomic(
            &paths::session_record_path(&self.root, session.id.as_str()),
            session,
        )
    }

    fn save_state(&self, state: &SessionState) -> Result<(), StoreError> {
        write_json_atomic(
            &paths::snapshot_path(&self.root, state.session_id.as_str()),
            state,
        )?;
        tracing::debug!(
            session_id = %state.session_id,
            tabs = state.tab_count(),
            panes = state.pane_count(),
            "snapshot saved"
        );
        Ok(())
    }

    fn mark_ended(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let Some(mut session) = self.find(id)? else {
            return Err(StoreError::Invalid {
                id: id.to_string(),
                reason: "session record does not exist".to_string(),
            });
        };
        session.ended_at = Some(at.max(session.started_at));
        self.save(&session)
    }

    fn delete_snapshot(&self, id: &SessionId) -> Result<(), StoreError> {
        // Snapshot first: a record without its snapshot is still listed and
        // can be deleted again, while an orphaned snapshot would be invisible.
        // The lock file stays; see `liveness`.
        remove_if_exists(&paths::snapshot_path(&self.root, id.as_str()))?;
        remove_if_exists(&paths::session_record_path(&self.root, id.as_str()))?;
        Ok(())
    }

    fn is_live(&self, id: &SessionId) -> bool {
        match liveness::probe(&self.lock_path(id)) {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "liveness probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/file_store_tests.rs"]
mod tests;
