//! Session persistence.
//!
//! The core consumes persistence only through [`SessionStore`]. The shipped
//! implementation is [`FileSessionStore`], one JSON file per record and per
//! snapshot, with cross-process liveness provided by [`SessionLock`].

pub mod file_store;
pub mod liveness;
#[cfg(test)]
pub mod memory;

pub use file_store::FileSessionStore;
pub use liveness::SessionLock;

use crate::domain::{validate_state, Session, SessionId, SessionState};
use crate::error::StoreError;
use chrono::{DateTime, Utc};

/// Persists and retrieves session records and snapshots.
///
/// Implementations are shared across threads and must answer liveness
/// questions about sessions owned by other processes.
pub trait SessionStore: Send + Sync {
    /// The most recently started live browser session, if any.
    fn get_active_session(&self) -> Result<Option<Session>, StoreError>;

    /// All known session records.
    ///
    /// Returns [`StoreError::SchemaMissing`] when nothing was ever persisted.
    fn list(&self) -> Result<Vec<Session>, StoreError>;

    fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Snapshot decoded leniently; `None` when no snapshot was saved.
    fn get_state(&self, id: &SessionId) -> Result<Option<SessionState>, StoreError>;

    /// Snapshot decoded strictly: malformed trees are [`StoreError::Invalid`].
    fn get_state_strict(&self, id: &SessionId) -> Result<Option<SessionState>, StoreError> {
        let Some(state) = self.get_state(id)? else {
            return Ok(None);
        };
        validate_state(&state).map_err(|e| StoreError::Invalid {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Some(state))
    }

    fn save(&self, session: &Session) -> Result<(), StoreError>;

    fn save_state(&self, state: &SessionState) -> Result<(), StoreError>;

    fn mark_ended(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Removes the record and its snapshot. Missing files are not an error.
    fn delete_snapshot(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Whether some process currently owns the session. Best effort: the
    /// answer can be stale by the time the caller acts on it.
    fn is_live(&self, id: &SessionId) -> bool;
}
