//! In-memory [`SessionStore`] for tests.
//!
//! Records every destructive call so tests can assert that guarded paths
//! never reach the store.

use super::SessionStore;
use crate::domain::{Session, SessionId, SessionState};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    sessions: BTreeMap<SessionId, Session>,
    states: BTreeMap<SessionId, SessionState>,
    live: BTreeSet<SessionId>,
    corrupt_states: BTreeSet<SessionId>,
    failing_deletes: BTreeSet<SessionId>,
    live_on_state_read: BTreeSet<SessionId>,
    deleted: Vec<SessionId>,
    schema_missing: bool,
    unavailable: bool,
}

#[derive(Default)]
pub struct MemorySessionStore {
    inner: Mutex<Inner>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that has never persisted anything.
    pub fn uninitialized() -> Self {
        let store = Self::default();
        store.inner.lock().unwrap().schema_missing = true;
        store
    }

    pub fn insert(&self, session: Session, state: Option<SessionState>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(state) = state {
            inner.states.insert(session.id.clone(), state);
        }
        inner.sessions.insert(session.id.clone(), session);
        inner.schema_missing = false;
    }

    /// Adds a browser session with one tab per URI, saved at `saved_at`.
    pub fn seed(
        &self,
        id: &str,
        started_at: DateTime<Utc>,
        saved_at: Option<DateTime<Utc>>,
        uris: &[&str],
    ) -> SessionId {
        let id = SessionId::parse(id).unwrap();
        let uris: Vec<String> = uris.iter().map(|u| u.to_string()).collect();
        let mut state = SessionState::from_uris(id.clone(), &uris);
        state.saved_at = saved_at;
        self.insert(Session::new_browser(id.clone(), started_at), Some(state));
        id
    }

    pub fn set_live(&self, id: &SessionId, live: bool) {
        let mut inner = self.inner.lock().unwrap();
        if live {
            inner.live.insert(id.clone());
        } else {
            inner.live.remove(id);
        }
    }

    /// Makes `get_state` fail as if the snapshot were unparsable.
    pub fn corrupt_state(&self, id: &SessionId) {
        self.inner.lock().unwrap().corrupt_states.insert(id.clone());
    }

    /// Makes `delete_snapshot` fail for `id` without touching it.
    pub fn set_delete_failure(&self, id: &SessionId) {
        self.inner.lock().unwrap().failing_deletes.insert(id.clone());
    }

    /// Marks `id` live the next time its state is read, as if its owner
    /// started between a liveness check and the read.
    pub fn go_live_on_state_read(&self, id: &SessionId) {
        self.inner.lock().unwrap().live_on_state_read.insert(id.clone());
    }

    /// Makes every read fail with an I/O error.
    pub fn set_unavailable(&self) {
        self.inner.lock().unwrap().unavailable = true;
    }

    pub fn deleted(&self) -> Vec<SessionId> {
        self.inner.lock().unwrap().deleted.clone()
    }

    fn check_available(inner: &Inner) -> Result<(), StoreError> {
        if inner.unavailable {
            return Err(StoreError::io(
                "memory",
                std::io::Error::other("store offline"),
            ));
        }
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn get_active_session(&self) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;
        Ok(inner
            .sessions
            .values()
            .filter(|s| s.is_browser() && !s.has_ended() && inner.live.contains(&s.id))
            .max_by(|a, b| a.started_at.cmp(&b.started_at))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;
        if inner.schema_missing {
            return Err(StoreError::SchemaMissing {
                path: PathBuf::from("memory/sessions"),
            });
        }
        Ok(inner.sessions.values().cloned().collect())
    }

    fn find(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;
        Ok(inner.sessions.get(id).cloned())
    }

    fn get_state(&self, id: &SessionId) -> Result<Option<SessionState>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_available(&inner)?;
        if inner.live_on_state_read.remove(id) {
            inner.live.insert(id.clone());
        }
        if inner.corrupt_states.contains(id) {
            let source = serde_json::from_str::<SessionState>("{").unwrap_err();
            return Err(StoreError::Corrupt {
                path: PathBuf::from(format!("memory/snapshots/{}.json", id)),
                source,
            });
        }
        Ok(inner.states.get(id).cloned())
    }

    fn save(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.sessions.insert(session.id.clone(), session.clone());
        inner.schema_missing = false;
        Ok(())
    }

    fn save_state(&self, state: &SessionState) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.states.insert(state.session_id.clone(), state.clone());
        Ok(())
    }

    fn mark_ended(&self, id: &SessionId, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.sessions.get_mut(id) {
            Some(session) => {
                session.ended_at = Some(at);
                Ok(())
            }
            None => Err(StoreError::Invalid {
                id: id.to_string(),
                reason: "session record does not exist".to_string(),
            }),
        }
    }

    fn delete_snapshot(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.failing_deletes.contains(id) {
            return Err(StoreError::io(
                format!("memory/snapshots/{}.json", id),
                std::io::Error::other("permission denied"),
            ));
        }
        inner.deleted.push(id.clone());
        inner.sessions.remove(id);
        inner.states.remove(id);
        Ok(())
    }

    fn is_live(&self, id: &SessionId) -> bool {
        self.inner.lock().unwrap().live.contains(id)
    }
}
