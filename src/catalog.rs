//! Session catalog: the user-facing list of sessions.
//!
//! A pure read projection over the store. Each session is paired with its
//! snapshot, counted, and classified relative to the calling process.

use crate::domain::{Session, SessionId, SessionInfo};
use crate::error::{SessionError, StoreError};
use crate::store::SessionStore;

/// Cap applied when a caller passes limit 0.
pub const DEFAULT_LIST_LIMIT: usize = 50;

pub struct Catalog<'a> {
    store: &'a dyn SessionStore,
    default_limit: usize,
}

impl<'a> Catalog<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self {
            store,
            default_limit: DEFAULT_LIST_LIMIT,
        }
    }

    pub fn with_default_limit(mut self, limit: usize) -> Self {
        if limit > 0 {
            self.default_limit = limit;
        }
        self
    }

    /// Lists browser sessions, most recently updated first.
    ///
    /// `current` is the session owned by the calling process, if any.
    /// `limit` 0 means the default cap. A store that never persisted
    /// anything yields an empty list rather than an error.
    pub fn list(
        &self,
        current: Option<&SessionId>,
        limit: usize,
    ) -> Result<Vec<SessionInfo>, SessionError> {
        let sessions = match self.store.list() {
            Ok(sessions) => sessions,
            Err(e) if e.is_schema_missing() => {
                tracing::debug!("session storage not initialized, catalog is empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut infos = Vec::with_capacity(sessions.len());
        for session in sessions.into_iter().filter(Session::is_browser) {
            infos.push(self.project(session, current)?);
        }

        infos.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.session.id.cmp(&a.session.id))
        });
        let limit = if limit == 0 { self.default_limit } else { limit };
        infos.truncate(limit);
        Ok(infos)
    }

    /// Fresh projection of a single session; `None` when it does not exist.
    pub fn info(
        &self,
        id: &SessionId,
        current: Option<&SessionId>,
    ) -> Result<Option<SessionInfo>, SessionError> {
        match self.store.find(id)? {
            Some(session) => Ok(Some(self.project(session, current)?)),
            None => Ok(None),
        }
    }

    fn project(
        &self,
        session: Session,
        current: Option<&SessionId>,
    ) -> Result<SessionInfo, SessionError> {
        let state = match self.store.get_state(&session.id) {
            Ok(state) => state,
            // One unreadable snapshot must not hide the rest of the catalog.
            Err(e @ (StoreError::Corrupt { .. } | StoreError::Invalid { .. })) => {
                tracing::warn!(session_id = %session.id, error = %e, "ignoring unreadable snapshot");
                None
            }
            Err(e) => return Err(e.into()),
        };
        let is_current = current == Some(&session.id);
        let live = !is_current && self.store.is_live(&session.id);
        Ok(SessionInfo::project(session, state, is_current, live))
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
