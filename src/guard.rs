//! Delete guard: the only path that permanently destroys a session.
//!
//! Liveness is re-read from the store on every call, never cached. The
//! protection is best effort: a process can take ownership of the session
//! between the liveness check and the store deletion, and nothing here
//! prevents that window.

use crate::catalog::Catalog;
use crate::domain::SessionId;
use crate::error::SessionError;
use crate::store::SessionStore;

pub struct DeleteGuard<'a> {
    store: &'a dyn SessionStore,
}

impl<'a> DeleteGuard<'a> {
    pub fn new(store: &'a dyn SessionStore) -> Self {
        Self { store }
    }

    /// Deletes the session record and snapshot unless the session is the
    /// caller's own or is owned by another live process.
    pub fn delete(&self, id: &SessionId, current: Option<&SessionId>) -> Result<(), SessionError> {
        if current == Some(id) {
            tracing::warn!(session_id = %id, "refusing to delete the current session");
            return Err(SessionError::GuardViolation { id: id.to_string() });
        }

        let info = Catalog::new(self.store)
            .info(id, current)?
            .ok_or_else(|| SessionError::NotFound {
                query: id.to_string(),
            })?;
        if info.is_current || info.is_active {
            tracing::warn!(session_id = %id, "refusing to delete an active session");
            return Err(SessionError::GuardViolation { id: id.to_string() });
        }

        self.store.delete_snapshot(id)?;
        tracing::info!(session_id = %id, "session deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/guard_tests.rs"]
mod tests;
