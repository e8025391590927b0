//! Session lifecycle of a browser process and store housekeeping.
//!
//! A browser process creates or resumes a session, holds its lock while it
//! runs, checkpoints state periodically, and marks the session ended on a
//! clean exit. Crashed processes leave sessions without `ended_at`; the
//! stale sweep repairs those once their lock is gone.

use crate::domain::{Session, SessionId, SessionState};
use crate::error::StoreError;
use crate::store::{FileSessionStore, SessionLock, SessionStore};
use chrono::{DateTime, Local, Utc};

/// How many recent sessions auto-restore looks at.
const MAX_RESTORE_CANDIDATES: usize = 10;

/// A session owned by the running process.
pub struct BrowserSession {
    store: FileSessionStore,
    session: Session,
    lock: SessionLock,
    initial_state: SessionState,
    resumed: bool,
}

impl BrowserSession {
    /// Creates a new session, or takes over `resume` when given.
    ///
    /// The lock is taken before the record is touched, so a second process
    /// resuming the same id fails with [`StoreError::AlreadyLive`] and
    /// leaves the record as it was.
    pub fn start(
        store: FileSessionStore,
        resume: Option<&SessionId>,
        initial_uris: &[String],
    ) -> Result<Self, StoreError> {
        match resume {
            Some(id) => Self::resume(store, id),
            None => Self::create(store, initial_uris),
        }
    }

    fn create(store: FileSessionStore, initial_uris: &[String]) -> Result<Self, StoreError> {
        let id = SessionId::generate(Local::now());
        let lock = store.acquire_lock(&id)?;
        let session = Session::new_browser(id.clone(), Utc::now());
        store.save(&session)?;
        let mut initial_state = SessionState::from_uris(id.clone(), initial_uris);
        initial_state.saved_at = Some(Utc::now());
        store.save_state(&initial_state)?;

        tracing::info!(session_id = %id, tabs = initial_state.tab_count(), "session started");
        Ok(Self {
            store,
            session,
            lock,
            initial_state,
            resumed: false,
        })
    }

    fn resume(store: FileSessionStore, id: &SessionId) -> Result<Self, StoreError> {
        let Some(mut session) = store.find(id)? else {
            return Err(StoreError::Invalid {
                id: id.to_string(),
                reason: "cannot resume: session record does not exist".to_string(),
            });
        };
        let lock = store.acquire_lock(id)?;

        session.ended_at = None;
        store.save(&session)?;
        let initial_state = store
            .get_state(id)?
            .unwrap_or_else(|| SessionState::empty(id.clone()));

        tracing::info!(
            session_id = %id,
            tabs = initial_state.tab_count(),
            panes = initial_state.pane_count(),
            "session resumed"
        );
        Ok(Self {
            store,
            session,
            lock,
            initial_state,
            resumed: true,
        })
    }

    pub fn id(&self) -> &SessionId {
        &self.session.id
    }

    pub fn is_resumed(&self) -> bool {
        self.resumed
    }

    /// State the process starts from: the prior checkpoint when resuming.
    pub fn initial_state(&self) -> &SessionState {
        &self.initial_state
    }

    /// Persists `state` as the latest snapshot of this session.
    ///
    /// Also reopens the record if a stale sweep in another process marked
    /// it ended while this process held the lock.
    pub fn checkpoint(&self, state: &SessionState) -> Result<(), StoreError> {
        let mut snapshot = state.clone();
        snapshot.session_id = self.session.id.clone();
        snapshot.saved_at = Some(Utc::now());
        self.store.save_state(&snapshot)?;

        if self.store.find(&self.session.id)?.is_some_and(|s| s.has_ended()) {
            tracing::warn!(session_id = %self.session.id, "owned session was marked ended, reopening");
            self.store.save(&self.session)?;
        }
        Ok(())
    }

    /// Writes the final snapshot, marks the session ended and gives up ownership.
    pub fn end(self, final_state: &SessionState) -> Result<(), StoreError> {
        self.checkpoint(final_state)?;
        self.store.mark_ended(&self.session.id, Utc::now())?;
        tracing::info!(
            session_id = %self.session.id,
            lock = %self.lock.path().display(),
            "session ended"
        );
        self.lock.release()
    }
}

/// Marks sessions ended whose owning process is gone.
///
/// Returns how many sessions were repaired. The ended time is the last
/// checkpoint when one exists. Liveness is checked again just before each
/// write; an owner that starts after that still wins, since its next
/// checkpoint reopens the record.
pub fn sweep_stale_sessions(
    store: &dyn SessionStore,
    current: Option<&SessionId>,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let sessions = match store.list() {
        Ok(sessions) => sessions,
        Err(e) if e.is_schema_missing() => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut repaired = 0;
    for session in sessions {
        if session.has_ended() || current == Some(&session.id) || store.is_live(&session.id) {
            continue;
        }
        let last_seen = match store.get_state(&session.id) {
            Ok(Some(state)) => state.saved_at.unwrap_or(now),
            _ => now,
        };
        // An owner may have resumed the session since the first check.
        if store.is_live(&session.id) {
            continue;
        }
        match store.mark_ended(&session.id, last_seen.max(session.started_at)) {
            Ok(()) => {
                repaired += 1;
                tracing::info!(session_id = %session.id, "marked stale session ended");
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id, error = %e, "failed to end stale session");
            }
        }
    }
    Ok(repaired)
}

/// Counts from one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted_by_age: usize,
    pub deleted_by_count: usize,
    pub failed: usize,
}

impl CleanupReport {
    pub fn total_deleted(&self) -> usize {
        self.deleted_by_age + self.deleted_by_count
    }
}

/// Deletes exited sessions older than `max_age_days` (0 disables), then
/// the oldest beyond `max_count`. Live sessions are never touched.
pub fn cleanup_exited_sessions(
    store: &dyn SessionStore,
    max_count: usize,
    max_age_days: u32,
    now: DateTime<Utc>,
) -> Result<CleanupReport, StoreError> {
    let sessions = match store.list() {
        Ok(sessions) => sessions,
        Err(e) if e.is_schema_missing() => return Ok(CleanupReport::default()),
        Err(e) => return Err(e),
    };

    let mut exited: Vec<(DateTime<Utc>, SessionId)> = sessions
        .into_iter()
        .filter(|s| !store.is_live(&s.id))
        .filter_map(|s| s.ended_at.map(|ended| (ended, s.id)))
        .collect();
    // Newest first.
    exited.sort_by(|a, b| b.cmp(a));

    let mut report = CleanupReport::default();
    if max_age_days > 0 {
        let cutoff = now - chrono::Duration::days(i64::from(max_age_days));
        let (expired, kept): (Vec<_>, Vec<_>) =
            exited.into_iter().partition(|(ended, _)| *ended < cutoff);
        exited = kept;
        for (_, id) in expired {
            if delete_logged(store, &id) {
                report.deleted_by_age += 1;
            } else {
                report.failed += 1;
            }
        }
    }

    for (_, id) in exited.iter().skip(max_count) {
        if delete_logged(store, id) {
            report.deleted_by_count += 1;
        } else {
            report.failed += 1;
        }
    }

    if report.total_deleted() > 0 {
        tracing::info!(
            by_age = report.deleted_by_age,
            by_count = report.deleted_by_count,
            failed = report.failed,
            "session cleanup completed"
        );
    }
    Ok(report)
}

fn delete_logged(store: &dyn SessionStore, id: &SessionId) -> bool {
    match store.delete_snapshot(id) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(session_id = %id, error = %e, "failed to delete exited session");
            false
        }
    }
}

/// The newest session worth resuming automatically: a browser session that
/// is not `current`, has no live owner, and saved at least one tab.
pub fn find_last_restorable(
    store: &dyn SessionStore,
    current: Option<&SessionId>,
) -> Result<Option<SessionState>, StoreError> {
    let mut sessions = match store.list() {
        Ok(sessions) => sessions,
        Err(e) if e.is_schema_missing() => return Ok(None),
        Err(e) => return Err(e),
    };
    sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then_with(|| b.id.cmp(&a.id)));

    for session in sessions.into_iter().take(MAX_RESTORE_CANDIDATES) {
        if !session.is_browser() || current == Some(&session.id) || store.is_live(&session.id) {
            continue;
        }
        let state = match store.get_state(&session.id) {
            Ok(Some(state)) => state,
            Ok(None) => continue,
            Err(e) => {
                tracing::debug!(session_id = %session.id, error = %e, "skipping unreadable snapshot");
                continue;
            }
        };
        if state.tabs.is_empty() {
            continue;
        }
        tracing::info!(
            session_id = %session.id,
            tabs = state.tab_count(),
            panes = state.pane_count(),
            "found restorable session"
        );
        return Ok(Some(state));
    }
    Ok(None)
}

#[cfg(test)]
#[path = "tests/lifecycle_tests.rs"]
mod tests;
