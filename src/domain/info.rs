//! Read-only catalog projection of one session.

use super::session::Session;
use super::state::SessionState;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Lifecycle classification relative to the calling process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Owned by the calling process.
    Current,
    /// Owned by another live process.
    Active,
    /// No live owner; can be restored or deleted.
    Exited,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Current => "current",
            Self::Active => "active",
            Self::Exited => "exited",
        };
        f.write_str(label)
    }
}

/// Computed by the catalog, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub session: Session,
    #[serde(skip)]
    pub state: Option<SessionState>,
    pub tab_count: usize,
    pub pane_count: usize,
    pub is_current: bool,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl SessionInfo {
    /// Builds the projection. `live` is the store's liveness evidence; a live
    /// session that is also current is reported as current only.
    pub fn project(
        session: Session,
        state: Option<SessionState>,
        is_current: bool,
        live: bool,
    ) -> Self {
        let tab_count = state.as_ref().map_or(0, SessionState::tab_count);
        let pane_count = state.as_ref().map_or(0, SessionState::pane_count);
        let updated_at = state
            .as_ref()
            .and_then(|s| s.saved_at)
            .unwrap_or(session.started_at);
        Self {
            session,
            state,
            tab_count,
            pane_count,
            is_current,
            is_active: live && !is_current,
            updated_at,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_current {
            SessionStatus::Current
        } else if self.is_active {
            SessionStatus::Active
        } else {
            SessionStatus::Exited
        }
    }

    pub fn short_id(&self) -> &str {
        self.session.id.short_id()
    }
}

/// Human readable age such as `5m ago` or `2w ago`.
pub fn format_relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - then).num_seconds().max(0);
    let (value, unit) = match secs {
        s if s < 60 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "m"),
        s if s < 86_400 => (s / 3_600, "h"),
        s if s < 7 * 86_400 => (s / 86_400, "d"),
        s if s < 30 * 86_400 => (s / (7 * 86_400), "w"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "mo"),
        s => (s / (365 * 86_400), "y"),
    };
    format!("{}{} ago", value, unit)
}

#[cfg(test)]
#[path = "tests/info_tests.rs"]
mod tests;
