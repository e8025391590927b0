//! Error types for the session core.
//!
//! `StoreError` belongs to the persistence layer; `SessionError` is what the
//! catalog, resolver, restore orchestrator, and delete guard hand back to the
//! CLI layer for rendering. Nothing here is retried automatically.

use std::path::PathBuf;

/// Errors raised by a [`crate::store::SessionStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The sessions directory has never been created (no session was ever saved).
    #[error("session storage not initialized at {}", .path.display())]
    SchemaMissing { path: PathBuf },

    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unparsable data in {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid data for session {id}: {reason}")]
    Invalid { id: String, reason: String },

    #[error("session {id} is already owned by a live process")]
    AlreadyLive { id: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the store reports that nothing has ever been persisted.
    pub fn is_schema_missing(&self) -> bool {
        matches!(self, Self::SchemaMissing { .. })
    }
}

/// Errors surfaced by the session core contracts.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("no session found matching '{query}'")]
    NotFound { query: String },

    #[error(
        "ambiguous session ID '{query}' matches {} sessions ({}) - be more specific",
        .candidates.len(),
        .candidates.join(", ")
    )]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    #[error("cannot restore session {id}: {reason}")]
    RestoreFailed { id: String, reason: String },

    #[error("failed to start browser for session {id}: {reason}")]
    SpawnFailed { id: String, reason: String },

    #[error("session {id} is current or active and cannot be deleted - close it first")]
    GuardViolation { id: String },
}
