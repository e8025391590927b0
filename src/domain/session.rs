//! Session identity and timing.

use chrono::{DateTime, Local, Utc};
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Length of the trailing random segment exposed to users as the short id.
pub const SHORT_ID_LEN: usize = 4;

/// Opaque, creation-time sortable session identifier.
///
/// Canonical format is `YYYYMMDD_HHMMSS_xxxx`; ids that predate the format
/// are still accepted so existing stored data keeps loading. Ids name files
/// in the store, so anything that could leave the store directory is refused,
/// including when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Generates a fresh id from the given local time and a random hex suffix.
    pub fn generate(now: DateTime<Local>) -> Self {
        let suffix: u16 = rand::thread_rng().gen();
        Self(format!("{}_{:04x}", now.format("%Y%m%d_%H%M%S"), suffix))
    }

    /// Wraps an existing id. Blank ids and ids containing a path separator,
    /// `..` or a NUL byte are rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let escapes = trimmed.contains(['/', '\\', '\0']) || trimmed.contains("..");
        if trimmed.is_empty() || escapes {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Whether the id follows the `YYYYMMDD_HHMMSS_xxxx` format exactly.
    pub fn is_canonical(&self) -> bool {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        PATTERN
            .get_or_init(|| Regex::new(r"^\d{8}_\d{6}_[0-9a-zA-Z]{4}$").ok())
            .as_ref()
            .is_some_and(|re| re.is_match(&self.0))
    }

    /// The trailing fixed-length segment users type instead of the full id.
    pub fn short_id(&self) -> &str {
        let count = self.0.chars().count();
        if count <= SHORT_ID_LEN {
            return &self.0;
        }
        let start = self
            .0
            .char_indices()
            .nth(count - SHORT_ID_LEN)
            .map_or(0, |(idx, _)| idx);
        self.0.get(start..).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SessionId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid session id '{}'", value))
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Kind of session. Only browser sessions are listed and restored today.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum SessionType {
    #[default]
    Browser,
    Other(String),
}

impl From<String> for SessionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "browser" => SessionType::Browser,
            _ => SessionType::Other(value),
        }
    }
}

impl From<SessionType> for String {
    fn from(value: SessionType) -> Self {
        match value {
            SessionType::Browser => "browser".to_string(),
            SessionType::Other(kind) => kind,
        }
    }
}

/// A session record: identity and timing, persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    #[serde(rename = "type", default)]
    pub session_type: SessionType,
    pub started_at: DateTime<Utc>,
    /// Set when the owning process exits normally.
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Creates a browser session that has just started.
    pub fn new_browser(id: SessionId, started_at: DateTime<Utc>) -> Self {
        Self {
            id,
            session_type: SessionType::Browser,
            started_at,
            ended_at: None,
        }
    }

    pub fn is_browser(&self) -> bool {
        self.session_type == SessionType::Browser
    }

    pub fn has_ended(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Rejects records that cannot describe a real session.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("session id is empty".to_string());
        }
        if let Some(ended_at) = self.ended_at {
            if ended_at < self.started_at {
                return Err(format!(
                    "ended_at {} is before started_at {}",
                    ended_at.to_rfc3339(),
                    self.started_at.to_rfc3339()
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
