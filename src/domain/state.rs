//! Resumable session payload: ordered tabs, each owning a workspace tree.

use super::session::SessionId;
use super::workspace::{
    check_raw_node, validate_tree, PaneNodeSnapshot, PaneSnapshot, RawPaneNode, TreeError,
    WorkspaceSnapshot,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot format version written by this build. Newer snapshots are refused on restore.
pub const SESSION_STATE_VERSION: u32 = 1;

const UNTITLED_TAB: &str = "Untitled";

fn current_version() -> u32 {
    SESSION_STATE_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default = "current_version")]
    pub version: u32,
    pub session_id: SessionId,
    /// Order is significant; restore reproduces it.
    #[serde(default)]
    pub tabs: Vec<TabSnapshot>,
    #[serde(default)]
    pub active_tab_index: usize,
    /// Time of the checkpoint that produced this snapshot.
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TabSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: usize,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub workspace: WorkspaceSnapshot,
}

impl TabSnapshot {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            UNTITLED_TAB
        } else {
            &self.name
        }
    }
}

impl SessionState {
    pub fn empty(session_id: SessionId) -> Self {
        Self {
            version: SESSION_STATE_VERSION,
            session_id,
            tabs: Vec::new(),
            active_tab_index: 0,
            saved_at: None,
        }
    }

    /// One tab with a single pane per URI, in the given order.
    pub fn from_uris(session_id: SessionId, uris: &[String]) -> Self {
        let tabs = uris
            .iter()
            .enumerate()
            .map(|(idx, uri)| TabSnapshot {
                id: format!("tab-{}", idx),
                name: String::new(),
                position: idx,
                is_pinned: false,
                workspace: WorkspaceSnapshot {
                    id: format!("ws-{}", idx),
                    root: Some(PaneNodeSnapshot::leaf(
                        format!("node-{}", idx),
                        PaneSnapshot::new(format!("pane-{}", idx), uri.clone(), String::new()),
                    )),
                    active_pane_id: format!("pane-{}", idx),
                },
            })
            .collect();
        Self {
            tabs,
            ..Self::empty(session_id)
        }
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// Leaf panes summed across every tab.
    pub fn pane_count(&self) -> usize {
        self.tabs.iter().map(|tab| tab.workspace.pane_count()).sum()
    }
}

/// Strict check of every tab tree in a decoded state.
pub fn validate_state(state: &SessionState) -> Result<(), TreeError> {
    for (idx, tab) in state.tabs.iter().enumerate() {
        if let Some(root) = &tab.workspace.root {
            validate_tree(root, &format!("tab[{}]/root", idx))?;
        }
    }
    Ok(())
}

/// Failure of a strict decode.
#[derive(Debug, thiserror::Error)]
pub enum StateDecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Tree(#[from] TreeError),
}

#[derive(Deserialize)]
struct RawStateShape {
    #[serde(default)]
    tabs: Vec<RawTabShape>,
}

#[derive(Deserialize)]
struct RawTabShape {
    #[serde(default)]
    workspace: RawWorkspaceShape,
}

#[derive(Deserialize, Default)]
struct RawWorkspaceShape {
    #[serde(default)]
    root: Option<RawPaneNode>,
}

/// Lenient decode used for listing: malformed nodes are tolerated.
pub fn parse_state(json: &str) -> Result<SessionState, serde_json::Error> {
    serde_json::from_str(json)
}

/// Decode used at restore time: malformed nodes are rejected with their path.
pub fn parse_state_strict(json: &str) -> Result<SessionState, StateDecodeError> {
    let shape: RawStateShape = serde_json::from_str(json)?;
    for (idx, tab) in shape.tabs.iter().enumerate() {
        if let Some(root) = &tab.workspace.root {
            check_raw_node(root, &format!("tab[{}]/root", idx))?;
        }
    }
    let state = parse_state(json)?;
    validate_state(&state)?;
    Ok(state)
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
