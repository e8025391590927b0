//! Workspace tree: the pane layout of one tab.
//!
//! In memory a node is a genuine sum type, so a node is a leaf XOR a
//! container. On disk the JSON keeps two optional fields (`pane` and
//! `children`) for compatibility with stored sessions; decoding is lenient
//! (the pane wins when both are present) and [`check_raw_node`] plus
//! [`validate_tree`] provide the strict pass used at restore time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single browsing surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaneSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_zoom_factor")]
    pub zoom_factor: f64,
}

fn default_zoom_factor() -> f64 {
    1.0
}

impl PaneSnapshot {
    pub fn new(id: impl Into<String>, uri: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            title: title.into(),
            zoom_factor: default_zoom_factor(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    #[default]
    Horizontal,
    Vertical,
}

/// Children arranged side by side (split) or layered (stacked).
#[derive(Debug, Clone, PartialEq)]
pub struct PaneContainer {
    pub id: String,
    pub children: Vec<PaneNodeSnapshot>,
    pub is_stacked: bool,
    /// Meaningful only for two-way splits; 0 for stacked or N-way containers.
    pub split_ratio: f64,
    pub split_dir: SplitDirection,
    pub active_stack_index: usize,
}

impl PaneContainer {
    /// A two-way side-by-side split.
    #[cfg(test)]
    pub fn split(
        id: impl Into<String>,
        dir: SplitDirection,
        ratio: f64,
        first: PaneNodeSnapshot,
        second: PaneNodeSnapshot,
    ) -> Self {
        Self {
            id: id.into(),
            children: vec![first, second],
            is_stacked: false,
            split_ratio: ratio,
            split_dir: dir,
            active_stack_index: 0,
        }
    }

    /// A stacked container showing one child at a time.
    #[cfg(test)]
    pub fn stacked(id: impl Into<String>, children: Vec<PaneNodeSnapshot>) -> Self {
        Self {
            id: id.into(),
            children,
            is_stacked: true,
            split_ratio: 0.0,
            split_dir: SplitDirection::default(),
            active_stack_index: 0,
        }
    }
}

/// One node of the pane tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawPaneNode", into = "RawPaneNode")]
pub enum PaneNodeSnapshot {
    Leaf { id: String, pane: PaneSnapshot },
    Container(PaneContainer),
}

impl PaneNodeSnapshot {
    pub fn leaf(id: impl Into<String>, pane: PaneSnapshot) -> Self {
        Self::Leaf {
            id: id.into(),
            pane,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Leaf { id, .. } => id,
            Self::Container(container) => &container.id,
        }
    }

    /// Number of leaf panes under (and including) this node.
    pub fn pane_count(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Container(container) => container.children.iter().map(Self::pane_count).sum(),
        }
    }

    /// Depth-first traversal, children in stored order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }

    /// Leaf panes in depth-first order.
    pub fn leaves(&self) -> impl Iterator<Item = &PaneSnapshot> {
        self.walk().filter_map(|(_, node)| match node {
            PaneNodeSnapshot::Leaf { pane, .. } => Some(pane),
            PaneNodeSnapshot::Container(_) => None,
        })
    }
}

/// Pane count of an optional root; an absent root is an empty workspace.
pub fn count_panes(root: Option<&PaneNodeSnapshot>) -> usize {
    root.map_or(0, PaneNodeSnapshot::pane_count)
}

/// Depth-first iterator yielding `(depth, node)`.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a PaneNodeSnapshot)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a PaneNodeSnapshot);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        if let PaneNodeSnapshot::Container(container) = node {
            for child in container.children.iter().rev() {
                self.stack.push((depth + 1, child));
            }
        }
        Some((depth, node))
    }
}

/// The pane tree of one tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkspaceSnapshot {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub root: Option<PaneNodeSnapshot>,
    #[serde(default)]
    pub active_pane_id: String,
}

impl WorkspaceSnapshot {
    pub fn pane_count(&self) -> usize {
        count_panes(self.root.as_ref())
    }
}

/// On-disk node shape: two optional fields instead of an enum.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RawPaneNode {
    #[serde(default)]
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pane: Option<PaneSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<RawPaneNode>,
    #[serde(default)]
    split_dir: SplitDirection,
    #[serde(default)]
    split_ratio: f64,
    #[serde(default)]
    is_stacked: bool,
    #[serde(default)]
    active_stack_index: usize,
}

impl From<RawPaneNode> for PaneNodeSnapshot {
    fn from(raw: RawPaneNode) -> Self {
        match raw.pane {
            // Pane wins over stray children.
            Some(pane) => PaneNodeSnapshot::Leaf { id: raw.id, pane },
            None => PaneNodeSnapshot::Container(PaneContainer {
                id: raw.id,
                children: raw.children.into_iter().map(Into::into).collect(),
                is_stacked: raw.is_stacked,
                split_ratio: raw.split_ratio,
                split_dir: raw.split_dir,
                active_stack_index: raw.active_stack_index,
            }),
        }
    }
}

impl From<PaneNodeSnapshot> for RawPaneNode {
    fn from(node: PaneNodeSnapshot) -> Self {
        match node {
            PaneNodeSnapshot::Leaf { id, pane } => RawPaneNode {
                id,
                pane: Some(pane),
                ..RawPaneNode::default()
            },
            PaneNodeSnapshot::Container(container) => RawPaneNode {
                id: container.id,
                pane: None,
                children: container.children.into_iter().map(Into::into).collect(),
                split_dir: container.split_dir,
                split_ratio: container.split_ratio,
                is_stacked: container.is_stacked,
                active_stack_index: container.active_stack_index,
            },
        }
    }
}

/// Rule broken by a malformed node.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeErrorKind {
    LeafWithChildren,
    EmptyContainer,
    SplitRatioOutOfRange(f64),
}

impl fmt::Display for TreeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LeafWithChildren => write!(f, "node has both a pane and children"),
            Self::EmptyContainer => write!(f, "node has neither a pane nor children"),
            Self::SplitRatioOutOfRange(ratio) => {
                write!(f, "split ratio {} outside (0, 1]", ratio)
            }
        }
    }
}

/// A malformed node, located by its path from the tab (e.g. `tab[0]/root/1/0`).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{path}: {kind}")]
pub struct TreeError {
    pub path: String,
    pub kind: TreeErrorKind,
}

/// Strict check of the on-disk shape: rejects nodes carrying both a pane and children.
pub(crate) fn check_raw_node(node: &RawPaneNode, path: &str) -> Result<(), TreeError> {
    if node.pane.is_some() && !node.children.is_empty() {
        return Err(TreeError {
            path: path.to_string(),
            kind: TreeErrorKind::LeafWithChildren,
        });
    }
    for (idx, child) in node.children.iter().enumerate() {
        check_raw_node(child, &format!("{}/{}", path, idx))?;
    }
    Ok(())
}

/// Strict check of a decoded tree: containers need children, two-way
/// splits need a ratio in (0, 1].
pub fn validate_tree(node: &PaneNodeSnapshot, path: &str) -> Result<(), TreeError> {
    let PaneNodeSnapshot::Container(container) = node else {
        return Ok(());
    };
    if container.children.is_empty() {
        return Err(TreeError {
            path: path.to_string(),
            kind: TreeErrorKind::EmptyContainer,
        });
    }
    let ratio = container.split_ratio;
    if !container.is_stacked
        && container.children.len() == 2
        && !(ratio > 0.0 && ratio <= 1.0)
    {
        return Err(TreeError {
            path: path.to_string(),
            kind: TreeErrorKind::SplitRatioOutOfRange(ratio),
        });
    }
    for (idx, child) in container.children.iter().enumerate() {
        validate_tree(child, &format!("{}/{}", path, idx))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/workspace_tests.rs"]
mod tests;
