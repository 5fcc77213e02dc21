use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::protocol::{NodeKind, NodePayload};

/// Opaque node identifier, unique within one tree instance. Identifiers are
/// reassigned whenever a subtree is rebuilt from a server payload; `path` is
/// the stable key.
pub type NodeId = u64;

/// Represents a single entry in the workspace tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub name: String,
    pub path: PathBuf,
    pub parent_path: Option<PathBuf>,
    pub kind: NodeKind,
    pub is_expanded: bool,
    pub removable: bool,
    pub creatable: bool,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Expand this directory node
    pub fn expand(&mut self) {
        if self.is_dir() {
            self.is_expanded = true;
        }
    }

    /// Collapse this directory node
    pub fn collapse(&mut self) {
        if self.is_dir() {
            self.is_expanded = false;
        }
    }

    /// Toggle expansion state
    pub fn toggle_expansion(&mut self) {
        if self.is_dir() {
            self.is_expanded = !self.is_expanded;
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// View model mirroring the server-provided hierarchy.
///
/// Nodes are created when the server returns a subtree (initial listing or a
/// refresh) and replaced wholesale when a parent directory is refreshed.
/// Parent/child edges form a rooted forest; `path` uniquely identifies a
/// node across the whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTree {
    pub roots: Vec<TreeNode>,
    pub current_selection: Option<PathBuf>,
    #[serde(skip)]
    next_id: NodeId,
}

impl Default for FileTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FileTree {
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            current_selection: None,
            next_id: 0,
        }
    }

    /// Build the whole forest from the `/files` listing payload, preserving
    /// the server's ordering.
    pub fn from_payloads(payloads: Vec<NodePayload>) -> Self {
        let mut next_id = 0;
        let roots = payloads
            .into_iter()
            .map(|p| tree_node_from_payload(p, None, &mut next_id))
            .collect();
        Self {
            roots,
            current_selection: None,
            next_id,
        }
    }

    /// Replace a directory's children in place from a refresh payload.
    ///
    /// Expansion state of surviving paths is carried over; if the current
    /// selection vanished with the old subtree it moves to the refreshed
    /// node itself. Returns false when `path` is not in the tree.
    pub fn replace_children(&mut self, path: &Path, payloads: Vec<NodePayload>) -> bool {
        let previously_expanded: HashSet<PathBuf> = match self.find_node(path) {
            Some(node) => {
                let mut set = HashSet::new();
                collect_expanded(&node.children, &mut set);
                set
            }
            None => return false,
        };

        let mut next_id = self.next_id;
        let parent = path.to_path_buf();
        if let Some(node) = self.find_node_mut(path) {
            node.children = payloads
                .into_iter()
                .map(|p| tree_node_from_payload(p, Some(parent.clone()), &mut next_id))
                .collect();
            for child in &mut node.children {
                reapply_expansion(child, &previously_expanded);
            }
        }
        self.next_id = next_id;

        if let Some(selected) = self.current_selection.clone() {
            if self.find_node(&selected).is_none() {
                self.current_selection = Some(parent);
            }
        }
        true
    }

    /// Find a node by path
    pub fn find_node(&self, path: &Path) -> Option<&TreeNode> {
        for node in &self.roots {
            if let Some(found) = find_node_recursive(node, path) {
                return Some(found);
            }
        }
        None
    }

    /// Find a node by path (mutable)
    pub fn find_node_mut(&mut self, path: &Path) -> Option<&mut TreeNode> {
        for node in &mut self.roots {
            if let Some(found) = find_node_recursive_mut(node, path) {
                return Some(found);
            }
        }
        None
    }

    /// Map a server path back to the current node's identifier via a linear
    /// scan over the flattened tree.
    pub fn find_node_by_path(&self, path: &Path) -> Option<NodeId> {
        self.all_nodes().iter().find(|n| n.path == path).map(|n| n.id)
    }

    /// Every node, visible or not, in depth-first order.
    pub fn all_nodes(&self) -> Vec<&TreeNode> {
        let mut nodes = Vec::new();
        for node in &self.roots {
            collect_all(node, &mut nodes);
        }
        nodes
    }

    /// Paths of every expanded directory; persisted to restore view state
    /// across reloads.
    pub fn expanded_paths(&self) -> Vec<PathBuf> {
        self.all_nodes()
            .iter()
            .filter(|n| n.is_expanded)
            .map(|n| n.path.clone())
            .collect()
    }

    /// Expand a directory node
    pub fn expand_node(&mut self, path: &Path) -> bool {
        if let Some(node) = self.find_node_mut(path) {
            if node.is_dir() {
                node.expand();
                return true;
            }
        }
        false
    }

    /// Collapse a directory node
    pub fn collapse_node(&mut self, path: &Path) -> bool {
        if let Some(node) = self.find_node_mut(path) {
            if node.is_dir() {
                node.collapse();
                return true;
            }
        }
        false
    }

    /// Toggle expansion of a directory node
    pub fn toggle_node(&mut self, path: &Path) -> bool {
        if let Some(node) = self.find_node_mut(path) {
            if node.is_dir() {
                node.toggle_expansion();
                return true;
            }
        }
        false
    }

    /// Select a node
    pub fn select_node(&mut self, path: &Path) -> bool {
        if self.find_node(path).is_some() {
            self.current_selection = Some(path.to_path_buf());
            true
        } else {
            false
        }
    }

    /// Get the currently selected node
    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.current_selection
            .as_ref()
            .and_then(|path| self.find_node(path))
    }

    /// Get all visible nodes (flattened view respecting expansion state)
    pub fn visible_nodes(&self) -> Vec<&TreeNode> {
        let mut visible = Vec::new();
        for node in &self.roots {
            collect_visible(node, &mut visible);
        }
        visible
    }

    /// Visible nodes with their display depth (how deep they appear in the UI)
    pub fn visible_nodes_with_depth(&self) -> Vec<(&TreeNode, usize)> {
        let mut visible = Vec::new();
        for node in &self.roots {
            collect_visible_with_depth(node, &mut visible, 0);
        }
        visible
    }

    /// Descend into the last child for as long as it is expanded; the last
    /// node of the currently visible expansion chain under `path`. None when
    /// the node has no visible children.
    pub fn deepest_open_descendant(&self, path: &Path) -> Option<&TreeNode> {
        let start = self.find_node(path)?;
        if !start.is_expanded || start.children.is_empty() {
            return None;
        }
        let mut node = start.children.last()?;
        while node.is_expanded && !node.children.is_empty() {
            node = node.children.last()?;
        }
        Some(node)
    }

    /// The next node after `path` in visual (depth-first, expansion-aware)
    /// order: the first child when the node is expanded, otherwise the next
    /// sibling of the nearest ancestor that has one.
    pub fn next_visible_node(&self, path: &Path) -> Option<&TreeNode> {
        let node = self.find_node(path)?;
        if node.is_expanded && !node.children.is_empty() {
            return Some(&node.children[0]);
        }

        let mut current = node;
        let mut visited: HashSet<PathBuf> = HashSet::new();
        loop {
            debug_assert!(
                visited.insert(current.path.clone()),
                "parent chain revisited {:?}",
                current.path
            );
            let siblings = self.siblings_of(current);
            let pos = siblings.iter().position(|n| n.path == current.path)?;
            if pos + 1 < siblings.len() {
                return Some(&siblings[pos + 1]);
            }
            match &current.parent_path {
                Some(parent) => current = self.find_node(parent)?,
                None => return None,
            }
        }
    }

    /// True when nothing follows `path` in visual order: the node shows no
    /// children of its own and every link of its parent chain is a last
    /// child.
    pub fn is_last_visible_node(&self, path: &Path) -> bool {
        let node = match self.find_node(path) {
            Some(node) => node,
            None => return false,
        };
        if node.is_expanded && !node.children.is_empty() {
            return false;
        }

        let mut current = node;
        let mut visited: HashSet<PathBuf> = HashSet::new();
        loop {
            debug_assert!(
                visited.insert(current.path.clone()),
                "parent chain revisited {:?}",
                current.path
            );
            if !self.is_last_sibling(current) {
                return false;
            }
            match &current.parent_path {
                Some(parent) => match self.find_node(parent) {
                    Some(parent_node) => current = parent_node,
                    None => return false,
                },
                None => return true,
            }
        }
    }

    /// Ancestors of `path` from nearest to furthest, ending at a root.
    ///
    /// Iterative walk; the structure is a forest by construction, and debug
    /// builds assert it stays one.
    pub fn ancestor_chain(&self, path: &Path) -> Vec<&TreeNode> {
        let mut ancestors = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut current = match self.find_node(path) {
            Some(node) => node,
            None => return ancestors,
        };
        while let Some(parent_path) = &current.parent_path {
            debug_assert!(
                visited.insert(parent_path.clone()),
                "ancestor chain revisited {:?}",
                parent_path
            );
            match self.find_node(parent_path) {
                Some(parent) => {
                    ancestors.push(parent);
                    current = parent;
                }
                None => break,
            }
        }
        ancestors
    }

    /// True iff `ancestor` appears in the parent chain of `candidate`.
    pub fn is_ancestor(&self, candidate: &Path, ancestor: &Path) -> bool {
        self.ancestor_chain(candidate)
            .iter()
            .any(|n| n.path == ancestor)
    }

    /// The next visible node after the current selection
    pub fn next_node(&self) -> Option<&TreeNode> {
        let visible = self.visible_nodes();
        let current = self.current_selection.as_ref()?;
        let index = visible.iter().position(|node| &node.path == current)?;
        visible.get(index + 1).copied()
    }

    /// The previous visible node before the current selection
    pub fn previous_node(&self) -> Option<&TreeNode> {
        let visible = self.visible_nodes();
        let current = self.current_selection.as_ref()?;
        let index = visible.iter().position(|node| &node.path == current)?;
        if index == 0 {
            None
        } else {
            visible.get(index - 1).copied()
        }
    }

    pub fn first_node(&self) -> Option<&TreeNode> {
        self.visible_nodes().first().copied()
    }

    pub fn last_node(&self) -> Option<&TreeNode> {
        self.visible_nodes().last().copied()
    }

    /// Move the selection to the next visible node
    pub fn navigate_down(&mut self) -> bool {
        if let Some(next) = self.next_node() {
            self.current_selection = Some(next.path.clone());
            true
        } else {
            false
        }
    }

    /// Move the selection to the previous visible node
    pub fn navigate_up(&mut self) -> bool {
        if let Some(prev) = self.previous_node() {
            self.current_selection = Some(prev.path.clone());
            true
        } else {
            false
        }
    }

    pub fn navigate_to_first(&mut self) -> bool {
        if let Some(first) = self.first_node() {
            self.current_selection = Some(first.path.clone());
            true
        } else {
            false
        }
    }

    pub fn navigate_to_last(&mut self) -> bool {
        if let Some(last) = self.last_node() {
            self.current_selection = Some(last.path.clone());
            true
        } else {
            false
        }
    }

    fn siblings_of(&self, node: &TreeNode) -> &[TreeNode] {
        match &node.parent_path {
            Some(parent) => self
                .find_node(parent)
                .map(|p| p.children.as_slice())
                .unwrap_or(&[]),
            None => self.roots.as_slice(),
        }
    }

    /// Whether the node is the last among its siblings (root list for roots).
    pub fn is_last_sibling(&self, node: &TreeNode) -> bool {
        self.siblings_of(node)
            .last()
            .map(|last| last.path == node.path)
            .unwrap_or(false)
    }
}

fn tree_node_from_payload(
    payload: NodePayload,
    parent_path: Option<PathBuf>,
    next_id: &mut NodeId,
) -> TreeNode {
    let id = *next_id;
    *next_id += 1;
    let path = PathBuf::from(&payload.path);
    let children = payload
        .children
        .into_iter()
        .map(|c| tree_node_from_payload(c, Some(path.clone()), next_id))
        .collect();
    TreeNode {
        id,
        name: payload.name,
        path,
        parent_path,
        kind: payload.kind,
        is_expanded: false,
        removable: payload.removable,
        creatable: payload.creatable,
        children,
    }
}

fn collect_expanded(nodes: &[TreeNode], expanded: &mut HashSet<PathBuf>) {
    for node in nodes {
        if node.is_expanded {
            expanded.insert(node.path.clone());
        }
        collect_expanded(&node.children, expanded);
    }
}

fn reapply_expansion(node: &mut TreeNode, expanded: &HashSet<PathBuf>) {
    if expanded.contains(&node.path) {
        node.expand();
    }
    for child in &mut node.children {
        reapply_expansion(child, expanded);
    }
}

fn find_node_recursive<'a>(node: &'a TreeNode, path: &Path) -> Option<&'a TreeNode> {
    if node.path == path {
        return Some(node);
    }
    for child in &node.children {
        if let Some(found) = find_node_recursive(child, path) {
            return Some(found);
        }
    }
    None
}

fn find_node_recursive_mut<'a>(node: &'a mut TreeNode, path: &Path) -> Option<&'a mut TreeNode> {
    if node.path == path {
        return Some(node);
    }
    for child in &mut node.children {
        if let Some(found) = find_node_recursive_mut(child, path) {
            return Some(found);
        }
    }
    None
}

fn collect_all<'a>(node: &'a TreeNode, nodes: &mut Vec<&'a TreeNode>) {
    nodes.push(node);
    for child in &node.children {
        collect_all(child, nodes);
    }
}

fn collect_visible<'a>(node: &'a TreeNode, visible: &mut Vec<&'a TreeNode>) {
    visible.push(node);
    if node.is_dir() && node.is_expanded {
        for child in &node.children {
            collect_visible(child, visible);
        }
    }
}

fn collect_visible_with_depth<'a>(
    node: &'a TreeNode,
    visible: &mut Vec<(&'a TreeNode, usize)>,
    depth: usize,
) {
    visible.push((node, depth));
    if node.is_dir() && node.is_expanded {
        for child in &node.children {
            collect_visible_with_depth(child, visible, depth + 1);
        }
    }
}
