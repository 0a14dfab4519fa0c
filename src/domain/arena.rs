//! Arena-backed hierarchy trees.
//!
//! The builder grows trees into a [`TreeArena`]; renderers consume either the
//! arena directly or the nested [`HierarchyNode`] view produced by
//! [`TreeArena::to_hierarchy`].

use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::graph::Node;

/// Payload of one hierarchy position.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeData {
    pub node: Node,
    /// Percentage on the edge from the parent; `None` for roots and persons
    pub ownership: Option<f64>,
    /// Set when this position repeats an id already on its root path
    pub truncated: bool,
}

impl NodeData {
    pub fn root(node: Node) -> Self {
        Self {
            node,
            ownership: None,
            truncated: false,
        }
    }

    pub fn child(node: Node, ownership: Option<f64>) -> Self {
        Self {
            node,
            ownership,
            truncated: false,
        }
    }

    pub fn truncated(node: Node, ownership: Option<f64>) -> Self {
        Self {
            node,
            ownership,
            truncated: true,
        }
    }

    pub fn id(&self) -> &str {
        self.node.id()
    }

    /// Text label, optionally with the edge percentage.
    pub fn label(&self, show_ownership: bool) -> String {
        let mut label = self.node.to_string();
        if show_ownership {
            if let Some(perc) = self.ownership {
                label.push_str(&format!(" {}%", format_percentage(perc)));
            }
        }
        if self.truncated {
            label.push_str(" ↻");
        }
        label
    }
}

impl fmt::Display for NodeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label(true))
    }
}

fn format_percentage(perc: f64) -> String {
    if perc.is_nan() {
        "?".to_string()
    } else if perc.fract() == 0.0 {
        format!("{:.0}", perc)
    } else {
        format!("{}", perc)
    }
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct TreeNode {
    pub data: NodeData,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub children: Vec<Index>,
}

/// One tree of the output forest.
///
/// The same id may occur in several branches, never twice on one
/// root-to-leaf path.
#[derive(Debug)]
pub struct TreeArena {
    arena: Arena<TreeNode>,
    root: Option<Index>,
}

impl Default for TreeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    #[instrument(level = "trace", skip(self, data), fields(id = data.id()))]
    pub fn insert_node(&mut self, data: NodeData, parent: Option<Index>) -> Index {
        let node = TreeNode {
            data,
            parent,
            children: Vec::new(),
        };
        let node_idx = self.arena.insert(node);

        if let Some(parent_idx) = parent {
            if let Some(parent) = self.arena.get_mut(parent_idx) {
                parent.children.push(node_idx);
            }
        } else {
            self.root = Some(node_idx);
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// True if `id` sits at `idx` or any ancestor of `idx`.
    pub fn path_contains(&self, idx: Index, id: &str) -> bool {
        let mut current = Some(idx);
        while let Some(i) = current {
            match self.get_node(i) {
                Some(node) if node.data.id() == id => return true,
                Some(node) => current = node.parent,
                None => return false,
            }
        }
        false
    }

    /// Number of positions holding `id`.
    pub fn occurrences(&self, id: &str) -> usize {
        self.iter().filter(|(_, n)| n.data.id() == id).count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.iter().any(|(_, n)| n.data.id() == id)
    }

    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Number of levels; an empty tree has depth 0.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();

        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get_node(idx) {
                stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        max_depth
    }

    /// Ids of all childless positions, left to right.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<String> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.data.id().to_string())
            .collect()
    }

    /// Nested, serializable copy of the tree.
    pub fn to_hierarchy(&self) -> Option<HierarchyNode> {
        let root = self.root?;
        let mut built: HashMap<Index, HierarchyNode> = HashMap::with_capacity(self.len());

        // post-order: every child is finished before its parent
        for (idx, node) in self.iter_postorder() {
            let children = node
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(
                idx,
                HierarchyNode {
                    node: node.data.node.clone(),
                    ownership_perc: node.data.ownership,
                    truncated: node.data.truncated,
                    children,
                },
            );
        }
        built.remove(&root)
    }

    /// Text tree for terminal output.
    pub fn to_tree_string(&self, show_ownership: bool) -> Tree<String> {
        let Some(root) = self.root else {
            return Tree::new("Empty tree".to_string());
        };
        let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(self.len());

        for (idx, node) in self.iter_postorder() {
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(
                idx,
                Tree::new(node.data.label(show_ownership)).with_leaves(leaves),
            );
        }
        built
            .remove(&root)
            .unwrap_or_else(|| Tree::new("Empty tree".to_string()))
    }
}

/// Output hierarchy node: a chart node, its ordered children, and the
/// ownership percentage on the edge from its parent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    #[serde(flatten)]
    pub node: Node,
    pub ownership_perc: Option<f64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    pub fn id(&self) -> &str {
        self.node.id()
    }

    pub fn child_ids(&self) -> Vec<&str> {
        self.children.iter().map(HierarchyNode::id).collect()
    }

    pub fn child(&self, id: &str) -> Option<&HierarchyNode> {
        self.children.iter().find(|c| c.id() == id)
    }
}

/// Pre-order, left-to-right traversal.
pub struct TreeIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let current_idx = self.stack.pop()?;
        let node = self.arena.get_node(current_idx)?;
        // Push children in reverse order for left-to-right traversal
        for &child in node.children.iter().rev() {
            self.stack.push(child);
        }
        Some((current_idx, node))
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a TreeArena,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a TreeArena) -> Self {
        let mut stack = Vec::new();
        if let Some(root) = arena.root() {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
