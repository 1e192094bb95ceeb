use std::collections::HashSet;
use std::fmt;

use generational_arena::{Arena, Index};
use termtree::Tree;
use tracing::instrument;

use crate::domain::error::StructuralError;
use crate::domain::traversal::TraversalKind;

/// Levels shown by [`TreeArena::to_display_tree`].
pub const DISPLAY_DEPTH_LIMIT: usize = 64;

/// Leaf span below a node.
///
/// Leaves are numbered from 0 in source order, so the leaves below any node
/// form the contiguous id range `max_leaf_id + 1 - leaf_count ..= max_leaf_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Clade {
    pub max_leaf_id: usize,
    pub leaf_count: usize,
}

impl Clade {
    pub fn leaf(id: usize) -> Self {
        Self {
            max_leaf_id: id,
            leaf_count: 1,
        }
    }
}

impl fmt::Display for Clade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.max_leaf_id, self.leaf_count)
    }
}

/// Tree node in the arena-based tree structure.
#[derive(Debug)]
pub struct TreeNode {
    tag: String,
    clade: Clade,
    parent: Option<Index>,
    children: Vec<Index>,
}

impl TreeNode {
    /// Canonical identifier: the label for leaves, `{max_leaf_id}_{leaf_count}` otherwise
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn clade(&self) -> Clade {
        self.clade
    }

    /// Index of parent node in the arena, None for the root
    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    /// Indices of child nodes, in source order
    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)
    }
}

/// Arena-based tree with one root.
///
/// Only [`TreeBuilder`](crate::domain::TreeBuilder) inserts nodes; once built,
/// the tree is read-only.
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
    pub(crate) fn new() -> Self {
        Self {
            arena: Arena::new(),
            root: None,
        }
    }

    /// Insert a node; a node without parent becomes the root.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn insert_node(
        &mut self,
        tag: String,
        clade: Clade,
        parent: Option<Index>,
    ) -> Result<Index, StructuralError> {
        if parent.is_none() && self.root.is_some() {
            return Err(StructuralError::MultipleRoots);
        }

        let node_idx = self.arena.insert(TreeNode {
            tag,
            clade,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(parent_idx) => {
                if let Some(parent) = self.arena.get_mut(parent_idx) {
                    parent.children.push(node_idx);
                }
            }
            None => self.root = Some(node_idx),
        }

        Ok(node_idx)
    }

    pub(crate) fn set_clade(&mut self, idx: Index, tag: String, clade: Clade) {
        if let Some(node) = self.arena.get_mut(idx) {
            node.tag = tag;
            node.clade = clade;
        }
    }

    pub fn get_node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn root(&self) -> Option<Index> {
        self.root
    }

    pub fn root_node(&self) -> Option<&TreeNode> {
        self.root.and_then(|idx| self.get_node(idx))
    }

    /// Parent of the node at `idx`, if any.
    pub fn parent_of(&self, idx: Index) -> Option<&TreeNode> {
        self.get_node(idx)?.parent.and_then(|p| self.get_node(p))
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn leaf_count(&self) -> usize {
        self.arena.iter().filter(|(_, node)| node.is_leaf()).count()
    }

    /// Find a node by tag.
    pub fn find(&self, tag: &str) -> Option<Index> {
        self.arena
            .iter()
            .find(|(_, node)| node.tag == tag)
            .map(|(idx, _)| idx)
    }

    /// Number of levels, counting the root as 1.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack: Vec<(Index, usize)> = self.root.iter().map(|&r| (r, 1)).collect();
        while let Some((idx, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some(node) = self.get_node(idx) {
                stack.extend(node.children.iter().map(|&c| (c, depth + 1)));
            }
        }
        max_depth
    }

    /// Tags of the leaves, in source order.
    pub fn leaf_tags(&self) -> Vec<String> {
        self.traverse(TraversalKind::Preorder)
            .filter(|(_, node)| node.is_leaf())
            .map(|(_, node)| node.tag.clone())
            .collect()
    }

    /// Re-check the structural invariants of a built tree.
    #[instrument(level = "debug", skip(self))]
    pub fn validate(&self) -> Result<(), StructuralError> {
        let mut tags = HashSet::with_capacity(self.arena.len());
        for (idx, node) in self.arena.iter() {
            if !tags.insert(node.tag.as_str()) {
                return Err(StructuralError::DuplicateTag(node.tag.clone()));
            }
            match node.parent {
                None if Some(idx) == self.root => {}
                None => return Err(StructuralError::OrphanNode(node.tag.clone())),
                Some(parent_idx) => {
                    let listed = self
                        .get_node(parent_idx)
                        .is_some_and(|p| p.children.contains(&idx));
                    if !listed {
                        return Err(StructuralError::OrphanNode(node.tag.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    /// Render as a `termtree` for terminal display.
    ///
    /// Subtrees below [`DISPLAY_DEPTH_LIMIT`] levels are elided as `...`.
    pub fn to_display_tree(&self) -> Tree<String> {
        fn build(arena: &TreeArena, idx: Index, level: usize) -> Tree<String> {
            let Some(node) = arena.get_node(idx) else {
                return Tree::new(String::new());
            };
            if level >= DISPLAY_DEPTH_LIMIT && !node.is_leaf() {
                return Tree::new(format!("{} ...", node.tag));
            }
            let leaves: Vec<_> = node
                .children
                .iter()
                .map(|&c| build(arena, c, level + 1))
                .collect();
            Tree::new(node.tag.clone()).with_leaves(leaves)
        }

        match self.root {
            Some(root) => build(self, root, 1),
            None => Tree::new("Empty tree".to_string()),
        }
    }
}
