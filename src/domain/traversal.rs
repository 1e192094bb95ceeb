//! Preorder, postorder and level-order walks over a [`TreeArena`].
//!
//! All three kinds share one iterator. Depth-first kinds keep a stack of
//! `(node, expanded)` entries, level-order keeps a FIFO queue. Children are
//! always taken in source order, so every walk is deterministic.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use generational_arena::Index;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::arena::{TreeArena, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TraversalKind {
    Preorder,
    Postorder,
    #[serde(alias = "level-order", alias = "level_order")]
    #[value(name = "levelorder", aliases = ["level-order", "level_order"])]
    LevelOrder,
}

impl TraversalKind {
    /// Canonical emission order.
    pub const ALL: [TraversalKind; 3] = [
        TraversalKind::Preorder,
        TraversalKind::Postorder,
        TraversalKind::LevelOrder,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TraversalKind::Preorder => "preorder",
            TraversalKind::Postorder => "postorder",
            TraversalKind::LevelOrder => "levelorder",
        }
    }

    /// Name of the traversal operation on the engine under test.
    pub fn engine_method(&self) -> &'static str {
        match self {
            TraversalKind::Preorder => "Preorder",
            TraversalKind::Postorder => "Postorder",
            TraversalKind::LevelOrder => "LevelOrder",
        }
    }
}

impl fmt::Display for TraversalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown traversal kind: {0:?}")]
pub struct UnknownTraversalKind(pub String);

impl FromStr for TraversalKind {
    type Err = UnknownTraversalKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "preorder" => Ok(TraversalKind::Preorder),
            "postorder" => Ok(TraversalKind::Postorder),
            "levelorder" | "level-order" | "level_order" => Ok(TraversalKind::LevelOrder),
            _ => Err(UnknownTraversalKind(s.to_string())),
        }
    }
}

enum Frontier {
    /// `(node, children already pushed)`
    Stack(Vec<(Index, bool)>),
    Queue(VecDeque<Index>),
}

/// Iterator over the nodes of a tree in the order given by a [`TraversalKind`].
pub struct Traversal<'a> {
    arena: &'a TreeArena,
    kind: TraversalKind,
    frontier: Frontier,
}

impl<'a> Traversal<'a> {
    fn new(arena: &'a TreeArena, kind: TraversalKind) -> Self {
        let frontier = match kind {
            TraversalKind::Preorder | TraversalKind::Postorder => {
                Frontier::Stack(arena.root().map(|r| (r, false)).into_iter().collect())
            }
            TraversalKind::LevelOrder => Frontier::Queue(arena.root().into_iter().collect()),
        };
        Self {
            arena,
            kind,
            frontier,
        }
    }

    pub fn kind(&self) -> TraversalKind {
        self.kind
    }
}

impl<'a> Iterator for Traversal<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        let arena = self.arena;
        match &mut self.frontier {
            Frontier::Queue(queue) => {
                while let Some(idx) = queue.pop_front() {
                    if let Some(node) = arena.get_node(idx) {
                        queue.extend(node.children().iter().copied());
                        return Some((idx, node));
                    }
                }
                None
            }
            Frontier::Stack(stack) => {
                let visit_on_entry = self.kind == TraversalKind::Preorder;
                while let Some((idx, expanded)) = stack.pop() {
                    let Some(node) = arena.get_node(idx) else {
                        continue;
                    };
                    if expanded {
                        return Some((idx, node));
                    }
                    if !visit_on_entry {
                        stack.push((idx, true));
                    }
                    // Reverse so the leftmost child is popped first
                    stack.extend(node.children().iter().rev().map(|&c| (c, false)));
                    if visit_on_entry {
                        return Some((idx, node));
                    }
                }
                None
            }
        }
    }
}

/// Caller-owned accumulator of visited tags.
///
/// Never shared between traversals implicitly: call [`clear`](Self::clear)
/// before reusing it for the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceCollector {
    tags: Vec<String>,
}

impl TraceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, node: &TreeNode) {
        self.tags.push(node.tag().to_string());
    }

    pub fn clear(&mut self) {
        self.tags.clear();
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn into_tags(self) -> Vec<String> {
        self.tags
    }
}

impl TreeArena {
    /// Walk the tree in the given order.
    pub fn traverse(&self, kind: TraversalKind) -> Traversal<'_> {
        Traversal::new(self, kind)
    }

    /// Append the tags of one traversal to `trace`.
    #[instrument(level = "trace", skip(self, trace))]
    pub fn collect_into(&self, kind: TraversalKind, trace: &mut TraceCollector) {
        for (_, node) in self.traverse(kind) {
            trace.record(node);
        }
    }

    /// Tags in traversal order.
    pub fn tags(&self, kind: TraversalKind) -> Vec<String> {
        let mut trace = TraceCollector::new();
        self.collect_into(kind, &mut trace);
        trace.into_tags()
    }
}

/// Expected tag sequence for one traversal kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Oracle {
    pub kind: TraversalKind,
    pub tags: Vec<String>,
}

impl Oracle {
    pub fn compute(tree: &TreeArena, kind: TraversalKind) -> Self {
        Self {
            kind,
            tags: tree.tags(kind),
        }
    }
}
