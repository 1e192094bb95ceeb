//! Tree builder turning parsed notation into a tagged [`TreeArena`].

use std::collections::HashSet;

use generational_arena::Index;
use tracing::{debug, instrument};

use crate::domain::arena::{Clade, TreeArena};
use crate::domain::error::StructuralError;
use crate::domain::newick::ParsedNode;
use crate::domain::traversal::TraversalKind;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, StructuralError>;

/// Constructs tagged trees from parsed tree notation.
///
/// Leaves are numbered in source order. A leaf is tagged with its label; an
/// internal node is tagged `{max_leaf_id}_{leaf_count}`. An internal label
/// present in the input has to agree with the derived tag.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    seen_tags: HashSet<String>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree from a parsed node, preserving child order.
    #[instrument(level = "debug", skip(self, parsed))]
    pub fn build_from_parsed(&mut self, parsed: &ParsedNode) -> TreeResult<TreeArena> {
        self.seen_tags.clear();

        let mut arena = TreeArena::new();
        // Internal nodes still waiting for their tag, in preorder.
        let mut pending: Vec<(Index, Option<&str>)> = Vec::new();
        let mut next_leaf_id = 0;

        // Preorder insertion: parents exist before their children.
        let mut stack: Vec<(&ParsedNode, Option<Index>)> = vec![(parsed, None)];
        while let Some((node, parent)) = stack.pop() {
            if node.is_leaf() {
                let id = next_leaf_id;
                next_leaf_id += 1;
                let label = match node.label.as_deref() {
                    Some(label) => label,
                    None => return Err(StructuralError::UnlabeledLeaf { position: id }),
                };
                self.claim(label)?;
                arena.insert_node(label.to_string(), Clade::leaf(id), parent)?;
            } else {
                let clade = Clade {
                    max_leaf_id: 0,
                    leaf_count: 0,
                };
                let idx = arena.insert_node(String::new(), clade, parent)?;
                pending.push((idx, node.label.as_deref()));
                stack.extend(node.children.iter().rev().map(|child| (child, Some(idx))));
            }
        }

        // Reverse preorder visits every child before its parent.
        for &(idx, label) in pending.iter().rev() {
            let clade = Self::clade_of_children(&arena, idx);
            let derived = clade.to_string();
            if let Some(label) = label {
                if label != derived {
                    return Err(StructuralError::LabelMismatch {
                        label: label.to_string(),
                        derived,
                    });
                }
            }
            self.claim(&derived)?;
            arena.set_clade(idx, derived, clade);
        }

        arena.validate()?;
        debug!(
            nodes = arena.len(),
            leaves = next_leaf_id,
            root = ?arena.root_node().map(|n| n.tag().to_string()),
            "built tree"
        );
        Ok(arena)
    }

    fn claim(&mut self, tag: &str) -> TreeResult<()> {
        if self.seen_tags.insert(tag.to_string()) {
            Ok(())
        } else {
            Err(StructuralError::DuplicateTag(tag.to_string()))
        }
    }

    fn clade_of_children(arena: &TreeArena, idx: Index) -> Clade {
        let children = arena
            .get_node(idx)
            .map(|node| node.children())
            .unwrap_or_default();
        children
            .iter()
            .filter_map(|&c| arena.get_node(c))
            .map(|child| child.clade())
            .fold(
                Clade {
                    max_leaf_id: 0,
                    leaf_count: 0,
                },
                |acc, c| Clade {
                    max_leaf_id: acc.max_leaf_id.max(c.max_leaf_id),
                    leaf_count: acc.leaf_count + c.leaf_count,
                },
            )
    }
}

/// Structural comparison: same tags in the same child order.
pub fn isomorphic(a: &TreeArena, b: &TreeArena) -> bool {
    fn shape(tree: &TreeArena) -> Vec<(String, usize)> {
        tree.traverse(TraversalKind::Preorder)
            .map(|(_, node)| (node.tag().to_string(), node.children().len()))
            .collect()
    }
    shape(a) == shape(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::newick::parse;

    fn build(text: &str) -> TreeResult<TreeArena> {
        TreeBuilder::new().build_from_parsed(&parse(text).unwrap())
    }

    #[test]
    fn test_internal_tags_are_derived_from_leaf_span() {
        let tree = build("((a,b),(c,d,e));").unwrap();
        let root = tree.root_node().unwrap();
        assert_eq!(root.tag(), "4_5");
        let children: Vec<_> = root
            .children()
            .iter()
            .map(|&c| tree.get_node(c).unwrap().tag().to_string())
            .collect();
        assert_eq!(children, ["1_2", "4_3"]);
        assert_eq!(tree.leaf_tags(), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_matching_internal_labels_are_accepted() {
        let tree = build("((0_1,1_1)1_2,2_1)2_3;").unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.root_node().unwrap().tag(), "2_3");
    }

    #[test]
    fn test_mismatched_internal_label_is_rejected() {
        let err = build("((a,b)x,c);").unwrap_err();
        assert_eq!(
            err,
            StructuralError::LabelMismatch {
                label: "x".into(),
                derived: "1_2".into()
            }
        );
    }

    #[test]
    fn test_duplicate_leaf_labels_are_rejected() {
        let err = build("((a,b),a);").unwrap_err();
        assert_eq!(err, StructuralError::DuplicateTag("a".into()));
    }

    #[test]
    fn test_unary_node_duplicates_its_child_tag() {
        let err = build("(((a,b)),c);").unwrap_err();
        assert_eq!(err, StructuralError::DuplicateTag("1_2".into()));
    }

    #[test]
    fn test_leaf_label_colliding_with_derived_tag() {
        let err = build("((a,b),1_2);").unwrap_err();
        assert_eq!(err, StructuralError::DuplicateTag("1_2".into()));
    }

    #[test]
    fn test_unlabeled_leaf_is_rejected() {
        let err = build("(a,,b);").unwrap_err();
        assert_eq!(err, StructuralError::UnlabeledLeaf { position: 1 });
    }

    #[test]
    fn test_every_non_root_has_parent() {
        let tree = build("((a,b),(c,d));").unwrap();
        for (idx, node) in tree.traverse(TraversalKind::LevelOrder) {
            if Some(idx) == tree.root() {
                assert!(node.parent().is_none());
            } else {
                let parent = tree.parent_of(idx).unwrap();
                assert!(parent.children().contains(&idx));
            }
        }
    }

    #[test]
    fn test_builder_is_reusable() {
        let mut builder = TreeBuilder::new();
        let first = builder.build_from_parsed(&parse("(a,b);").unwrap()).unwrap();
        let second = builder.build_from_parsed(&parse("(a,b);").unwrap()).unwrap();
        assert!(isomorphic(&first, &second));
    }
}
