//! Oracle generator for tree-traversal engines.
//!
//! Reads a tree in Newick notation, tags every node, computes preorder,
//! postorder and level-order tag sequences, and emits a C++ doctest fixture
//! asserting that the engine under test visits nodes in exactly that order.
//!
//! ```
//! use treeoracle::domain::{build_tree, TraversalKind};
//!
//! let tree = build_tree("((a,b),c);").unwrap();
//! assert_eq!(tree.tags(TraversalKind::Postorder), ["a", "b", "1_2", "c", "2_3"]);
//! ```

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
