//! Domain layer: tree notation, tree model and traversals
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod error;
pub mod newick;
pub mod traversal;

pub use arena::{Clade, TreeArena, TreeNode};
pub use builder::{isomorphic, TreeBuilder};
pub use error::{DomainError, ParseError, ParseErrorKind, StructuralError};
pub use newick::{NewickStyle, ParsedNode};
pub use traversal::{Oracle, TraceCollector, Traversal, TraversalKind};

/// Parse tree notation and build the tagged tree in one step.
pub fn build_tree(text: &str) -> Result<TreeArena, DomainError> {
    let parsed = newick::parse(text)?;
    Ok(TreeBuilder::new().build_from_parsed(&parsed)?)
}
