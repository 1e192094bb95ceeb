//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// What went wrong while reading tree notation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseErrorKind {
    #[error("empty input")]
    Empty,

    #[error("unbalanced parentheses")]
    UnbalancedParentheses,

    #[error("missing ';' terminator")]
    MissingTerminator,

    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),

    #[error("unterminated quoted label")]
    UnterminatedQuote,

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("invalid branch length {0:?}")]
    InvalidBranchLength(String),

    #[error("trailing input after ';'")]
    TrailingInput,
}

/// Tree notation does not conform to the grammar.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} at offset {position}")]
pub struct ParseError {
    /// Byte offset into the source text
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

/// Parsed structure violates a tree model invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("duplicate tag: {0}")]
    DuplicateTag(String),

    #[error("leaf #{position} has no label")]
    UnlabeledLeaf { position: usize },

    #[error("internal label {label:?} does not match derived tag {derived:?}")]
    LabelMismatch { label: String, derived: String },

    #[error("node {0} has no parent")]
    OrphanNode(String),

    #[error("tree has more than one root")]
    MultipleRoots,
}

/// Domain errors represent tree notation and tree model violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("structural error: {0}")]
    Structural(#[from] StructuralError),
}
