//! Newick tree notation reader and writer.
//!
//! Grammar accepted by [`parse`]:
//!
//! ```text
//! tree    := node ';'
//! node    := '(' node (',' node)* ')' label? length? | label? length?
//! label   := unquoted | "'" ( [^'] | "''" )* "'"
//! length  := ':' float
//! ```
//!
//! Whitespace and `[...]` comments may appear between any two tokens.
//! Reading, writing and dropping all use explicit stacks, so deeply nested
//! input cannot exhaust the call stack.

use std::fmt::Write as _;

use tracing::instrument;

use crate::domain::error::{ParseError, ParseErrorKind};

/// Characters that end an unquoted label.
const DELIMITERS: &[char] = &['(', ')', '[', ']', '\'', ':', ';', ','];

/// One clade as written in the source text, before any tags are assigned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedNode {
    pub label: Option<String>,
    pub branch_length: Option<f64>,
    /// Children in source order
    pub children: Vec<ParsedNode>,
}

/// How much of a parsed tree to write back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewickStyle {
    /// Leaf labels only: the canonical form embedded in fixtures
    Topology,
    /// Every label plus branch lengths
    Labeled,
}

impl ParsedNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            branch_length: None,
            children: Vec::new(),
        }
    }

    pub fn clade(children: Vec<ParsedNode>) -> Self {
        Self {
            label: None,
            branch_length: None,
            children,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Serialize back into tree notation, terminated by `;`.
    pub fn to_newick(&self, style: NewickStyle) -> String {
        let mut out = String::new();
        write_node(self, style, &mut out);
        out.push(';');
        out
    }
}

impl Drop for ParsedNode {
    // Drain descendants into a worklist instead of recursing once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}

/// Serializer work item.
enum Emit<'a> {
    Open(&'a ParsedNode),
    Comma,
    Close(&'a ParsedNode),
}

fn write_node(root: &ParsedNode, style: NewickStyle, out: &mut String) {
    let mut stack = vec![Emit::Open(root)];
    while let Some(item) = stack.pop() {
        match item {
            Emit::Open(node) if node.is_leaf() => write_annotations(node, style, out),
            Emit::Open(node) => {
                out.push('(');
                stack.push(Emit::Close(node));
                for (i, child) in node.children.iter().enumerate().rev() {
                    stack.push(Emit::Open(child));
                    if i > 0 {
                        stack.push(Emit::Comma);
                    }
                }
            }
            Emit::Comma => out.push(','),
            Emit::Close(node) => {
                out.push(')');
                write_annotations(node, style, out);
            }
        }
    }
}

fn write_annotations(node: &ParsedNode, style: NewickStyle, out: &mut String) {
    let show_label = node.is_leaf() || style == NewickStyle::Labeled;
    if let (true, Some(label)) = (show_label, node.label.as_deref()) {
        out.push_str(&quote_label(label));
    }
    if style == NewickStyle::Labeled {
        if let Some(length) = node.branch_length {
            let _ = write!(out, ":{}", length);
        }
    }
}

/// Quote a label when it would not read back verbatim unquoted.
pub fn quote_label(label: &str) -> String {
    let needs_quotes = label
        .chars()
        .any(|c| c.is_whitespace() || DELIMITERS.contains(&c));
    if needs_quotes {
        format!("'{}'", label.replace('\'', "''"))
    } else {
        label.to_string()
    }
}

/// Read a single tree from `text`.
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn parse(text: &str) -> Result<ParsedNode, ParseError> {
    Reader::new(text).read_tree()
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(self.pos, kind)
    }

    /// Skip whitespace and bracketed comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('[') => {
                    let start = self.pos;
                    match self.src[self.pos..].find(']') {
                        Some(offset) => self.pos += offset + 1,
                        None => {
                            return Err(ParseError::new(
                                start,
                                ParseErrorKind::UnterminatedComment,
                            ))
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_tree(mut self) -> Result<ParsedNode, ParseError> {
        self.skip_trivia()?;
        if self.peek().is_none() {
            return Err(self.error(ParseErrorKind::Empty));
        }

        // Children collected so far for every clade that is still open.
        let mut open: Vec<Vec<ParsedNode>> = Vec::new();

        'node: loop {
            self.skip_trivia()?;
            if self.peek() == Some('(') {
                self.bump();
                open.push(Vec::new());
                continue 'node;
            }

            let mut node = self.read_annotations(Vec::new())?;

            loop {
                self.skip_trivia()?;
                match self.peek() {
                    Some(',') => {
                        let Some(siblings) = open.last_mut() else {
                            return Err(self.error(ParseErrorKind::UnexpectedCharacter(',')));
                        };
                        siblings.push(node);
                        self.bump();
                        continue 'node;
                    }
                    Some(')') => {
                        let Some(mut children) = open.pop() else {
                            return Err(self.error(ParseErrorKind::UnbalancedParentheses));
                        };
                        children.push(node);
                        self.bump();
                        node = self.read_annotations(children)?;
                    }
                    Some(';') => {
                        if !open.is_empty() {
                            return Err(self.error(ParseErrorKind::UnbalancedParentheses));
                        }
                        self.bump();
                        self.skip_trivia()?;
                        if self.peek().is_some() {
                            return Err(self.error(ParseErrorKind::TrailingInput));
                        }
                        return Ok(node);
                    }
                    Some(c) => return Err(self.error(ParseErrorKind::UnexpectedCharacter(c))),
                    None if open.is_empty() => {
                        return Err(self.error(ParseErrorKind::MissingTerminator))
                    }
                    None => return Err(self.error(ParseErrorKind::UnbalancedParentheses)),
                }
            }
        }
    }

    /// Read the optional label and branch length that follow a node.
    fn read_annotations(&mut self, children: Vec<ParsedNode>) -> Result<ParsedNode, ParseError> {
        self.skip_trivia()?;
        let label = self.read_label()?;
        self.skip_trivia()?;
        let branch_length = if self.peek() == Some(':') {
            self.bump();
            self.skip_trivia()?;
            Some(self.read_length()?)
        } else {
            None
        };
        Ok(ParsedNode {
            label,
            branch_length,
            children,
        })
    }

    fn read_label(&mut self) -> Result<Option<String>, ParseError> {
        if self.peek() == Some('\'') {
            let start = self.pos;
            self.bump();
            let mut label = String::new();
            loop {
                match self.bump() {
                    Some('\'') if self.peek() == Some('\'') => {
                        self.bump();
                        label.push('\'');
                    }
                    Some('\'') => return Ok(Some(label)),
                    Some(c) => label.push(c),
                    None => {
                        return Err(ParseError::new(start, ParseErrorKind::UnterminatedQuote))
                    }
                }
            }
        }

        let token = self.read_bare();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn read_length(&mut self) -> Result<f64, ParseError> {
        let start = self.pos;
        let token = self.read_bare();
        match token.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseError::new(
                start,
                ParseErrorKind::InvalidBranchLength(token.to_string()),
            )),
        }
    }

    fn read_bare(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || DELIMITERS.contains(&c) {
                break;
            }
            self.bump();
        }
        let src = self.src;
        &src[start..self.pos]
    }
}
