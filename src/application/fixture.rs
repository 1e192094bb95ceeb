//! Fixture rendering
//!
//! Produces a C++ doctest translation unit that parses the tree with the
//! engine under test, runs each traversal with a tag-recording callback and
//! compares the recorded trace against the oracle. The trace is cleared after
//! every check so that no traversal sees tags left over from the previous one.

use std::fmt::Write as _;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::domain::Oracle;

/// Layout of the emitted fixture.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FixtureTemplate {
    /// Lines emitted as `//` comments at the top of the file
    pub header: Vec<String>,
    /// Raw lines emitted before the includes
    pub prelude: Vec<String>,
    /// Include targets, written verbatim after `#include `
    pub includes: Vec<String>,
    /// Name of the doctest `TEST_CASE`
    pub test_case: String,
}

impl Default for FixtureTemplate {
    fn default() -> Self {
        Self {
            header: vec![
                "Copyright 2019-2021 bito project contributors.".into(),
                "bito is free software under the GPLv3; see LICENSE file for details.".into(),
            ],
            prelude: vec!["#define DOCTEST_CONFIG_IMPLEMENT_WITH_MAIN".into()],
            includes: vec![
                "\"doctest.h\"".into(),
                "<string>".into(),
                "\"rooted_sbn_instance.hpp\"".into(),
                "\"stick_breaking_transform.hpp\"".into(),
                "\"taxon_name_munging.hpp\"".into(),
                "\"unrooted_sbn_instance.hpp\"".into(),
            ],
            test_case: "Node".into(),
        }
    }
}

/// Escape text for a C++ string literal.
///
/// Remaining control characters use three-digit octal escapes, which never
/// absorb a following character the way `\x` escapes do.
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\{:03o}", c as u32);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Render the complete fixture text.
///
/// `tree_text` is the serialized tree handed to the engine's parser; the
/// oracles are emitted in the order given.
pub fn render(template: &FixtureTemplate, tree_text: &str, oracles: &[Oracle]) -> String {
    let mut out = String::new();

    for line in &template.header {
        let _ = writeln!(out, "// {}", line);
    }
    if !template.header.is_empty() {
        out.push('\n');
    }
    for line in &template.prelude {
        let _ = writeln!(out, "{}", line);
    }
    for include in &template.includes {
        let _ = writeln!(out, "#include {}", include);
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "// NOTE: This file is automatically generated by `{}`. Don't edit!",
        env!("CARGO_PKG_NAME")
    );
    out.push('\n');

    let _ = writeln!(out, "TEST_CASE(\"{}\") {{", escape_literal(&template.test_case));
    out.push('\n');
    out.push_str("Driver driver;\n\n");
    out.push_str("std::vector<std::string> trace;\n");
    let _ = writeln!(
        out,
        "auto t = driver.ParseString(\"{}\").Trees()[0];",
        escape_literal(tree_text)
    );

    for oracle in oracles {
        let _ = writeln!(out, "\n// {}:", oracle.kind.name());
        let _ = writeln!(
            out,
            "t.Topology()->{}([&trace](const Node* node) {{ trace.push_back(node->TagString()); }});",
            oracle.kind.engine_method()
        );
        let expected = oracle
            .tags
            .iter()
            .map(|tag| format!("\"{}\"", escape_literal(tag)))
            .join(",");
        let _ = writeln!(
            out,
            "CHECK(std::vector<std::string>({{{}}}) == trace);",
            expected
        );
        out.push_str("trace.clear();\n");
    }

    out.push_str("}\n");
    out
}
