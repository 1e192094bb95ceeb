//! Fixture generation service
//!
//! Parse → build → traverse (×kinds) → render → write once.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument, warn};

use crate::application::fixture::{render, FixtureTemplate};
use crate::application::hash::content_hash;
use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::newick::{self, NewickStyle, ParsedNode};
use crate::domain::{DomainError, Oracle, TraversalKind, TreeArena, TreeBuilder};
use crate::infrastructure::traits::FileSystem;

/// Everything needed to produce one fixture.
#[derive(Debug, Clone)]
pub struct FixtureRequest {
    /// Source tree in tree notation
    pub tree: String,
    /// Destination of the fixture file
    pub output: PathBuf,
    /// Traversals to check, in emission order
    pub kinds: Vec<TraversalKind>,
    pub template: FixtureTemplate,
}

/// A fixture rendered in memory.
#[derive(Debug, Clone)]
pub struct RenderedFixture {
    pub text: String,
    /// Serialized tree embedded in the fixture
    pub tree_text: String,
    pub oracles: Vec<Oracle>,
    pub node_count: usize,
    /// 8-character content digest of `text`
    pub digest: String,
}

/// What happened to the destination file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Created,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub path: PathBuf,
    pub status: WriteStatus,
    pub rendered: RenderedFixture,
}

/// Result of comparing the on-disk fixture with a fresh rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate,
    Stale { expected_digest: String, actual_digest: String },
    Missing,
}

/// Service producing traversal fixtures.
pub struct GeneratorService {
    fs: Arc<dyn FileSystem>,
}

impl GeneratorService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Build the tree and compute one oracle per kind.
    ///
    /// The tree is immutable once built, so the traversals run in parallel;
    /// results keep the order of `kinds`.
    #[instrument(level = "debug", skip(self, tree_text))]
    pub fn oracles(
        &self,
        tree_text: &str,
        kinds: &[TraversalKind],
    ) -> ApplicationResult<(TreeArena, Vec<Oracle>)> {
        let parsed = newick::parse(tree_text).map_err(DomainError::from)?;
        self.oracles_for(&parsed, kinds)
    }

    fn oracles_for(
        &self,
        parsed: &ParsedNode,
        kinds: &[TraversalKind],
    ) -> ApplicationResult<(TreeArena, Vec<Oracle>)> {
        let tree = TreeBuilder::new()
            .build_from_parsed(parsed)
            .map_err(DomainError::from)?;
        let oracles = kinds
            .par_iter()
            .map(|&kind| Oracle::compute(&tree, kind))
            .collect();
        Ok((tree, oracles))
    }

    /// Render a fixture without touching the filesystem.
    #[instrument(level = "debug", skip(self, request), fields(output = %request.output.display()))]
    pub fn render(&self, request: &FixtureRequest) -> ApplicationResult<RenderedFixture> {
        let parsed = newick::parse(&request.tree).map_err(DomainError::from)?;
        debug!("render: parsed {} nodes", parsed.node_count());
        let tree_text = parsed.to_newick(NewickStyle::Topology);

        let (tree, oracles) = self.oracles_for(&parsed, &request.kinds)?;
        let text = render(&request.template, &tree_text, &oracles);
        let digest = content_hash(text.as_bytes());
        debug!("render: {} oracles, digest {}", oracles.len(), digest);

        Ok(RenderedFixture {
            text,
            tree_text,
            oracles,
            node_count: tree.len(),
            digest,
        })
    }

    /// Render the fixture and write it to `request.output`.
    ///
    /// Nothing is written unless every earlier stage succeeded, and the write
    /// replaces the destination in one step.
    #[instrument(level = "debug", skip(self, request), fields(output = %request.output.display()))]
    pub fn generate(&self, request: &FixtureRequest) -> ApplicationResult<GenerationReport> {
        let rendered = self.render(request)?;
        let path = request.output.clone();

        // Only the write may fail the run; an unreadable destination is replaced.
        let status = match self.read_existing(&path) {
            Ok(None) => WriteStatus::Created,
            Ok(Some(existing)) if existing == rendered.text.as_bytes() => WriteStatus::Unchanged,
            Ok(Some(_)) => WriteStatus::Updated,
            Err(e) => {
                warn!("cannot compare with existing fixture, replacing it: {}", e);
                WriteStatus::Updated
            }
        };

        self.fs.ensure_parent(&path).for_output(&path)?;
        self.fs.write_atomic(&path, &rendered.text).for_output(&path)?;
        info!(
            path = %path.display(),
            digest = %rendered.digest,
            nodes = rendered.node_count,
            ?status,
            "fixture written"
        );

        Ok(GenerationReport {
            path,
            status,
            rendered,
        })
    }

    /// Compare the fixture on disk with a fresh rendering. Never writes.
    #[instrument(level = "debug", skip(self, request), fields(output = %request.output.display()))]
    pub fn check(&self, request: &FixtureRequest) -> ApplicationResult<CheckOutcome> {
        let rendered = self.render(request)?;
        let outcome = match self.read_existing(&request.output)? {
            None => CheckOutcome::Missing,
            Some(existing) if existing == rendered.text.as_bytes() => CheckOutcome::UpToDate,
            Some(existing) => CheckOutcome::Stale {
                expected_digest: rendered.digest,
                actual_digest: content_hash(&existing),
            },
        };
        debug!("check: {:?}", outcome);
        Ok(outcome)
    }

    fn read_existing(&self, path: &Path) -> ApplicationResult<Option<Vec<u8>>> {
        if !self.fs.exists(path) {
            return Ok(None);
        }
        self.fs
            .read(path)
            .with_path_context("read existing fixture", path)
            .map(Some)
    }
}
