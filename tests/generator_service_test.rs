//! Tests for GeneratorService
//!
//! The service renders a fixture from a tree and writes it exactly once.
//! A failure in any stage before the write leaves the destination untouched.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use treeoracle::application::fixture::FixtureTemplate;
use treeoracle::application::services::{
    CheckOutcome, FixtureRequest, GeneratorService, WriteStatus,
};
use treeoracle::application::ApplicationError;
use treeoracle::config::DEFAULT_TREE;
use treeoracle::domain::{DomainError, StructuralError, TraversalKind};
use treeoracle::infrastructure::traits::{FileSystem, RealFileSystem};
use treeoracle::util::testing;

/// Real filesystem that counts atomic writes.
#[derive(Default)]
struct CountingFileSystem {
    inner: RealFileSystem,
    writes: AtomicUsize,
}

impl CountingFileSystem {
    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl FileSystem for CountingFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.inner.read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.inner.create_dir_all(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.write_atomic(path, content)
    }
}

fn request(tree: &str, output: PathBuf) -> FixtureRequest {
    FixtureRequest {
        tree: tree.to_string(),
        output,
        kinds: TraversalKind::ALL.to_vec(),
        template: FixtureTemplate::default(),
    }
}

fn setup() -> (TempDir, Arc<CountingFileSystem>, GeneratorService) {
    testing::init_test_setup();
    let temp = TempDir::new().unwrap();
    let fs = Arc::new(CountingFileSystem::default());
    let service = GeneratorService::new(fs.clone());
    (temp, fs, service)
}

// ============================================================
// generate() tests
// ============================================================

#[test]
fn given_reference_tree_when_generate_then_writes_three_checks_once() {
    // Arrange
    let (temp, fs, service) = setup();
    let output = temp.path().join("src/doctest.cpp");

    // Act
    let report = service.generate(&request(DEFAULT_TREE, output.clone())).unwrap();

    // Assert
    assert_eq!(report.status, WriteStatus::Created);
    assert_eq!(fs.writes(), 1);
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text, report.rendered.text);
    assert_eq!(text.matches("CHECK(").count(), 3);
    assert_eq!(text.matches("trace.clear();").count(), 3);
    assert!(text.contains(
        "driver.ParseString(\"((((0_1,1_1),(2_1,3_1)),4_1),((5_1,(6_1,7_1)),(8_1,9_1)));\")"
    ));
    assert!(text.contains(
        "CHECK(std::vector<std::string>({\"0_1\",\"1_1\",\"1_2\",\"2_1\",\"3_1\",\"3_2\",\"3_4\",\
\"4_1\",\"4_5\",\"5_1\",\"6_1\",\"7_1\",\"7_2\",\"7_3\",\"8_1\",\"9_1\",\"9_2\",\"9_5\",\"9_10\"}) == trace);"
    ));
    assert_eq!(report.rendered.node_count, 19);
    assert_eq!(report.rendered.digest.len(), 8);
}

#[test]
fn given_existing_fixture_when_generate_again_then_unchanged_and_byte_identical() {
    // Arrange
    let (temp, fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    let req = request(DEFAULT_TREE, output.clone());
    service.generate(&req).unwrap();
    let first = std::fs::read(&output).unwrap();

    // Act
    let report = service.generate(&req).unwrap();

    // Assert
    assert_eq!(report.status, WriteStatus::Unchanged);
    assert_eq!(std::fs::read(&output).unwrap(), first);
    assert_eq!(fs.writes(), 2);
}

#[test]
fn given_different_tree_when_generate_then_updated() {
    // Arrange
    let (temp, _fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    service.generate(&request(DEFAULT_TREE, output.clone())).unwrap();

    // Act
    let report = service.generate(&request("((a,b),c);", output.clone())).unwrap();

    // Assert
    assert_eq!(report.status, WriteStatus::Updated);
    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.contains("{\"2_3\",\"1_2\",\"a\",\"b\",\"c\"}"));
}

#[test]
fn given_malformed_tree_when_generate_then_prior_fixture_untouched() {
    // Arrange
    let (temp, fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    std::fs::write(&output, "previous fixture").unwrap();

    // Act
    let result = service.generate(&request("((a,b),c", output.clone()));

    // Assert
    let err = result.unwrap_err();
    assert!(matches!(err, ApplicationError::Domain(DomainError::Parse(_))));
    assert_eq!(err.stage(), "parse");
    assert_eq!(fs.writes(), 0);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous fixture");
}

#[test]
fn given_mismatched_label_when_generate_then_build_error_and_nothing_written() {
    // Arrange
    let (temp, fs, service) = setup();
    let output = temp.path().join("doctest.cpp");

    // Act
    let err = service
        .generate(&request("((a,b)wrong,c);", output.clone()))
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Structural(StructuralError::LabelMismatch { .. }))
    ));
    assert_eq!(err.stage(), "build");
    assert_eq!(fs.writes(), 0);
    assert!(!output.exists());
}

#[test]
fn given_parent_path_is_a_file_when_generate_then_write_error() {
    // Arrange
    let (temp, _fs, service) = setup();
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let output = blocker.join("doctest.cpp");

    // Act
    let err = service.generate(&request(DEFAULT_TREE, output.clone())).unwrap_err();

    // Assert
    match &err {
        ApplicationError::Write { path, .. } => assert_eq!(path, &output),
        other => panic!("expected write error, got {:?}", other),
    }
    assert_eq!(err.stage(), "emit");
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a directory");
}

#[test]
fn given_non_utf8_destination_when_generate_then_replaced() {
    // Arrange
    let (temp, fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    std::fs::write(&output, [0xff, 0xfe, 0x00]).unwrap();

    // Act
    let report = service.generate(&request(DEFAULT_TREE, output.clone())).unwrap();

    // Assert
    assert_eq!(report.status, WriteStatus::Updated);
    assert_eq!(fs.writes(), 1);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), report.rendered.text);
}

#[test]
fn given_destination_is_a_directory_when_generate_then_write_error() {
    // Arrange
    let (temp, _fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    std::fs::create_dir(&output).unwrap();

    // Act
    let err = service.generate(&request(DEFAULT_TREE, output.clone())).unwrap_err();

    // Assert
    assert!(matches!(err, ApplicationError::Write { .. }), "{:?}", err);
    assert_eq!(err.stage(), "emit");
    assert!(output.is_dir());
}

#[test]
fn given_deep_caterpillar_when_render_then_completes() {
    // Arrange
    let (temp, _fs, service) = setup();
    let depth = 100_000;
    let mut tree = "(".repeat(depth);
    tree.push_str("l0");
    for i in 1..=depth {
        tree.push_str(&format!(",l{})", i));
    }
    tree.push(';');
    let mut req = request(&tree, temp.path().join("unused.cpp"));
    req.kinds = vec![TraversalKind::Postorder];

    // Act
    let rendered = service.render(&req).unwrap();

    // Assert
    assert_eq!(rendered.node_count, 2 * depth + 1);
    assert_eq!(rendered.tree_text, tree);
    let root = format!("{}_{}", depth, depth + 1);
    assert_eq!(rendered.oracles[0].tags.last(), Some(&root));
}

#[test]
fn given_selected_kinds_when_render_then_only_those_in_order() {
    // Arrange
    let (temp, fs, service) = setup();
    let mut req = request("(a,b);", temp.path().join("unused.cpp"));
    req.kinds = vec![TraversalKind::LevelOrder, TraversalKind::Preorder];

    // Act
    let rendered = service.render(&req).unwrap();

    // Assert
    let kinds: Vec<_> = rendered.oracles.iter().map(|o| o.kind).collect();
    assert_eq!(kinds, req.kinds);
    let level = rendered.text.find("->LevelOrder(").unwrap();
    let pre = rendered.text.find("->Preorder(").unwrap();
    assert!(level < pre);
    assert!(!rendered.text.contains("->Postorder("));
    assert_eq!(fs.writes(), 0);
}

// ============================================================
// check() tests
// ============================================================

#[test]
fn given_no_fixture_when_check_then_missing() {
    let (temp, fs, service) = setup();
    let req = request(DEFAULT_TREE, temp.path().join("doctest.cpp"));

    assert_eq!(service.check(&req).unwrap(), CheckOutcome::Missing);
    assert_eq!(fs.writes(), 0);
}

#[test]
fn given_generated_fixture_when_check_then_up_to_date() {
    let (temp, _fs, service) = setup();
    let req = request(DEFAULT_TREE, temp.path().join("doctest.cpp"));
    service.generate(&req).unwrap();

    assert_eq!(service.check(&req).unwrap(), CheckOutcome::UpToDate);
}

#[test]
fn given_edited_fixture_when_check_then_stale_without_rewriting() {
    // Arrange
    let (temp, fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    let req = request(DEFAULT_TREE, output.clone());
    let report = service.generate(&req).unwrap();
    std::fs::write(&output, "hand edited").unwrap();

    // Act
    let outcome = service.check(&req).unwrap();

    // Assert
    match outcome {
        CheckOutcome::Stale {
            expected_digest,
            actual_digest,
        } => {
            assert_eq!(expected_digest, report.rendered.digest);
            assert_ne!(actual_digest, expected_digest);
        }
        other => panic!("expected stale, got {:?}", other),
    }
    assert_eq!(fs.writes(), 1);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "hand edited");
}

#[test]
fn given_non_utf8_fixture_when_check_then_stale() {
    let (temp, _fs, service) = setup();
    let output = temp.path().join("doctest.cpp");
    std::fs::write(&output, [0xff, 0xfe, 0x00]).unwrap();

    let outcome = service.check(&request(DEFAULT_TREE, output)).unwrap();

    assert!(matches!(outcome, CheckOutcome::Stale { .. }), "{:?}", outcome);
}

// ============================================================
// oracles() tests
// ============================================================

#[test]
fn given_real_filesystem_when_oracles_then_independent_of_io() {
    let service = GeneratorService::new(Arc::new(RealFileSystem));

    let (tree, oracles) = service
        .oracles("((a,b),c);", &[TraversalKind::Postorder])
        .unwrap();

    assert_eq!(tree.len(), 5);
    assert_eq!(oracles.len(), 1);
    assert_eq!(oracles[0].tags, vec!["a", "b", "1_2", "c", "2_3"]);
}
