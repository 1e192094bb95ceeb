//! I/O boundary traits for testability
//!
//! Services reach the filesystem only through [`FileSystem`], so tests can
//! observe or fail individual operations.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read raw file contents.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Replace `path` with `content` in one step.
    ///
    /// Readers see either the previous file or the complete new one, never a
    /// truncated mix. On error the previous file is left untouched.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => self.create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        // The temp file must live on the same filesystem for the rename to be atomic
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}
