//! Error conversion helpers for common I/O operations
//!
//! Provides extension traits for cleaner error handling with path context.

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    ///
    /// # Example
    /// ```ignore
    /// fs.read(&path)
    ///     .with_path_context("read fixture", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;

    /// Mark an I/O error as a failure to produce the output artifact.
    fn for_output(self, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Io {
            context: format!("{}: {}", action, path.display()),
            source,
        })
    }

    fn for_output(self, path: &Path) -> ApplicationResult<T> {
        self.map_err(|source| ApplicationError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
