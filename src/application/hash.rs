//! Content digests for emitted fixtures
//!
//! A short SHA-256 prefix identifies a rendered fixture in logs and reports,
//! which makes regenerations that change nothing easy to spot.

use sha2::{Digest, Sha256};

/// Compute 8-character hex hash of content (first 32 bits of SHA-256).
///
/// # Examples
/// ```
/// use treeoracle::application::hash::content_hash;
///
/// assert_eq!(content_hash(b"").len(), 8);
/// assert_eq!(content_hash(b"abc"), content_hash(b"abc"));
/// ```
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    hex::encode(&result[..4])
}
