//! Bundle cache for Gantry: lookup and storage of compiled JavaScript bundles
//! keyed by manifest identity.
//!
//! This crate provides the [`BundleCache`] capability trait consumed by the
//! loader, a file-backed [`DiskBundleCache`] with atomic writes and blake3
//! integrity verification on read, an in-memory [`MemoryBundleCache`] for
//! tests and embedders, a [`CacheLayout`] managing the on-disk structure, and
//! an integrity sweep for the whole cache.

pub mod disk;
pub mod integrity;
pub mod layout;
pub mod lock;
pub mod memory;

pub use disk::{BundleRecord, DiskBundleCache};
pub use integrity::{verify_cache_integrity, IntegrityFailure, IntegrityReport};
pub use layout::{CacheLayout, CACHE_FORMAT_VERSION};
pub use lock::CacheLock;
pub use memory::MemoryBundleCache;

use gantry_schema::BundleKey;
use std::path::Path;
use thiserror::Error;

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// On Linux with ext4 `data=ordered` (the default), renames are usually
/// durable without an explicit dir fsync, but POSIX does not guarantee this.
/// Calling `fsync()` on the parent directory makes the rename durable on
/// all filesystems and mount configurations.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = std::fs::File::open(dir)?;
    f.sync_all()
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no cached bundle for key: {0}")]
    BundleNotFound(String),
    #[error("integrity check failed for bundle '{key}': expected {expected}, got {actual}")]
    IntegrityFailure {
        key: String,
        expected: String,
        actual: String,
    },
    #[error("cache format version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("lock acquisition failed: {0}")]
    LockFailed(String),
}

/// Capability interface for bundle storage keyed by manifest identity.
///
/// The loader only ever reads through this trait; population on a successful
/// network fetch is the consumer's side effect.
pub trait BundleCache: Send + Sync {
    /// Look a bundle up by key. `Ok(None)` means not cached; errors mean the
    /// cache itself misbehaved (I/O, corruption).
    fn lookup(&self, key: &BundleKey) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store a bundle under a key, replacing any previous entry.
    fn store(&self, key: &BundleKey, bundle: &[u8]) -> Result<(), CacheError>;

    /// Cheap existence check without reading the bundle.
    fn contains(&self, key: &BundleKey) -> bool;

    /// Remove a bundle. Removing an absent key is not an error.
    fn remove(&self, key: &BundleKey) -> Result<(), CacheError>;

    /// List all cached bundle keys.
    fn list(&self) -> Result<Vec<BundleKey>, CacheError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_error_display_bundle_not_found() {
        let e = CacheError::BundleNotFound("abc123".to_owned());
        assert!(e.to_string().contains("abc123"));
    }

    #[test]
    fn cache_error_display_integrity_failure() {
        let e = CacheError::IntegrityFailure {
            key: "k".to_owned(),
            expected: "exp".to_owned(),
            actual: "act".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("exp"));
        assert!(msg.contains("act"));
    }

    #[test]
    fn cache_error_display_version_mismatch() {
        let e = CacheError::VersionMismatch {
            expected: 1,
            found: 9,
        };
        let msg = e.to_string();
        assert!(msg.contains('1'));
        assert!(msg.contains('9'));
    }

    #[test]
    fn cache_error_display_lock_failed() {
        let e = CacheError::LockFailed("held elsewhere".to_owned());
        assert!(e.to_string().contains("held elsewhere"));
    }
}
