use crate::CacheError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Current cache format version. Incremented on incompatible layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;
const VERSION_FILE: &str = "version";

/// Directory layout for the Gantry bundle cache.
///
/// Bundles live under `bundles/`, their sidecar records under `records/`.
/// All subdirectories are created lazily on [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheVersion {
    format_version: u32,
}

impl CacheLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn bundles_dir(&self) -> PathBuf {
        self.root.join("bundles")
    }

    #[inline]
    pub fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    #[inline]
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".lock")
    }

    pub fn initialize(&self) -> Result<(), CacheError> {
        fs::create_dir_all(self.bundles_dir())?;
        fs::create_dir_all(self.records_dir())?;

        let version_path = self.root.join(VERSION_FILE);
        if version_path.exists() {
            self.verify_version()?;
        } else {
            let ver = CacheVersion {
                format_version: CACHE_FORMAT_VERSION,
            };
            let content = serde_json::to_string_pretty(&ver)?;
            let mut tmp = NamedTempFile::new_in(&self.root)?;
            tmp.write_all(content.as_bytes())?;
            tmp.as_file().sync_all()?;
            tmp.persist(&version_path)
                .map_err(|e| CacheError::Io(e.error))?;
            crate::fsync_dir(&self.root)?;
        }

        Ok(())
    }

    pub fn verify_version(&self) -> Result<(), CacheError> {
        let version_path = self.root.join(VERSION_FILE);
        let content = fs::read_to_string(&version_path)?;
        let ver: CacheVersion = serde_json::from_str(&content)?;

        if ver.format_version != CACHE_FORMAT_VERSION {
            return Err(CacheError::VersionMismatch {
                expected: CACHE_FORMAT_VERSION,
                found: ver.format_version,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = CacheLayout::new("/tmp/gantry-test");
        assert_eq!(
            layout.bundles_dir(),
            PathBuf::from("/tmp/gantry-test/bundles")
        );
        assert_eq!(
            layout.records_dir(),
            PathBuf::from("/tmp/gantry-test/records")
        );
        assert_eq!(layout.lock_file(), PathBuf::from("/tmp/gantry-test/.lock"));
    }

    #[test]
    fn initialize_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();

        assert!(layout.bundles_dir().is_dir());
        assert!(layout.records_dir().is_dir());
    }

    #[test]
    fn initialize_writes_version() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();
        layout.initialize().unwrap();
        layout.verify_version().unwrap();
    }

    #[test]
    fn initialize_rejects_future_format() {
        let dir = tempfile::tempdir().unwrap();
        let layout = CacheLayout::new(dir.path());
        layout.initialize().unwrap();

        fs::write(
            dir.path().join(VERSION_FILE),
            r#"{"format_version": 99}"#,
        )
        .unwrap();

        assert!(matches!(
            layout.initialize(),
            Err(CacheError::VersionMismatch {
                expected: CACHE_FORMAT_VERSION,
                found: 99
            })
        ));
    }
}
