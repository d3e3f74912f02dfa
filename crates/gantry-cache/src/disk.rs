use crate::layout::CacheLayout;
use crate::{fsync_dir, BundleCache, CacheError};
use gantry_schema::BundleKey;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::debug;

/// Sidecar record written next to each cached bundle.
///
/// The content hash makes corruption detectable on read; size and timestamp
/// exist for listing and eviction tooling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BundleRecord {
    pub key: BundleKey,
    pub content_hash: String,
    pub size: u64,
    pub stored_at: String,
}

/// File-backed [`BundleCache`].
///
/// Bundles are stored as `bundles/<key>` with a JSON record at
/// `records/<key>.json`. Writes are atomic via `NamedTempFile`; reads verify
/// the blake3 content hash recorded at store time.
pub struct DiskBundleCache {
    layout: CacheLayout,
}

impl DiskBundleCache {
    pub fn new(layout: CacheLayout) -> Self {
        Self { layout }
    }

    /// Open a cache rooted at the given directory, creating it when absent.
    pub fn open(root: impl Into<std::path::PathBuf>) -> Result<Self, CacheError> {
        let layout = CacheLayout::new(root);
        layout.initialize()?;
        Ok(Self::new(layout))
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.layout
    }

    /// Read the sidecar record for a key.
    pub fn record(&self, key: &BundleKey) -> Result<BundleRecord, CacheError> {
        let path = self.record_path(key);
        if !path.exists() {
            return Err(CacheError::BundleNotFound(key.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn bundle_path(&self, key: &BundleKey) -> std::path::PathBuf {
        self.layout.bundles_dir().join(key.as_str())
    }

    fn record_path(&self, key: &BundleKey) -> std::path::PathBuf {
        self.layout.records_dir().join(format!("{key}.json"))
    }

    fn write_atomic(
        dir: &std::path::Path,
        dest: &std::path::Path,
        data: &[u8],
    ) -> Result<(), CacheError> {
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.as_file().sync_all()?;
        tmp.persist(dest).map_err(|e| CacheError::Io(e.error))?;
        fsync_dir(dir)?;
        Ok(())
    }
}

impl BundleCache for DiskBundleCache {
    fn lookup(&self, key: &BundleKey) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.bundle_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read(&path)?;

        let record = self.record(key)?;
        let actual = blake3::hash(&data).to_hex().to_string();
        if actual != record.content_hash {
            return Err(CacheError::IntegrityFailure {
                key: key.to_string(),
                expected: record.content_hash,
                actual,
            });
        }

        debug!("cache hit for {} ({} bytes)", key.short(), data.len());
        Ok(Some(data))
    }

    fn store(&self, key: &BundleKey, bundle: &[u8]) -> Result<(), CacheError> {
        let record = BundleRecord {
            key: key.clone(),
            content_hash: blake3::hash(bundle).to_hex().to_string(),
            size: bundle.len() as u64,
            stored_at: chrono::Utc::now().to_rfc3339(),
        };

        let bundles_dir = self.layout.bundles_dir();
        Self::write_atomic(&bundles_dir, &self.bundle_path(key), bundle)?;

        let records_dir = self.layout.records_dir();
        let record_json = serde_json::to_string_pretty(&record)?;
        Self::write_atomic(&records_dir, &self.record_path(key), record_json.as_bytes())?;

        debug!("stored bundle {} ({} bytes)", key.short(), bundle.len());
        Ok(())
    }

    fn contains(&self, key: &BundleKey) -> bool {
        self.bundle_path(key).exists()
    }

    fn remove(&self, key: &BundleKey) -> Result<(), CacheError> {
        let bundle = self.bundle_path(key);
        if bundle.exists() {
            fs::remove_file(bundle)?;
        }
        let record = self.record_path(key);
        if record.exists() {
            fs::remove_file(record)?;
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<BundleKey>, CacheError> {
        let dir = self.layout.bundles_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut keys = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    keys.push(BundleKey::new(name));
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}
