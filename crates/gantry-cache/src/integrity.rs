use crate::disk::DiskBundleCache;
use crate::{BundleCache, CacheError};

#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub checked: usize,
    pub passed: usize,
    pub failed: Vec<IntegrityFailure>,
}

#[derive(Debug)]
pub struct IntegrityFailure {
    pub key: String,
    pub reason: String,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Re-read every cached bundle and verify it against its sidecar record.
pub fn verify_cache_integrity(cache: &DiskBundleCache) -> Result<IntegrityReport, CacheError> {
    let keys = cache.list()?;

    let mut report = IntegrityReport {
        checked: keys.len(),
        ..Default::default()
    };

    for key in &keys {
        match cache.lookup(key) {
            Ok(Some(_)) => report.passed += 1,
            Ok(None) => report.failed.push(IntegrityFailure {
                key: key.to_string(),
                reason: "bundle listed but unreadable".to_owned(),
            }),
            Err(CacheError::IntegrityFailure { actual, .. }) => {
                report.failed.push(IntegrityFailure {
                    key: key.to_string(),
                    reason: format!("content hash mismatch: got {actual}"),
                });
            }
            Err(e) => report.failed.push(IntegrityFailure {
                key: key.to_string(),
                reason: format!("read error: {e}"),
            }),
        }
    }

    Ok(report)
}
