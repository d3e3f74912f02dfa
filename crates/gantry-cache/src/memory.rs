use crate::{BundleCache, CacheError};
use gantry_schema::BundleKey;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory [`BundleCache`] for tests and embedders that do not want a
/// cache directory on disk.
#[derive(Default)]
pub struct MemoryBundleCache {
    bundles: Mutex<HashMap<BundleKey, Vec<u8>>>,
}

impl MemoryBundleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached bundles.
    pub fn len(&self) -> usize {
        self.bundles.lock().expect("cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BundleCache for MemoryBundleCache {
    fn lookup(&self, key: &BundleKey) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(self
            .bundles
            .lock()
            .expect("cache lock poisoned")
            .get(key)
            .cloned())
    }

    fn store(&self, key: &BundleKey, bundle: &[u8]) -> Result<(), CacheError> {
        self.bundles
            .lock()
            .expect("cache lock poisoned")
            .insert(key.clone(), bundle.to_vec());
        Ok(())
    }

    fn contains(&self, key: &BundleKey) -> bool {
        self.bundles
            .lock()
            .expect("cache lock poisoned")
            .contains_key(key)
    }

    fn remove(&self, key: &BundleKey) -> Result<(), CacheError> {
        self.bundles
            .lock()
            .expect("cache lock poisoned")
            .remove(key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<BundleKey>, CacheError> {
        let mut keys: Vec<BundleKey> = self
            .bundles
            .lock()
            .expect("cache lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}
