use crate::CacheError;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Advisory lock guarding mutating cache operations across processes.
pub struct CacheLock {
    lock_file: File,
}

impl CacheLock {
    pub fn acquire(lock_path: &Path) -> Result<Self, CacheError> {
        let file = Self::open_lock_file(lock_path)?;
        file.lock_exclusive()
            .map_err(|e| CacheError::LockFailed(e.to_string()))?;
        Ok(Self { lock_file: file })
    }

    pub fn try_acquire(lock_path: &Path) -> Result<Option<Self>, CacheError> {
        let file = Self::open_lock_file(lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { lock_file: file })),
            Err(_) => Ok(None),
        }
    }

    fn open_lock_file(lock_path: &Path) -> Result<File, CacheError> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)?)
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_acquire_and_release() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(".lock");

        {
            let _lock = CacheLock::acquire(&lock_path).unwrap();
            assert!(lock_path.exists());
        }
    }

    #[test]
    fn try_acquire_returns_none_when_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(".lock");

        let _lock = CacheLock::acquire(&lock_path).unwrap();
        let result = CacheLock::try_acquire(&lock_path).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join(".lock");

        {
            let _lock = CacheLock::acquire(&lock_path).unwrap();
        }

        let lock2 = CacheLock::try_acquire(&lock_path).unwrap();
        assert!(lock2.is_some());
    }
}
