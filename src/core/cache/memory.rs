//! Non-persistent cache backends.

use super::{CacheStore, FingerprintCache};
use crate::error::CacheError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// In-memory cache backend
///
/// Keeps the last saved snapshot and counts saves, which makes it useful
/// for testing the pipeline's load/save discipline.
#[derive(Default)]
pub struct InMemoryCacheStore {
    snapshot: RwLock<FingerprintCache>,
    saves: AtomicUsize,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot
    pub fn with_snapshot(cache: FingerprintCache) -> Self {
        Self {
            snapshot: RwLock::new(cache),
            saves: AtomicUsize::new(0),
        }
    }

    /// Current stored snapshot
    pub fn snapshot(&self) -> FingerprintCache {
        self.snapshot
            .read()
            .map(|cache| cache.clone())
            .unwrap_or_default()
    }

    /// Number of times `save` has been called
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CacheStore for InMemoryCacheStore {
    fn load(&self) -> FingerprintCache {
        self.snapshot()
    }

    fn save(&self, cache: &FingerprintCache) -> Result<(), CacheError> {
        let mut snapshot = self
            .snapshot
            .write()
            .map_err(|_| CacheError::WriteFailed {
                path: "memory".into(),
                reason: "lock poisoned".to_string(),
            })?;
        *snapshot = cache.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory cache".to_string()
    }
}

/// Backend for runs without a cache: loads nothing, saves nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

impl CacheStore for DisabledCache {
    fn load(&self) -> FingerprintCache {
        FingerprintCache::new()
    }

    fn save(&self, _cache: &FingerprintCache) -> Result<(), CacheError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "disabled".to_string()
    }
}
