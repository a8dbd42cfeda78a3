//! Cache backend trait definition.

use super::FingerprintCache;
use crate::error::CacheError;
use std::sync::Arc;

/// Where a [`FingerprintCache`] snapshot lives between runs.
///
/// The pipeline calls `load` once before fingerprinting and `save` once
/// after every worker has finished, so backends never see concurrent access.
pub trait CacheStore: Send + Sync {
    /// Load the last snapshot.
    ///
    /// Never fails: unreadable rows are skipped and an unreadable or
    /// absent store yields an empty cache.
    fn load(&self) -> FingerprintCache;

    /// Replace the stored snapshot with `cache`
    fn save(&self, cache: &FingerprintCache) -> Result<(), CacheError>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// Shared stores, so a caller can keep a handle to a store it hands to
/// the pipeline.
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    fn load(&self) -> FingerprintCache {
        (**self).load()
    }

    fn save(&self, cache: &FingerprintCache) -> Result<(), CacheError> {
        (**self).save(cache)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
