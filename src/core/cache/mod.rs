//! # Cache Module
//!
//! Persists fingerprints of raw files so repeated runs over a large
//! archive only decode new or modified files.
//!
//! ## Lifecycle
//! 1. Loaded once at the start of a run ([`CacheStore::load`], best-effort)
//! 2. Rebuilt in memory while the reference set is fingerprinted
//! 3. Saved once as a full snapshot ([`CacheStore::save`])
//!
//! ## Invalidation
//! An entry is reused only when the live file's modification time and size
//! both equal the stored values. There is no content hash: a file rewritten
//! with the same size and mtime keeps its old fingerprint.
//!
//! ## Backends
//! - `CsvCacheStore` - the on-disk `path,mtime_ns,size,fingerprint` table
//! - `InMemoryCacheStore` - for testing
//! - `DisabledCache` - never reads, never writes

mod csv_store;
mod memory;
mod traits;

pub use csv_store::{load, save, CsvCacheStore};
pub use memory::{DisabledCache, InMemoryCacheStore};
pub use traits::CacheStore;

use crate::core::hasher::Fingerprint;
use crate::core::scanner::FileIdentity;
use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::path::Path;

/// Cache file name used inside the output folder when no location is given
pub const DEFAULT_CACHE_FILE_NAME: &str = "snapmatch_cache.csv";

/// A cached fingerprint together with the identity it was computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// File modification time at time of fingerprinting (ns since epoch)
    pub mtime_ns: i64,
    /// File size at time of fingerprinting
    pub size: u64,
    /// The fingerprint
    pub fingerprint: Fingerprint,
}

impl CacheEntry {
    pub fn new(identity: FileIdentity, fingerprint: Fingerprint) -> Self {
        Self {
            mtime_ns: identity.mtime_ns,
            size: identity.size,
            fingerprint,
        }
    }

    pub fn identity(&self) -> FileIdentity {
        FileIdentity {
            mtime_ns: self.mtime_ns,
            size: self.size,
        }
    }

    /// Check if this entry is still valid for a live file
    pub fn is_reusable(&self, live_mtime_ns: i64, live_size: u64) -> bool {
        is_reusable(self, live_mtime_ns, live_size)
    }
}

/// Exact equality on both identity fields.
pub fn is_reusable(entry: &CacheEntry, live_mtime_ns: i64, live_size: u64) -> bool {
    entry.mtime_ns == live_mtime_ns && entry.size == live_size
}

/// Cache key for a path: its string form. Callers pass canonical paths.
pub fn cache_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// In-memory snapshot of the cache: one entry per path, last write wins.
///
/// Keys are kept sorted so saved snapshots are byte-for-byte stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw lookup by key, valid or not
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Fingerprint for `path` if the stored identity matches `live`
    pub fn lookup(&self, path: &Path, live: FileIdentity) -> Option<Fingerprint> {
        self.entries
            .get(&cache_key(path))
            .filter(|entry| entry.is_reusable(live.mtime_ns, live.size))
            .map(|entry| entry.fingerprint)
    }

    /// Insert or overwrite the entry for `key`
    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(key.into(), entry)
    }

    /// Insert or overwrite the entry for a path
    pub fn insert_path(&mut self, path: &Path, entry: CacheEntry) -> Option<CacheEntry> {
        self.insert(cache_key(path), entry)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CacheEntry> {
        self.entries.iter()
    }
}

impl FromIterator<(String, CacheEntry)> for FingerprintCache {
    fn from_iter<I: IntoIterator<Item = (String, CacheEntry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Extend<(String, CacheEntry)> for FingerprintCache {
    fn extend<I: IntoIterator<Item = (String, CacheEntry)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a FingerprintCache {
    type Item = (&'a String, &'a CacheEntry);
    type IntoIter = btree_map::Iter<'a, String, CacheEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(mtime_ns: i64, size: u64) -> CacheEntry {
        CacheEntry {
            mtime_ns,
            size,
            fingerprint: Fingerprint::new(0xABCD),
        }
    }

    #[test]
    fn entry_reusable_when_unchanged() {
        assert!(entry(1_000, 2_000).is_reusable(1_000, 2_000));
    }

    #[test]
    fn entry_not_reusable_when_size_changed() {
        assert!(!entry(1_000, 2_000).is_reusable(1_000, 2_001));
    }

    #[test]
    fn entry_not_reusable_when_mtime_changed() {
        // Nanosecond precision: a 1ns difference is a change.
        assert!(!entry(1_000, 2_000).is_reusable(1_001, 2_000));
    }

    #[test]
    fn lookup_checks_identity() {
        let mut cache = FingerprintCache::new();
        cache.insert_path(Path::new("/raw/a.jpg"), entry(5, 10));

        let same = FileIdentity { mtime_ns: 5, size: 10 };
        let touched = FileIdentity { mtime_ns: 6, size: 10 };

        assert_eq!(
            cache.lookup(Path::new("/raw/a.jpg"), same),
            Some(Fingerprint::new(0xABCD))
        );
        assert_eq!(cache.lookup(Path::new("/raw/a.jpg"), touched), None);
        assert_eq!(cache.lookup(Path::new("/raw/b.jpg"), same), None);
    }

    #[test]
    fn insert_overwrites() {
        let mut cache = FingerprintCache::new();
        cache.insert("/raw/a.jpg", entry(1, 1));
        let previous = cache.insert("/raw/a.jpg", entry(2, 2));

        assert_eq!(previous, Some(entry(1, 1)));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("/raw/a.jpg"), Some(&entry(2, 2)));
    }
}
