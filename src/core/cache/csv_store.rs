//! CSV cache backend.
//!
//! One header row, then one row per cached file:
//!
//! ```text
//! path,mtime_ns,size,fingerprint
//! /data/raw/IMG_0001.jpg,1700000000123456789,2483817,9241421688590303745
//! ```
//!
//! The fingerprint is a decimal `u64`. Caches written by older SnapMatch
//! builds name that column `dhash`; both spellings are accepted on load.

use super::{CacheEntry, CacheStore, FingerprintCache};
use crate::core::hasher::Fingerprint;
use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// One row of the cache table
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    path: String,
    mtime_ns: i64,
    size: u64,
    #[serde(alias = "dhash")]
    fingerprint: u64,
}

/// Cache stored as a CSV file
#[derive(Debug, Clone)]
pub struct CsvCacheStore {
    path: PathBuf,
}

impl CsvCacheStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CacheStore for CsvCacheStore {
    fn load(&self) -> FingerprintCache {
        load(&self.path)
    }

    fn save(&self, cache: &FingerprintCache) -> Result<(), CacheError> {
        save(&self.path, cache)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Best-effort load of a cache file.
///
/// Rows that fail to parse are skipped one by one; a missing or unreadable
/// file yields an empty cache.
pub fn load(path: &Path) -> FingerprintCache {
    let mut reader = match csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
    {
        Ok(reader) => reader,
        Err(e) => {
            if is_not_found(&e) {
                tracing::debug!("no cache at {}, starting empty", path.display());
            } else {
                tracing::warn!("ignoring unreadable cache {}: {}", path.display(), e);
            }
            return FingerprintCache::new();
        }
    };

    if let Err(e) = reader.headers() {
        tracing::warn!("ignoring cache {} with unreadable header: {}", path.display(), e);
        return FingerprintCache::new();
    }

    let mut cache = FingerprintCache::new();
    let mut skipped = 0usize;

    for row in reader.deserialize::<CacheRow>() {
        match row {
            Ok(row) if !row.path.is_empty() => {
                cache.insert(
                    row.path,
                    CacheEntry {
                        mtime_ns: row.mtime_ns,
                        size: row.size,
                        fingerprint: Fingerprint::new(row.fingerprint),
                    },
                );
            }
            Ok(_) => skipped += 1,
            Err(e) => {
                tracing::trace!("skipping cache row: {}", e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        tracing::debug!(
            "skipped {} malformed row(s) in cache {}",
            skipped,
            path.display()
        );
    }
    tracing::debug!("loaded {} cache entries from {}", cache.len(), path.display());

    cache
}

/// Write `cache` to `path` as a complete snapshot.
///
/// The rows go to a temporary file in the same directory which is then
/// renamed over `path`, so readers only ever see the old or the new
/// snapshot. Missing parent directories are created.
pub fn save(path: &Path, cache: &FingerprintCache) -> Result<(), CacheError> {
    let write_failed = |reason: String| CacheError::WriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| write_failed(e.to_string()))?;

    {
        let mut writer = csv::Writer::from_writer(io::BufWriter::new(temp.as_file_mut()));

        // An empty cache still gets its header row.
        if cache.is_empty() {
            writer
                .write_record(["path", "mtime_ns", "size", "fingerprint"])
                .map_err(|e| write_failed(e.to_string()))?;
        }

        for (key, entry) in cache {
            writer
                .serialize(CacheRow {
                    path: key.clone(),
                    mtime_ns: entry.mtime_ns,
                    size: entry.size,
                    fingerprint: entry.fingerprint.bits(),
                })
                .map_err(|e| CacheError::SerializationFailed {
                    key: key.clone(),
                    reason: e.to_string(),
                })?;
        }

        writer
            .into_inner()
            .map_err(|e| write_failed(e.to_string()))?
            .flush()
            .map_err(|e| write_failed(e.to_string()))?;
    }

    temp.as_file()
        .sync_all()
        .map_err(|e| write_failed(e.to_string()))?;
    temp.persist(path).map_err(|e| write_failed(e.error.to_string()))?;

    tracing::debug!("saved {} cache entries to {}", cache.len(), path.display());
    Ok(())
}

fn is_not_found(error: &csv::Error) -> bool {
    matches!(error.kind(), csv::ErrorKind::Io(e) if e.kind() == io::ErrorKind::NotFound)
}
