//! # Scanner Module
//!
//! Enumerates candidate image files under a root directory.
//!
//! The scanner only filters by extension (case-insensitive) and the
//! hidden-file policy. Whether a file really is an image is decided later,
//! when it is decoded.
//!
//! ## Default Extensions
//! jpg, jpeg, png, bmp, tiff, tif, webp, jfif
//!
//! ## Example
//! ```rust,ignore
//! use snapmatch::core::scanner::{PhotoScanner, ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let result = scanner.scan(Path::new("/data/raw"))?;
//! ```

mod filter;
mod walker;

pub use filter::{ImageFilter, DEFAULT_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirScanner};

use crate::error::ScanError;
use crate::events::{null_sender, EventSender};
use serde::{Deserialize, Serialize};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// The cheap "content unchanged" proxy used by the fingerprint cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileIdentity {
    /// Modification time in nanoseconds since the Unix epoch
    pub mtime_ns: i64,
    /// File size in bytes
    pub size: u64,
}

impl FileIdentity {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            mtime_ns: metadata.modified().map(mtime_ns).unwrap_or(0),
            size: metadata.len(),
        }
    }

    /// Stat a live file.
    pub fn of(path: &Path) -> std::io::Result<Self> {
        std::fs::metadata(path).map(|m| Self::from_metadata(&m))
    }
}

/// Signed nanoseconds since the Unix epoch, saturating at the `i64` range.
pub fn mtime_ns(modified: SystemTime) -> i64 {
    match modified.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos())
            .map(|n| -n)
            .unwrap_or(i64::MIN),
    }
}

/// A discovered candidate image file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoFile {
    /// Absolute, canonicalized path
    pub path: PathBuf,
    /// (mtime, size) captured when the file was enumerated
    pub identity: FileIdentity,
}

/// Result of a scan operation
#[derive(Debug)]
pub struct ScanResult {
    /// Candidate files in traversal order
    pub photos: Vec<PhotoFile>,
    /// Entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Source of candidate image paths.
///
/// Implement this trait to feed the pipeline from something other than
/// a directory walk (e.g. a fixed list in tests).
pub trait PhotoScanner: Send + Sync {
    /// Enumerate candidates under `root`. A missing root is an error;
    /// unreadable entries below it are collected in [`ScanResult::errors`].
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &null_sender())
    }

    /// Like [`PhotoScanner::scan`], reporting unreadable entries as events
    fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError>;
}
