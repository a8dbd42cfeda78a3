//! # Error Module
//!
//! Error types for snapmatch.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file failures stay local** - only whole-run problems surface here
//!   as a fatal `SnapMatchError`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two input collections an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputSet {
    /// The raw/original collection being searched
    Reference,
    /// The edited collection being matched
    Query,
}

impl std::fmt::Display for InputSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputSet::Reference => write!(f, "raw"),
            InputSet::Query => write!(f, "edited"),
        }
    }
}

/// Top-level application error
#[derive(Error, Debug)]
pub enum SnapMatchError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Matching error: {0}")]
    Match(#[from] MatchError),

    #[error("Report generation error: {0}")]
    Report(#[from] ReportError),

    #[error("No readable {set} images found. Check extensions and permissions.")]
    EmptyInputSet { set: InputSet },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur while enumerating image files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decode failures: the file is not a readable image.
///
/// These never abort a run. The file is excluded from its set.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Resize failed for {path}: {reason}")]
    ResizeFailed { path: PathBuf, reason: String },

    #[error("Failed to open image file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Attach a path to an error produced before the path was known
    /// (e.g. when decoding from an in-memory buffer).
    pub fn with_path(self, path: PathBuf) -> Self {
        match self {
            HashError::DecodeError { reason, .. } => HashError::DecodeError { path, reason },
            HashError::EmptyImage { .. } => HashError::EmptyImage { path },
            HashError::ResizeFailed { reason, .. } => HashError::ResizeFailed { path, reason },
            HashError::IoError { source, .. } => HashError::IoError { path, source },
        }
    }
}

/// Errors from the matching configuration
#[derive(Error, Debug)]
pub enum MatchError {
    #[error("Invalid max distance: {value} (must be 0-64)")]
    InvalidThreshold { value: u32 },
}

/// Errors that occur with the fingerprint cache file
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to write cache at {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Failed to serialize cache entry for {key}: {reason}")]
    SerializationFailed { key: String, reason: String },
}

/// Errors from placing matched raw files into the output folder
#[derive(Error, Debug)]
pub enum PlacementError {
    #[error("Unknown placement mode: {mode:?}. Use copy|hardlink|symlink.")]
    UnknownMode { mode: String },

    #[error("Failed to place {src} at {dst}: {source}")]
    Io {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("Failed to serialize report: {0}")]
    SerializationFailed(String),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, SnapMatchError>;
