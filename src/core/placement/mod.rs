//! # Placement Module
//!
//! Puts the raw original of every matched photo into the output folder.
//!
//! ## Naming
//! Existing files are never overwritten. When `photo.jpg` is taken the
//! next free name among `photo__2.jpg`, `photo__3.jpg`, ... is used.
//! Names handed out earlier in the same run count as taken, so a dry run
//! reports the same destinations a real run would create.
//!
//! ## Modes
//! - `copy` - file content and permissions
//! - `hardlink` - same filesystem only
//! - `symlink` - link pointing at the raw file

use crate::core::matcher::MatchOutcome;
use crate::error::PlacementError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// How a matched raw file is placed into the output folder
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    #[default]
    Copy,
    Hardlink,
    Symlink,
}

impl PlacementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlacementMode::Copy => "copy",
            PlacementMode::Hardlink => "hardlink",
            PlacementMode::Symlink => "symlink",
        }
    }
}

impl FromStr for PlacementMode {
    type Err = PlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "copy" => Ok(PlacementMode::Copy),
            "hardlink" => Ok(PlacementMode::Hardlink),
            "symlink" => Ok(PlacementMode::Symlink),
            _ => Err(PlacementError::UnknownMode {
                mode: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for PlacementMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placement settings
#[derive(Debug, Clone)]
pub struct PlacementConfig {
    /// Output folder
    pub out_dir: PathBuf,
    /// Raw root, used to compute relative subdirectories
    pub raw_root: PathBuf,
    pub mode: PlacementMode,
    /// Recreate the raw file's directory (relative to `raw_root`) under `out_dir`
    pub preserve_raw_subdirs: bool,
    /// Compute destinations without touching the filesystem
    pub dry_run: bool,
}

/// What happened to one outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Destination, set for every matched outcome that was (or in a dry
    /// run, would have been) placed
    pub copied_to: Option<PathBuf>,
    /// Failure message when placing failed
    pub error: Option<String>,
}

/// Totals over a placement pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementSummary {
    pub placed: usize,
    pub failed: usize,
    pub dry_run: bool,
}

/// Places matched raw files, remembering names it has handed out.
pub struct Placer {
    config: PlacementConfig,
    reserved: HashSet<PathBuf>,
}

impl Placer {
    pub fn new(mut config: PlacementConfig) -> Self {
        // Matched paths are canonical, so the root must be too.
        if let Ok(canonical) = fs::canonicalize(&config.raw_root) {
            config.raw_root = canonical;
        }
        Self {
            config,
            reserved: HashSet::new(),
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Pick and reserve a destination for `raw_path`
    pub fn destination_for(&mut self, raw_path: &Path) -> PathBuf {
        let (dir, name) = if self.config.preserve_raw_subdirs {
            let relative = relative_under(&self.config.raw_root, raw_path);
            let dir = match relative.parent() {
                Some(parent) => self.config.out_dir.join(parent),
                None => self.config.out_dir.clone(),
            };
            (dir, relative.file_name().map(PathBuf::from).unwrap_or_default())
        } else {
            (
                self.config.out_dir.clone(),
                raw_path.file_name().map(PathBuf::from).unwrap_or_default(),
            )
        };

        let destination = unique_destination(&dir, &name, &self.reserved);
        self.reserved.insert(destination.clone());
        destination
    }

    /// Place the raw file of a matched outcome. Unmatched outcomes are
    /// left alone.
    pub fn place_outcome(&mut self, outcome: &MatchOutcome) -> PlacementRecord {
        let Some(source) = outcome.placement_source() else {
            return PlacementRecord::default();
        };

        let destination = self.destination_for(source);
        if self.config.dry_run {
            tracing::debug!("dry run: {} -> {}", source.display(), destination.display());
            return PlacementRecord {
                copied_to: Some(destination),
                error: None,
            };
        }

        match place(source, &destination, self.config.mode) {
            Ok(()) => {
                tracing::debug!(
                    "{} {} -> {}",
                    self.config.mode,
                    source.display(),
                    destination.display()
                );
                PlacementRecord {
                    copied_to: Some(destination),
                    error: None,
                }
            }
            Err(e) => {
                tracing::warn!("{}", e);
                PlacementRecord {
                    copied_to: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Place every outcome, one record per outcome in the same order
    pub fn place_all(
        &mut self,
        outcomes: &[MatchOutcome],
    ) -> (Vec<PlacementRecord>, PlacementSummary) {
        let records: Vec<PlacementRecord> =
            outcomes.iter().map(|o| self.place_outcome(o)).collect();

        let summary = PlacementSummary {
            placed: records.iter().filter(|r| r.copied_to.is_some()).count(),
            failed: records.iter().filter(|r| r.error.is_some()).count(),
            dry_run: self.config.dry_run,
        };
        (records, summary)
    }
}

/// A path in `dir` named `name` that neither exists nor is in `reserved`.
///
/// `photo.jpg` becomes `photo__2.jpg`, `photo__3.jpg`, ... as needed.
pub fn unique_destination(dir: &Path, name: &Path, reserved: &HashSet<PathBuf>) -> PathBuf {
    let taken =
        |candidate: &Path| candidate.symlink_metadata().is_ok() || reserved.contains(candidate);

    let first = dir.join(name);
    if !taken(&first) {
        return first;
    }

    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let suffix = name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    (2u64..)
        .map(|n| dir.join(format!("{stem}__{n}{suffix}")))
        .find(|candidate| !taken(candidate))
        .unwrap_or(first)
}

/// `path` relative to `root`, or just the file name when it is not under it
pub fn relative_under(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => path.file_name().map(PathBuf::from).unwrap_or_default(),
    }
}

/// Copy or link `src` to `dst`, creating missing parent directories.
pub fn place(src: &Path, dst: &Path, mode: PlacementMode) -> Result<(), PlacementError> {
    let io_error = |source: io::Error| PlacementError::Io {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }

    match mode {
        PlacementMode::Copy => fs::copy(src, dst).map(|_| ()),
        PlacementMode::Hardlink => fs::hard_link(src, dst),
        PlacementMode::Symlink => symlink_file(src, dst),
    }
    .map_err(io_error)
}

#[cfg(unix)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink_file(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(src, dst)
}
