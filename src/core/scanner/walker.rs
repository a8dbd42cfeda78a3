//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, FileIdentity, PhotoFile, PhotoScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Recursive scanner built on walkdir.
///
/// Entries are visited in file-name order, so two scans of an unchanged
/// tree yield the same sequence.
pub struct WalkDirScanner {
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { filter }
    }

    /// Lazily enumerate candidate files under `root`.
    ///
    /// The iterator can be recreated at any time to restart the walk.
    pub fn files<'a>(
        &'a self,
        root: &Path,
    ) -> impl Iterator<Item = Result<PhotoFile, ScanError>> + 'a {
        WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| {
                // Never prune the root itself, even if it is a dot-directory.
                entry.depth() == 0 || !self.filter.is_excluded_hidden(entry.path())
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.file_type().is_dir() || !self.filter.should_include(entry.path()) {
                        return None;
                    }
                    Some(self.describe(entry.path()))
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = if e.io_error().map(|io| io.kind())
                        == Some(io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::ReadDirectory {
                            path,
                            source: io::Error::other(e.to_string()),
                        }
                    };
                    Some(Err(error))
                }
            })
    }

    /// Canonicalize a candidate and capture its identity
    fn describe(&self, path: &Path) -> Result<PhotoFile, ScanError> {
        let read_error = |source| ScanError::ReadDirectory {
            path: path.to_path_buf(),
            source,
        };

        let canonical = fs::canonicalize(path).map_err(read_error)?;
        let metadata = fs::metadata(&canonical).map_err(read_error)?;

        Ok(PhotoFile {
            path: canonical,
            identity: FileIdentity::from_metadata(&metadata),
        })
    }

    fn check_root(root: &Path) -> Result<(), ScanError> {
        if root.is_dir() {
            Ok(())
        } else {
            Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            })
        }
    }
}

impl PhotoScanner for WalkDirScanner {
    fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        Self::check_root(root)?;

        let mut photos = Vec::new();
        let mut errors = Vec::new();

        for item in self.files(root) {
            match item {
                Ok(photo) => photos.push(photo),
                Err(error) => {
                    let path = match &error {
                        ScanError::DirectoryNotFound { path }
                        | ScanError::PermissionDenied { path }
                        | ScanError::ReadDirectory { path, .. } => path.clone(),
                    };
                    tracing::debug!("skipping unreadable entry {}: {}", path.display(), error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        Ok(ScanResult { photos, errors })
    }
}
