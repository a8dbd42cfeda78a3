//! Extension and hidden-file filtering for the scanner.

use std::collections::HashSet;
use std::path::Path;

/// Extensions recognized by default, lowercase and without the dot
pub const DEFAULT_EXTENSIONS: &[&str] =
    &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "jfif"];

/// Decides which directory entries are candidate images
#[derive(Debug, Clone)]
pub struct ImageFilter {
    /// Lowercase extensions without the leading dot
    extensions: HashSet<String>,
    /// Whether to include hidden files
    include_hidden: bool,
}

impl ImageFilter {
    /// Create a filter with the default extensions
    pub fn new() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
        }
    }

    /// Include hidden files (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Replace the accepted extensions. Leading dots and case are ignored,
    /// so `".JPG"` and `"jpg"` are the same extension.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        self
    }

    /// Whether a name is hidden and hidden entries are excluded
    pub fn is_excluded_hidden(&self, path: &Path) -> bool {
        !self.include_hidden
            && path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with('.'))
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if self.is_excluded_hidden(path) {
            return false;
        }

        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }
}

impl Default for ImageFilter {
    fn default() -> Self {
        Self::new()
    }
}
