//! Memory-mapped reads for large image files.
//!
//! Files of 1MB and more are mapped instead of copied into a heap buffer,
//! which saves a kernel-to-user copy on every multi-megabyte raw photo.

use crate::error::HashError;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Minimum file size to use memory-mapped I/O (1MB)
const MMAP_THRESHOLD: u64 = 1024 * 1024;

/// Read a file's bytes, mapping it when it is large enough.
pub fn read_file_bytes(path: &Path) -> Result<FileBytes, HashError> {
    let io_error = |source| HashError::IoError {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let len = file.metadata().map_err(io_error)?.len();

    if len >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and owns its file handle for its
        // whole lifetime. A file truncated underneath us is an accepted risk
        // of mapping; decoding such a file fails like any corrupt image.
        let mmap = unsafe { Mmap::map(&file) }.map_err(io_error)?;
        Ok(FileBytes::Mmap(mmap))
    } else {
        let bytes = std::fs::read(path).map_err(io_error)?;
        Ok(FileBytes::Vec(bytes))
    }
}

/// File bytes that may be either owned or memory-mapped.
pub enum FileBytes {
    /// Heap-allocated bytes for small files
    Vec(Vec<u8>),
    /// Memory-mapped bytes
    Mmap(Mmap),
}

impl AsRef<[u8]> for FileBytes {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileBytes::Vec(v) => v,
            FileBytes::Mmap(m) => m,
        }
    }
}

impl std::ops::Deref for FileBytes {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}
