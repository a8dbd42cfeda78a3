//! Fingerprint value type and the fingerprinting trait.

use super::fast_decode::FastDecoder;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A computed perceptual hash that can be compared
pub trait PerceptualHash: Clone + Send + Sync {
    /// Hamming distance: the number of bits that differ.
    fn distance(&self, other: &Self) -> u32;
}

/// 64-bit difference-hash fingerprint.
///
/// Bits are packed row-major, most significant bit first: bit 63 is the
/// comparison of columns 0 and 1 on row 0, bit 0 the comparison of columns
/// 7 and 8 on row 7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Number of bits in a fingerprint
    pub const BITS: u32 = u64::BITS;

    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// The raw 64-bit value
    pub const fn bits(self) -> u64 {
        self.0
    }
}

impl PerceptualHash for Fingerprint {
    fn distance(&self, other: &Self) -> u32 {
        (self.0 ^ other.0).count_ones()
    }
}

impl From<u64> for Fingerprint {
    fn from(bits: u64) -> Self {
        Self(bits)
    }
}

impl From<Fingerprint> for u64 {
    fn from(fingerprint: Fingerprint) -> Self {
        fingerprint.0
    }
}

/// Decimal, matching the cache file representation.
impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Fingerprint {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

/// A file path together with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FingerprintedFile {
    pub path: PathBuf,
    pub fingerprint: Fingerprint,
}

impl FingerprintedFile {
    pub fn new(path: impl Into<PathBuf>, fingerprint: Fingerprint) -> Self {
        Self {
            path: path.into(),
            fingerprint,
        }
    }
}

/// Computes fingerprints from decoded pixels.
///
/// Implementations must be pure functions of pixel content so that a
/// fingerprint can be cached and reused across runs.
pub trait Fingerprinter: Send + Sync {
    /// Fingerprint an already-decoded image
    fn fingerprint_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError>;

    /// Decode an encoded image held in memory, then fingerprint it
    fn fingerprint_bytes(&self, bytes: &[u8]) -> Result<Fingerprint, HashError> {
        let image = FastDecoder::decode_bytes(bytes)?;
        self.fingerprint_image(&image)
    }

    /// Read, decode and fingerprint a file
    fn fingerprint_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let image = FastDecoder::decode(path)?;
        self.fingerprint_image(&image)
            .map_err(|e| e.with_path(path.to_path_buf()))
    }

    /// Short algorithm name for logs and reports
    fn name(&self) -> &'static str;
}
