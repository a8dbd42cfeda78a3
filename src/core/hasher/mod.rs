//! # Hasher Module
//!
//! Computes the 64-bit perceptual fingerprint of an image.
//!
//! ## How It Works
//! 1. Decode the file (zune-jpeg for JPEG, image crate otherwise)
//! 2. Convert to luminance and resample to 9x8 (bilinear)
//! 3. Compare each pixel with its right neighbour
//! 4. Pack the 64 comparisons into a [`Fingerprint`]
//!
//! Fingerprints are compared with Hamming distance only.
//!
//! ## Example
//! ```rust,ignore
//! use snapmatch::core::hasher::{DifferenceHasher, Fingerprinter};
//!
//! let fingerprint = DifferenceHasher.fingerprint_file(&path)?;
//! ```

mod algorithms;
pub mod fast_decode;
pub mod fast_resize;
pub mod mmap_decode;
mod traits;

pub use algorithms::DifferenceHasher;
pub use traits::{Fingerprint, FingerprintedFile, Fingerprinter, PerceptualHash};

/// Hamming distance between two fingerprints, in `0..=64`.
pub fn hamming_distance(a: Fingerprint, b: Fingerprint) -> u32 {
    a.distance(&b)
}
