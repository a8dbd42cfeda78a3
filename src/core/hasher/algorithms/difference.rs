//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Converting the image to luminance (ITU-R 601-2, as Pillow does)
//! 2. Resampling to a 9x8 grid with a bilinear filter
//! 3. Comparing each pixel to the one on its right
//! 4. Setting the bit when the right pixel is strictly brighter
//!
//! The ninth column only exists to give each row eight comparisons.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{Fingerprint, Fingerprinter};
use crate::error::HashError;
use image::DynamicImage;

/// Comparisons per row and number of rows
const GRID: u32 = 8;

/// 64-bit difference hash
#[derive(Debug, Clone, Copy, Default)]
pub struct DifferenceHasher;

impl DifferenceHasher {
    pub fn new() -> Self {
        Self
    }
}

impl Fingerprinter for DifferenceHasher {
    fn fingerprint_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let gray = resize_to_grayscale(image, GRID + 1, GRID)?;

        let mut bits: u64 = 0;
        let mut mask: u64 = 1 << 63;

        for y in 0..GRID {
            for x in 0..GRID {
                let left = gray.get_pixel(x, y)[0];
                let right = gray.get_pixel(x + 1, y)[0];

                if right > left {
                    bits |= mask;
                }
                mask >>= 1;
            }
        }

        Ok(Fingerprint::new(bits))
    }

    fn name(&self) -> &'static str {
        "dHash"
    }
}
