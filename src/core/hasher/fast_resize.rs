//! Luminance conversion and SIMD-accelerated resampling.
//!
//! Uses fast_image_resize, which picks AVX2/NEON kernels at runtime.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, Luma};
use std::path::PathBuf;

/// Luminance with ITU-R 601-2 weights in Pillow's fixed-point form, so a
/// fingerprint equals one computed by Pillow-based dHash tools for the
/// same pixels. Grayscale sources are used as-is. Alpha is ignored.
pub fn to_luma_601(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_) => image.to_luma8(),
        _ => {
            let rgb = image.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                Luma([luma_601(r, g, b)])
            })
        }
    }
}

/// `(19595 R + 38470 G + 7471 B + 0x8000) >> 16`
fn luma_601(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 19595 * u32::from(r) + 38470 * u32::from(g) + 7471 * u32::from(b);
    ((weighted + 0x8000) >> 16) as u8
}

/// Convert to single-channel luminance, then resample to
/// `width` x `height` with a bilinear filter.
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    let gray = to_luma_601(image);
    let (src_width, src_height) = gray.dimensions();

    if src_width == 0 || src_height == 0 {
        return Err(HashError::EmptyImage {
            path: PathBuf::new(),
        });
    }

    if width == 0 || height == 0 {
        return Err(resize_failed("invalid destination dimensions"));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
        .map_err(|e| resize_failed(format!("failed to create source image: {}", e)))?;

    let mut dst_image = Image::new(width, height, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

    Resizer::new()
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| resize_failed(e.to_string()))?;

    GrayImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| resize_failed("failed to create result buffer"))
}

fn resize_failed(reason: impl Into<String>) -> HashError {
    HashError::ResizeFailed {
        path: PathBuf::new(),
        reason: reason.into(),
    }
}
