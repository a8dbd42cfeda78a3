//! Image decoding with a fast path for JPEG.
//!
//! JPEG data goes through zune-jpeg (1.5-2x faster than the image crate);
//! everything else, and any JPEG zune-jpeg rejects, goes through the
//! image crate's format sniffing.

use super::mmap_decode::read_file_bytes;
use crate::error::HashError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::{Path, PathBuf};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Decoder that picks the fastest backend from the file's magic bytes.
///
/// The extension is not trusted: a `.png` that is really a JPEG still
/// decodes.
pub struct FastDecoder;

impl FastDecoder {
    /// Read and decode an image file.
    pub fn decode(path: &Path) -> Result<DynamicImage, HashError> {
        let bytes = read_file_bytes(path)?;
        Self::decode_bytes(&bytes).map_err(|e| e.with_path(path.to_path_buf()))
    }

    /// Decode an in-memory encoded image.
    ///
    /// Errors carry an empty path; [`FastDecoder::decode`] fills it in.
    pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage, HashError> {
        if bytes.is_empty() {
            return Err(HashError::EmptyImage {
                path: PathBuf::new(),
            });
        }

        if bytes.starts_with(&JPEG_MAGIC) {
            if let Some(image) = Self::decode_jpeg(bytes) {
                return Ok(image);
            }
        }

        image::load_from_memory(bytes).map_err(|e| HashError::DecodeError {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// zune-jpeg decode. `None` means "let the image crate try".
    fn decode_jpeg(bytes: &[u8]) -> Option<DynamicImage> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = match decoder.decode() {
            Ok(pixels) => pixels,
            Err(e) => {
                tracing::trace!("zune-jpeg rejected image, falling back: {:?}", e);
                return None;
            }
        };

        let info = decoder.info()?;
        let width = info.width as u32;
        let height = info.height as u32;

        match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgb8),
            ColorSpace::RGBA => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageRgba8),
            ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                .map(DynamicImage::ImageLuma8),
            _ => None,
        }
    }
}
