//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` at quality 1–100 |
//! | Encode → PNG | `image::codecs::png::PngEncoder`, best compression |
//! | Encode → HEIF | unavailable, reports [`BackendError::Unsupported`] |
//! | Orientation / maker note | `kamadak-exif` + [`exif_reader`](super::exif_reader) |
//!
//! HEIF decoding is not compiled in either, so HEIF input only reaches the
//! pipeline as a bitmap decoded elsewhere plus its original bytes.

use super::backend::{BackendCapabilities, BackendError, CodecBackend, OrientationMetadata};
use super::bitmap::Bitmap;
use super::exif_reader::read_orientation_metadata;
use super::format::OutputFormat;
use super::params::EncodeParams;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::{DynamicImage, ImageEncoder};

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone, Copy)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// JPEG has no alpha channel, so anything else is flattened to RGB8 first.
fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(out)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
    encoder
        .write_image(
            image.as_bytes(),
            image.width(),
            image.height(),
            image.color().into(),
        )
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e)))?;
    Ok(out)
}

impl CodecBackend for RustBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities {
            heif_encode: false,
            maker_metadata: true,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
        let image = image::load_from_memory(bytes)
            .map_err(|e| BackendError::ProcessingFailed(format!("Failed to decode: {}", e)))?;

        let bitmap = Bitmap::new(image);
        Ok(match read_orientation_metadata(bytes).orientation {
            Some(orientation) => bitmap.with_orientation(orientation),
            None => bitmap,
        })
    }

    fn encode(&self, bitmap: &Bitmap, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Jpeg => {
                let quality = params.quality.unwrap_or_default().percent();
                encode_jpeg(bitmap.image(), quality)
            }
            OutputFormat::Png => encode_png(bitmap.image()),
            OutputFormat::Heif => Err(BackendError::Unsupported(OutputFormat::Heif)),
        }
    }

    fn read_metadata(&self, bytes: &[u8]) -> OrientationMetadata {
        read_orientation_metadata(bytes)
    }
}
