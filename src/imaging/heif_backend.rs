//! HEIF-capable backend built on libheif (`heif` feature).
//!
//! HEIF/HEIC is decoded and encoded with [libheif-rs](https://docs.rs/libheif-rs);
//! every other format is handed to [`RustBackend`]. Needs `libheif` (with an
//! HEVC encoder such as x265) installed on the system.
//!
//! libheif applies the container's own rotation and mirroring while decoding,
//! so decoded HEIF bitmaps carry no recorded orientation. Live Photo
//! correction still reads the EXIF orientation from the original bytes.

use super::backend::{BackendCapabilities, BackendError, CodecBackend, OrientationMetadata};
use super::bitmap::Bitmap;
use super::exif_reader::read_orientation_metadata;
use super::format::{ImageFormat, OutputFormat};
use super::params::EncodeParams;
use super::rust_backend::RustBackend;
use image::{DynamicImage, RgbImage};
use libheif_rs::{
    Channel, ColorSpace, CompressionFormat, EncoderQuality, HeifContext, HeifError, Image,
    LibHeif, RgbChroma,
};

/// libheif for HEIF, the pure Rust backend for everything else.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeifBackend {
    fallback: RustBackend,
}

impl HeifBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

fn heif_error(e: HeifError) -> BackendError {
    BackendError::ProcessingFailed(format!("HEIF: {}", e))
}

fn decode_heif(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    let lib = LibHeif::new();
    let ctx = HeifContext::read_from_bytes(bytes).map_err(heif_error)?;
    let handle = ctx.primary_image_handle().map_err(heif_error)?;
    let image = lib
        .decode(&handle, ColorSpace::Rgb(RgbChroma::Rgb), None)
        .map_err(heif_error)?;

    let (width, height) = (image.width(), image.height());
    let planes = image.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| BackendError::ProcessingFailed("HEIF decode gave no RGB plane".into()))?;

    // Rows are padded to `stride`.
    let row = width as usize * 3;
    let mut rgb = Vec::with_capacity(row * height as usize);
    for y in 0..height as usize {
        let start = y * plane.stride;
        rgb.extend_from_slice(&plane.data[start..start + row]);
    }

    RgbImage::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| BackendError::ProcessingFailed("HEIF raster size mismatch".into()))
}

fn encode_heif(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut heif_image =
        Image::new(width, height, ColorSpace::Rgb(RgbChroma::Rgb)).map_err(heif_error)?;
    heif_image
        .create_plane(Channel::Interleaved, width, height, 8)
        .map_err(heif_error)?;
    {
        let planes = heif_image.planes_mut();
        let mut plane = planes.interleaved.ok_or_else(|| {
            BackendError::ProcessingFailed("HEIF image has no RGB plane".into())
        })?;
        let row = width as usize * 3;
        for (y, src) in rgb.as_raw().chunks_exact(row).enumerate() {
            let start = y * plane.stride;
            plane.data[start..start + row].copy_from_slice(src);
        }
    }

    let lib = LibHeif::new();
    let mut encoder = lib
        .encoder_for_format(CompressionFormat::Hevc)
        .map_err(heif_error)?;
    encoder
        .set_quality(EncoderQuality::Lossy(quality))
        .map_err(heif_error)?;
    let mut ctx = HeifContext::new().map_err(heif_error)?;
    ctx.encode_image(&heif_image, &mut encoder, None)
        .map_err(heif_error)?;
    ctx.write_to_bytes().map_err(heif_error)
}

impl CodecBackend for HeifBackend {
    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::all()
    }

    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError> {
        if ImageFormat::detect(bytes).is_heif() {
            decode_heif(bytes).map(Bitmap::new)
        } else {
            self.fallback.decode(bytes)
        }
    }

    fn encode(&self, bitmap: &Bitmap, params: &EncodeParams) -> Result<Vec<u8>, BackendError> {
        match params.format {
            OutputFormat::Heif => {
                let quality = params.quality.unwrap_or_default().percent();
                tracing::debug!(quality, "encoding HEIF with libheif");
                encode_heif(bitmap.image(), quality)
            }
            _ => self.fallback.encode(bitmap, params),
        }
    }

    fn read_metadata(&self, bytes: &[u8]) -> OrientationMetadata {
        read_orientation_metadata(bytes)
    }
}
