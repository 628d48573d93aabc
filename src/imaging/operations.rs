//! High-level image operations.
//!
//! These functions combine format decisions with backend execution. The
//! encode step lives here: it maps a detected [`ImageFormat`] onto an
//! [`OutputFormat`], builds [`EncodeParams`], and turns backend failures into
//! [`CompressError`]s.

use super::backend::{BackendError, CodecBackend};
use super::bitmap::Bitmap;
use super::calculations::InvalidDimensions;
use super::format::{ImageFormat, OutputFormat};
use super::params::{EncodeParams, Quality};
use super::resize::{ResizeFailed, ResizeFailure};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error(transparent)]
    InvalidDimensions(#[from] InvalidDimensions),
    #[error("resize failed: {0}")]
    ResizeFailed(ResizeFailure),
    #[error("no {0} encoder available")]
    UnsupportedFormat(OutputFormat),
    #[error("encode failed: {0}")]
    EncodeFailed(String),
}

impl From<ResizeFailed> for CompressError {
    fn from(failed: ResizeFailed) -> Self {
        CompressError::ResizeFailed(failed.reason)
    }
}

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, CompressError>;

/// Encode a bitmap in the family of `format` at `quality`.
///
/// | Detected | Written as | Quality |
/// |---|---|---|
/// | JPEG | JPEG | used |
/// | HEIF | HEIF | used; no fallback when the backend cannot encode HEIF |
/// | PNG | PNG | ignored |
/// | Unknown | JPEG | used |
pub fn encode(
    backend: &impl CodecBackend,
    bitmap: &Bitmap,
    format: ImageFormat,
    quality: Quality,
) -> Result<Vec<u8>> {
    let target = format.output_format();

    if !bitmap.has_pixels() {
        return Err(CompressError::EncodeFailed(
            "bitmap has no pixels".to_string(),
        ));
    }
    if target == OutputFormat::Heif && !backend.capabilities().heif_encode {
        return Err(CompressError::UnsupportedFormat(target));
    }

    let params = EncodeParams::new(target, quality);
    let bytes = backend.encode(bitmap, &params).map_err(|e| match e {
        BackendError::Unsupported(format) => CompressError::UnsupportedFormat(format),
        other => CompressError::EncodeFailed(other.to_string()),
    })?;

    if bytes.is_empty() {
        return Err(CompressError::EncodeFailed(
            "encoder produced no bytes".to_string(),
        ));
    }

    tracing::debug!(
        format = %target,
        quality = ?params.quality.map(Quality::value),
        bytes = bytes.len(),
        "encoded"
    );
    Ok(bytes)
}
