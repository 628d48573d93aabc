//! Codec backend trait and shared types.
//!
//! The [`CodecBackend`] trait is the boundary to the platform codec: decode
//! bytes into a bitmap, encode a bitmap into bytes, and read the metadata the
//! orientation corrector needs. Everything else (ratio math, resampling,
//! rotation, format dispatch) is pure Rust in this crate and does not go
//! through the backend.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend). Tests substitute the
//! recording `MockBackend` defined below.

use super::bitmap::Bitmap;
use super::format::OutputFormat;
use super::orientation::Orientation;
use super::params::EncodeParams;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("No {0} encoder available")]
    Unsupported(OutputFormat),
}

/// What a backend can do beyond the JPEG/PNG baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCapabilities {
    /// A HEIF encoder is available.
    pub heif_encode: bool,
    /// Maker-note dictionaries can be read, enabling the richer Live Photo check.
    pub maker_metadata: bool,
}

impl BackendCapabilities {
    pub fn all() -> Self {
        Self {
            heif_encode: true,
            maker_metadata: true,
        }
    }
}

/// Orientation-related metadata read from original encoded bytes.
///
/// Field mapping:
/// - `orientation`: EXIF/TIFF Orientation (`0x0112`), `None` when absent or out of range
/// - `apple_maker_tags`: tag ids found in an Apple maker note (`17`/`18` mark Live Photos)
/// - `heif_live_photo`: container-level Live Photo flag, for backends able to read it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrientationMetadata {
    pub orientation: Option<Orientation>,
    pub apple_maker_tags: Vec<u16>,
    pub heif_live_photo: Option<bool>,
}

/// Trait for codec backends.
///
/// Decoding and encoding are fallible; metadata reading is best-effort and
/// returns [`OrientationMetadata::default`] when nothing can be read.
pub trait CodecBackend: Sync {
    fn capabilities(&self) -> BackendCapabilities;

    /// Decode encoded bytes. The embedded orientation is recorded on the
    /// bitmap but not applied to the pixels.
    fn decode(&self, bytes: &[u8]) -> Result<Bitmap, BackendError>;

    /// Encode a bitmap with the given format and quality.
    fn encode(&self, bitmap: &Bitmap, params: &EncodeParams) -> Result<Vec<u8>, BackendError>;

    /// Read orientation and Live Photo markers from encoded bytes.
    fn read_metadata(&self, bytes: &[u8]) -> OrientationMetadata;
}
