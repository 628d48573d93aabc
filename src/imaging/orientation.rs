//! Orientation correction for HEIF Live Photos.
//!
//! Live Photos can carry pixels whose stored layout disagrees with what the
//! host believes is upright. When the original bytes identify such an image,
//! the corrector reads the EXIF orientation and rotates/mirrors the pixels
//! back to upright. In every other case it is the identity and never fails.
//!
//! ## Orientation codes
//!
//! | Code | Name | Stored → upright |
//! |---|---|---|
//! | 1 | `Up` | none |
//! | 2 | `UpMirrored` | mirror |
//! | 3 | `Down` | rotate 180° |
//! | 4 | `DownMirrored` | mirror, rotate 180° |
//! | 5 | `LeftMirrored` | mirror, rotate 90° counter-clockwise |
//! | 6 | `Right` | rotate 90° clockwise |
//! | 7 | `RightMirrored` | mirror, rotate 90° clockwise |
//! | 8 | `Left` | rotate 90° counter-clockwise |
//!
//! Mirroring is applied to the stored pixels before the rotation shared with
//! the unmirrored sibling. Codes 5–8 swap width and height.
//!
//! ## Live Photo detection
//!
//! Two schemas exist and both are kept:
//! - [`LivePhotoSchema::MakerMetadata`]: Apple maker-note tag 17 or 18, else a
//!   container-level Live Photo flag.
//! - [`LivePhotoSchema::OrientationTag`]: any orientation other than `Up`.
//!   Older metadata readers only offer this; it also flags plain rotated
//!   HEIF stills.

use super::backend::{BackendCapabilities, CodecBackend, OrientationMetadata};
use super::bitmap::Bitmap;
use super::format::ImageFormat;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Apple maker-note tags that only Live Photo captures carry.
const APPLE_LIVE_PHOTO_TAGS: [u16; 2] = [17, 18];

/// One of the 8 EXIF orientation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    LeftMirrored,
    Right,
    RightMirrored,
    Left,
}

impl Orientation {
    pub const ALL: [Orientation; 8] = [
        Orientation::Up,
        Orientation::UpMirrored,
        Orientation::Down,
        Orientation::DownMirrored,
        Orientation::LeftMirrored,
        Orientation::Right,
        Orientation::RightMirrored,
        Orientation::Left,
    ];

    /// Map an EXIF orientation value (1–8).
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 => Some(Orientation::Up),
            2 => Some(Orientation::UpMirrored),
            3 => Some(Orientation::Down),
            4 => Some(Orientation::DownMirrored),
            5 => Some(Orientation::LeftMirrored),
            6 => Some(Orientation::Right),
            7 => Some(Orientation::RightMirrored),
            8 => Some(Orientation::Left),
            _ => None,
        }
    }

    pub fn exif_value(self) -> u16 {
        match self {
            Orientation::Up => 1,
            Orientation::UpMirrored => 2,
            Orientation::Down => 3,
            Orientation::DownMirrored => 4,
            Orientation::LeftMirrored => 5,
            Orientation::Right => 6,
            Orientation::RightMirrored => 7,
            Orientation::Left => 8,
        }
    }

    pub fn is_mirrored(self) -> bool {
        matches!(
            self,
            Orientation::UpMirrored
                | Orientation::DownMirrored
                | Orientation::LeftMirrored
                | Orientation::RightMirrored
        )
    }

    /// True for the left/right families, whose upright form swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Left
                | Orientation::LeftMirrored
                | Orientation::Right
                | Orientation::RightMirrored
        )
    }

    /// Transform pixels stored in this orientation into upright pixels.
    pub fn to_upright(self, image: DynamicImage) -> DynamicImage {
        let image = if self.is_mirrored() {
            image.fliph()
        } else {
            image
        };
        match self {
            Orientation::Up | Orientation::UpMirrored => image,
            Orientation::Down | Orientation::DownMirrored => image.rotate180(),
            Orientation::Left | Orientation::LeftMirrored => image.rotate270(),
            Orientation::Right | Orientation::RightMirrored => image.rotate90(),
        }
    }
}

/// Which Live Photo check to run, as configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LivePhotoDetection {
    /// Maker metadata when the backend can read it, otherwise the orientation tag.
    #[default]
    Auto,
    MakerMetadata,
    OrientationTag,
}

/// A concrete Live Photo check, after resolving [`LivePhotoDetection::Auto`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivePhotoSchema {
    MakerMetadata,
    OrientationTag,
}

impl LivePhotoDetection {
    pub fn resolve(self, capabilities: BackendCapabilities) -> LivePhotoSchema {
        match self {
            LivePhotoDetection::Auto if capabilities.maker_metadata => {
                LivePhotoSchema::MakerMetadata
            }
            LivePhotoDetection::Auto => LivePhotoSchema::OrientationTag,
            LivePhotoDetection::MakerMetadata => LivePhotoSchema::MakerMetadata,
            LivePhotoDetection::OrientationTag => LivePhotoSchema::OrientationTag,
        }
    }
}

/// Whether the metadata marks a Live Photo under `schema`.
pub fn is_live_photo(metadata: &OrientationMetadata, schema: LivePhotoSchema) -> bool {
    match schema {
        LivePhotoSchema::MakerMetadata => {
            metadata
                .apple_maker_tags
                .iter()
                .any(|tag| APPLE_LIVE_PHOTO_TAGS.contains(tag))
                || metadata.heif_live_photo == Some(true)
        }
        LivePhotoSchema::OrientationTag => metadata
            .orientation
            .is_some_and(|o| o != Orientation::Up),
    }
}

/// The orientation to undo for these original bytes, if any.
///
/// `None` unless the bytes are HEIF, carry Live Photo indicators, and record
/// an orientation other than `Up`.
pub fn needs_correction(
    backend: &impl CodecBackend,
    original: Option<&[u8]>,
    detection: LivePhotoDetection,
) -> Option<Orientation> {
    let bytes = original?;
    if !ImageFormat::detect(bytes).is_heif() {
        return None;
    }

    let metadata = backend.read_metadata(bytes);
    let schema = detection.resolve(backend.capabilities());
    if !is_live_photo(&metadata, schema) {
        return None;
    }

    metadata.orientation.filter(|&o| o != Orientation::Up)
}

/// Rotate/mirror a bitmap stored as `orientation` into upright pixels.
pub fn apply_orientation(bitmap: Bitmap, orientation: Orientation) -> Bitmap {
    bitmap
        .map_pixels(|image| orientation.to_upright(image))
        .with_orientation(Orientation::Up)
}

/// Correct a bitmap using the original bytes' metadata.
///
/// Returns the (possibly new) bitmap and the orientation that was undone.
/// Bitmaps without pixels, or already known to be upright, pass through
/// untouched.
pub fn correct_orientation(
    backend: &impl CodecBackend,
    bitmap: Bitmap,
    original: Option<&[u8]>,
    detection: LivePhotoDetection,
) -> (Bitmap, Option<Orientation>) {
    if !bitmap.has_pixels() || bitmap.is_known_upright() {
        return (bitmap, None);
    }

    match needs_correction(backend, original, detection) {
        Some(orientation) => {
            tracing::debug!(?orientation, "correcting Live Photo orientation");
            (apply_orientation(bitmap, orientation), Some(orientation))
        }
        None => (bitmap, None),
    }
}
