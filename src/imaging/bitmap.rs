//! Owned decoded raster passed between pipeline stages.

use super::orientation::Orientation;
use image::DynamicImage;

/// A decoded image plus what the decoder knows about its pixel orientation.
///
/// Each stage takes a `Bitmap` by value and returns a new one, so there is
/// never more than one owner of the pixels.
///
/// `orientation` describes how the stored pixels relate to upright:
/// - `None`: the decoder did not say (typical for host-supplied rasters)
/// - `Some(Up)`: pixels are known to be upright
/// - `Some(o)`: pixels are stored as `o` and still need correcting
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    image: DynamicImage,
    orientation: Option<Orientation>,
}

impl Bitmap {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            orientation: None,
        }
    }

    /// A bitmap with no addressable pixels, as left behind by a failed decode.
    pub fn empty() -> Self {
        Self::new(DynamicImage::new_rgb8(0, 0))
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    pub fn orientation(&self) -> Option<Orientation> {
        self.orientation
    }

    /// True when the stored pixels are already known to be upright.
    pub fn is_known_upright(&self) -> bool {
        self.orientation == Some(Orientation::Up)
    }

    /// False for zero-sized rasters.
    pub fn has_pixels(&self) -> bool {
        self.image.width() > 0 && self.image.height() > 0
    }

    pub fn bytes_per_pixel(&self) -> u8 {
        self.image.color().bytes_per_pixel()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Replace the pixels, keeping the recorded orientation.
    pub(crate) fn map_pixels(self, f: impl FnOnce(DynamicImage) -> DynamicImage) -> Self {
        Self {
            image: f(self.image),
            orientation: self.orientation,
        }
    }
}

impl From<DynamicImage> for Bitmap {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}
