//! Downscaling by Luban ratio or to an exact box.
//!
//! Resampling is always Lanczos3. A failed resize hands the untouched input
//! back inside [`ResizeFailed`], so callers can carry on with the original
//! pixels instead of losing them.

use super::bitmap::Bitmap;
use super::calculations::{luban_ratio, raster_bytes, scaled_dimensions};
use image::imageops::FilterType;
use std::fmt;
use thiserror::Error;

/// Largest target raster we are willing to allocate (2 GiB).
const MAX_RASTER_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Why a resize was refused.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeFailure {
    #[error("source bitmap has no pixels")]
    EmptySource,
    #[error("resize ratio must be at least 1")]
    ZeroRatio,
    #[error("target size must be positive")]
    ZeroTarget,
    #[error("target {width}x{height} is too large to allocate")]
    TooLarge { width: u32, height: u32 },
}

/// A refused resize, carrying the input bitmap unchanged.
#[derive(Error)]
#[error("resize failed: {reason}")]
pub struct ResizeFailed {
    bitmap: Bitmap,
    pub reason: ResizeFailure,
}

impl ResizeFailed {
    fn new(bitmap: Bitmap, reason: ResizeFailure) -> Self {
        Self { bitmap, reason }
    }

    /// Take back the untouched input.
    pub fn into_bitmap(self) -> Bitmap {
        self.bitmap
    }
}

// Manual impl: the derived one would dump every pixel.
impl fmt::Debug for ResizeFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeFailed")
            .field("dimensions", &self.bitmap.dimensions())
            .field("reason", &self.reason)
            .finish()
    }
}

/// Divide both sides by `ratio` (never below 1px).
pub fn resize(bitmap: Bitmap, ratio: u32) -> Result<Bitmap, ResizeFailed> {
    if !bitmap.has_pixels() {
        return Err(ResizeFailed::new(bitmap, ResizeFailure::EmptySource));
    }
    if ratio == 0 {
        return Err(ResizeFailed::new(bitmap, ResizeFailure::ZeroRatio));
    }

    let (width, height) = scaled_dimensions(bitmap.dimensions(), ratio);
    resize_to(bitmap, width, height)
}

/// Resample to exactly `width` x `height`.
///
/// A target equal to the current size returns the input without resampling.
pub fn resize_to(bitmap: Bitmap, width: u32, height: u32) -> Result<Bitmap, ResizeFailed> {
    if !bitmap.has_pixels() {
        return Err(ResizeFailed::new(bitmap, ResizeFailure::EmptySource));
    }
    if width == 0 || height == 0 {
        return Err(ResizeFailed::new(bitmap, ResizeFailure::ZeroTarget));
    }
    if bitmap.dimensions() == (width, height) {
        return Ok(bitmap);
    }

    let fits = raster_bytes((width, height), bitmap.bytes_per_pixel())
        .is_some_and(|bytes| bytes <= MAX_RASTER_BYTES);
    if !fits {
        return Err(ResizeFailed::new(
            bitmap,
            ResizeFailure::TooLarge { width, height },
        ));
    }

    tracing::debug!(
        from = ?bitmap.dimensions(),
        to = ?(width, height),
        "resampling with Lanczos3"
    );
    Ok(bitmap.map_pixels(|image| image.resize_exact(width, height, FilterType::Lanczos3)))
}

/// Downscale by the Luban ratio of the bitmap's own size.
///
/// Never fails: anything that cannot be resized comes back as it went in.
pub fn resize_in_luban(bitmap: Bitmap) -> Bitmap {
    let (width, height) = bitmap.dimensions();
    let Ok(ratio) = luban_ratio(width, height) else {
        return bitmap;
    };

    resize(bitmap, ratio).unwrap_or_else(|failed| {
        tracing::warn!(reason = %failed.reason, "Luban resize skipped");
        failed.into_bitmap()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::orientation::Orientation;
    use image::DynamicImage;

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::new(DynamicImage::new_rgb8(width, height))
    }

    #[test]
    fn resize_divides_both_sides() {
        let resized = resize(bitmap(100, 80), 2).unwrap();
        assert_eq!(resized.dimensions(), (50, 40));
    }

    #[test]
    fn resize_floors_and_clamps_to_one() {
        assert_eq!(resize(bitmap(9, 5), 2).unwrap().dimensions(), (4, 2));
        assert_eq!(resize(bitmap(3, 40), 8).unwrap().dimensions(), (1, 5));
    }

    #[test]
    fn ratio_one_returns_input() {
        let input = Bitmap::new(crate::test_helpers::synthetic_image(20, 10));
        let output = resize(input.clone(), 1).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn zero_ratio_hands_input_back() {
        let input = bitmap(10, 10).with_orientation(Orientation::Down);
        let failed = resize(input.clone(), 0).unwrap_err();
        assert_eq!(failed.reason, ResizeFailure::ZeroRatio);
        assert_eq!(failed.into_bitmap(), input);
    }

    #[test]
    fn empty_source_fails() {
        let failed = resize(Bitmap::empty(), 2).unwrap_err();
        assert_eq!(failed.reason, ResizeFailure::EmptySource);
        assert!(!failed.into_bitmap().has_pixels());
    }

    #[test]
    fn resize_to_exact_box() {
        let resized = resize_to(bitmap(100, 80), 30, 70).unwrap();
        assert_eq!(resized.dimensions(), (30, 70));
    }

    #[test]
    fn resize_to_zero_target_fails() {
        let failed = resize_to(bitmap(10, 10), 0, 5).unwrap_err();
        assert_eq!(failed.reason, ResizeFailure::ZeroTarget);
        assert_eq!(failed.into_bitmap().dimensions(), (10, 10));
    }

    #[test]
    fn resize_to_huge_target_fails() {
        let failed = resize_to(bitmap(2, 2), 100_000, 100_000).unwrap_err();
        assert_eq!(
            failed.reason,
            ResizeFailure::TooLarge {
                width: 100_000,
                height: 100_000
            }
        );

        let failed = resize_to(bitmap(2, 2), u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(failed.reason, ResizeFailure::TooLarge { .. }));
    }

    #[test]
    fn resize_keeps_orientation() {
        let resized = resize(bitmap(40, 20).with_orientation(Orientation::Left), 2).unwrap();
        assert_eq!(resized.orientation(), Some(Orientation::Left));
    }

    #[test]
    fn failure_debug_omits_pixels() {
        let failed = resize(bitmap(3, 3), 0).unwrap_err();
        let debug = format!("{failed:?}");
        assert!(debug.contains("(3, 3)"));
        assert!(debug.contains("ZeroRatio"));
    }

    #[test]
    fn luban_halves_wide_image() {
        // aspect 0.5 → ceil(2000 / 1280) = 2
        let resized = resize_in_luban(bitmap(2000, 1000));
        assert_eq!(resized.dimensions(), (1000, 500));
    }

    #[test]
    fn luban_keeps_small_image() {
        let resized = resize_in_luban(bitmap(640, 480));
        assert_eq!(resized.dimensions(), (640, 480));
    }

    #[test]
    fn luban_passes_empty_through() {
        assert!(!resize_in_luban(Bitmap::empty()).has_pixels());
    }
}
