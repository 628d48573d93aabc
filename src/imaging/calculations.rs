//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! The heart of the module is the Luban downscale heuristic: an integer
//! divisor picked from aspect-ratio and long-side bands. The band edges are
//! part of the contract and must not be tuned.

use thiserror::Error;

/// Lower bound (inclusive) of the near-square band: 9/16.
const NEAR_SQUARE_MIN_ASPECT: f64 = 0.5625;
/// Lower bound (exclusive) of the elongated band. An aspect of exactly 1:2
/// is already a panorama.
const ELONGATED_MIN_ASPECT: f64 = 0.5;

const KEEP_BELOW: u32 = 1664;
const HALVE_BELOW: u32 = 4990;
const QUARTER_BELOW: u32 = 10240;
/// Target long side the divisor aims for on large and panoramic images.
const BASE_LONG_SIDE: u32 = 1280;

/// A zero width or height was supplied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid dimensions {width}x{height}: both must be positive")]
pub struct InvalidDimensions {
    pub width: u32,
    pub height: u32,
}

/// Round an odd size up to the next even number.
///
/// ```
/// # use wicompress::imaging::ensure_even;
/// assert_eq!(ensure_even(1663), 1664);
/// assert_eq!(ensure_even(1664), 1664);
/// ```
pub fn ensure_even(size: u32) -> u32 {
    if size % 2 == 1 {
        size.saturating_add(1)
    } else {
        size
    }
}

/// Calculate the Luban downscale divisor for an image.
///
/// Both sides are rounded up to even first, so `1663x1663` lands in the same
/// band as `1664x1664`. The result is always at least 1 and is symmetric in
/// its arguments.
///
/// # Examples
/// ```
/// # use wicompress::imaging::luban_ratio;
/// assert_eq!(luban_ratio(1600, 1600).unwrap(), 1);
/// assert_eq!(luban_ratio(4000, 3000).unwrap(), 2);
/// assert_eq!(luban_ratio(20000, 10000).unwrap(), 16);
/// assert!(luban_ratio(0, 100).is_err());
/// ```
pub fn luban_ratio(width: u32, height: u32) -> Result<u32, InvalidDimensions> {
    if width == 0 || height == 0 {
        return Err(InvalidDimensions { width, height });
    }

    let even_w = ensure_even(width);
    let even_h = ensure_even(height);
    let long_side = even_w.max(even_h);
    let short_side = even_w.min(even_h);
    let aspect = short_side as f64 / long_side as f64;

    let ratio = if aspect >= NEAR_SQUARE_MIN_ASPECT {
        match long_side {
            s if s < KEEP_BELOW => 1,
            s if s < HALVE_BELOW => 2,
            s if s < QUARTER_BELOW => 4,
            s => (s / BASE_LONG_SIDE).max(1),
        }
    } else if aspect > ELONGATED_MIN_ASPECT {
        if long_side > BASE_LONG_SIDE {
            (long_side / BASE_LONG_SIDE).max(1)
        } else {
            1
        }
    } else {
        long_side.div_ceil(BASE_LONG_SIDE)
    };

    Ok(ratio)
}

/// Dimensions after dividing both sides by `ratio`, never below 1px.
///
/// A ratio of 0 is treated as 1.
pub fn scaled_dimensions(dims: (u32, u32), ratio: u32) -> (u32, u32) {
    let ratio = ratio.max(1);
    ((dims.0 / ratio).max(1), (dims.1 / ratio).max(1))
}

/// Size in bytes of an uncompressed 8-bit raster with `channels` channels.
///
/// Returns `None` on overflow.
pub fn raster_bytes(dims: (u32, u32), channels: u8) -> Option<u64> {
    (dims.0 as u64)
        .checked_mul(dims.1 as u64)?
        .checked_mul(channels as u64)
}
