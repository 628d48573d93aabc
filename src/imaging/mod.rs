//! Image processing: detection, ratio math, orientation, resizing, encoding.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Detect** | container signatures (JPEG SOI, PNG magic, ISO-BMFF `ftyp`) |
//! | **Ratio** | Luban bands, pure integer math |
//! | **Orientation** | `kamadak-exif` + Apple maker-note walk, `DynamicImage` rotate/flip |
//! | **Resize** | `DynamicImage::resize_exact` with `Lanczos3` |
//! | **Encode** | `image` JPEG/PNG encoders behind [`CodecBackend`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing an encode
//! - **Backend**: [`CodecBackend`] trait + [`RustBackend`] (plus `HeifBackend`
//!   on libheif with the `heif` feature)
//! - **Operations**: The encode step, combining format dispatch + backend

pub mod backend;
mod bitmap;
mod calculations;
pub(crate) mod exif_reader;
pub mod format;
#[cfg(feature = "heif")]
pub mod heif_backend;
pub mod operations;
pub mod orientation;
mod params;
pub mod resize;
pub mod rust_backend;

pub use backend::{BackendCapabilities, BackendError, CodecBackend, OrientationMetadata};
pub use bitmap::Bitmap;
pub use calculations::{InvalidDimensions, ensure_even, luban_ratio, scaled_dimensions};
pub use format::{ImageFormat, OutputFormat, detect};
#[cfg(feature = "heif")]
pub use heif_backend::HeifBackend;
pub use operations::{CompressError, encode};
pub use orientation::{
    LivePhotoDetection, LivePhotoSchema, Orientation, apply_orientation, correct_orientation,
    is_live_photo, needs_correction,
};
pub use params::{EncodeParams, Quality};
pub use resize::{ResizeFailed, ResizeFailure, resize, resize_in_luban, resize_to};
pub use rust_backend::RustBackend;
