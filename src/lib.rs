//! # wicompress
//!
//! Photo compression for uploads. An image goes in as a decoded bitmap plus,
//! optionally, the bytes it was decoded from; a smaller image in the same
//! format family comes out.
//!
//! # Pipeline
//!
//! ```text
//! detect      original bytes  →  JPEG | PNG | HEIC/HEIF | Unknown
//! ratio       width × height  →  integer downscale ratio (Luban bands)
//! resize      bitmap          →  bitmap at ⌊w/ratio⌋ × ⌊h/ratio⌋
//! orient      bitmap          →  upright bitmap (EXIF tag, or Live Photo fix for HEIF)
//! encode      bitmap          →  bytes in the detected family
//! ```
//!
//! Unknown and undetected inputs are encoded as JPEG. When re-encoding would
//! not shrink an input, its original bytes are returned instead.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Format detection, ratio math, orientation, resize, encode, codec backends |
//! | [`pipeline`] | [`CompressionPipeline`]: the per-image compression flow |
//! | [`batch`] | Parallel compression of files on disk with progress events |
//! | [`config`] | `wicompress.toml` loading, merging onto stock defaults, validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Same-Family Output
//!
//! Upload targets keep whatever format the user picked: JPEG stays JPEG, PNG
//! stays PNG (lossless, quality ignored), HEIC stays HEIC. Only inputs whose
//! container cannot be recognized are converted, and those become JPEG.
//!
//! ## Integer Downscale Ratios
//!
//! The ratio is always a whole number chosen from the longer side and the
//! aspect, so outputs land near familiar upload sizes (roughly 1280 to 1664
//! on the long side for camera photos) without per-image tuning. Panoramas
//! and tall screenshots use separate bands so text stays legible.
//!
//! ## Backends Behind a Trait
//!
//! Decoding, encoding and metadata access go through
//! [`imaging::CodecBackend`]. The pure Rust [`imaging::RustBackend`] needs
//! no system libraries; a platform backend with a HEIF encoder can be dropped
//! in without touching the pipeline, and tests use a recording mock.

pub mod batch;
pub mod config;
pub mod imaging;
pub mod output;
pub mod pipeline;

pub use imaging::{ImageFormat, OutputFormat, Quality};
pub use pipeline::{CompressError, CompressedImage, CompressionPipeline, CompressionRequest};

#[cfg(test)]
pub(crate) mod test_helpers;
