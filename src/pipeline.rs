//! The compression pipeline.
//!
//! One call takes a decoded bitmap (plus, optionally, the bytes it was decoded
//! from) and returns re-encoded bytes in the same format family:
//!
//! ```text
//! detect(original) → luban_ratio → resize → orient → encode → never-grow
//! ```
//!
//! Encoders write no orientation tag, so the orient step always leaves the
//! pixels upright. HEIF inputs go through Live Photo correction against the
//! original bytes; any other bitmap has the orientation its decoder recorded
//! applied to the pixels.
//!
//! ## Failure policy
//!
//! | Step | On failure |
//! |---|---|
//! | Ratio | hard: [`CompressError::InvalidDimensions`] |
//! | Resize | soft: continue with the unresized bitmap (logged) |
//! | Orientation | never fails; identity when it does not apply |
//! | Encode | hard: [`CompressError::UnsupportedFormat`] / [`CompressError::EncodeFailed`] |
//!
//! ## Never-grow
//!
//! When the original bytes are a recognised format and the new encoding is
//! not smaller, the original bytes are returned instead and the result is
//! flagged [`kept_original`](CompressedImage::kept_original). Repeatedly
//! compressing the output therefore never makes it larger. A corrected Live
//! Photo is the exception: its original bytes display wrong, so the
//! corrected encoding is returned whatever its size.

use crate::imaging::{
    Bitmap, CodecBackend, ImageFormat, LivePhotoDetection, Orientation, OutputFormat, Quality,
    RustBackend, apply_orientation, correct_orientation, encode, luban_ratio, resize,
};

pub use crate::imaging::CompressError;

/// Knobs that stay fixed across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Return the original bytes when re-encoding would not shrink them.
    pub never_grow: bool,
    pub live_photo_detection: LivePhotoDetection,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            never_grow: true,
            live_photo_detection: LivePhotoDetection::Auto,
        }
    }
}

/// Input to a single compression.
#[derive(Debug, Clone)]
pub struct CompressionRequest<'a> {
    pub bitmap: Bitmap,
    /// Encoded bytes the bitmap came from. Drives format and orientation.
    pub original: Option<&'a [u8]>,
    pub quality: Quality,
}

impl<'a> CompressionRequest<'a> {
    pub fn new(bitmap: Bitmap) -> Self {
        Self {
            bitmap,
            original: None,
            quality: Quality::default(),
        }
    }

    pub fn with_original(mut self, bytes: &'a [u8]) -> Self {
        self.original = Some(bytes);
        self
    }

    pub fn with_quality(mut self, quality: impl Into<Quality>) -> Self {
        self.quality = quality.into();
        self
    }
}

/// Successful compression output.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    /// Dimensions of the image `bytes` decode to.
    pub width: u32,
    pub height: u32,
    /// Luban divisor chosen for the input size.
    pub ratio: u32,
    pub orientation_corrected: bool,
    /// The resize step failed and the bitmap was encoded at full size.
    pub resize_fallback: bool,
    /// `bytes` are the untouched original; re-encoding would not have shrunk them.
    pub kept_original: bool,
}

/// Compression pipeline over a codec backend.
pub struct CompressionPipeline<B: CodecBackend = RustBackend> {
    backend: B,
    options: PipelineOptions,
}

impl Default for CompressionPipeline<RustBackend> {
    fn default() -> Self {
        Self::new(RustBackend::new())
    }
}

impl<B: CodecBackend> CompressionPipeline<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, PipelineOptions::default())
    }

    pub fn with_options(backend: B, options: PipelineOptions) -> Self {
        Self { backend, options }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn options(&self) -> PipelineOptions {
        self.options
    }

    /// Run the full pipeline for one image.
    pub fn compress(&self, request: CompressionRequest<'_>) -> Result<CompressedImage, CompressError> {
        let CompressionRequest {
            bitmap,
            original,
            quality,
        } = request;

        let format = ImageFormat::detect(original.unwrap_or_default());
        let source_dims = bitmap.dimensions();
        let ratio = luban_ratio(source_dims.0, source_dims.1)?;
        tracing::debug!(%format, dimensions = ?source_dims, ratio, "compressing");

        let (resized, resize_fallback) = match resize(bitmap, ratio) {
            Ok(resized) => (resized, false),
            Err(failed) => {
                tracing::warn!(reason = %failed.reason, "resize failed, encoding at full size");
                (failed.into_bitmap(), true)
            }
        };

        let (oriented, corrected) = if format.is_heif() {
            correct_orientation(
                &self.backend,
                resized,
                original,
                self.options.live_photo_detection,
            )
        } else {
            apply_decoded_orientation(resized)
        };
        // The original bytes of a corrected Live Photo still display rotated.
        let live_photo_corrected = format.is_heif() && corrected.is_some();

        let bytes = encode(&self.backend, &oriented, format, quality)?;

        if let Some(original) = original
            .filter(|o| !live_photo_corrected && self.keeps_original(format, o, &bytes))
        {
            tracing::debug!(
                original = original.len(),
                encoded = bytes.len(),
                "re-encoding did not shrink, keeping original"
            );
            return Ok(CompressedImage {
                bytes: original.to_vec(),
                format: format.output_format(),
                width: source_dims.0,
                height: source_dims.1,
                ratio,
                orientation_corrected: false,
                resize_fallback,
                kept_original: true,
            });
        }

        Ok(CompressedImage {
            bytes,
            format: format.output_format(),
            width: oriented.width(),
            height: oriented.height(),
            ratio,
            orientation_corrected: corrected.is_some(),
            resize_fallback,
            kept_original: false,
        })
    }

    fn keeps_original(&self, format: ImageFormat, original: &[u8], encoded: &[u8]) -> bool {
        self.options.never_grow && format != ImageFormat::Unknown && encoded.len() >= original.len()
    }
}

/// Bake the orientation recorded by the decoder into the pixels.
fn apply_decoded_orientation(bitmap: Bitmap) -> (Bitmap, Option<Orientation>) {
    match bitmap.orientation() {
        Some(orientation) if orientation != Orientation::Up => {
            tracing::debug!(?orientation, "applying decoded orientation");
            (apply_orientation(bitmap, orientation), Some(orientation))
        }
        _ => (bitmap, None),
    }
}

/// Compress with the pure Rust backend and default options.
pub fn compress(
    bitmap: Bitmap,
    original: Option<&[u8]>,
    quality: Quality,
) -> Result<CompressedImage, CompressError> {
    let request = CompressionRequest {
        bitmap,
        original,
        quality,
    };
    CompressionPipeline::default().compress(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{BackendCapabilities, OrientationMetadata};
    use crate::test_helpers::{exif_tiff, heic_header, jpeg_with_exif, synthetic_jpeg};
    use image::DynamicImage;

    fn bitmap(width: u32, height: u32) -> Bitmap {
        Bitmap::new(DynamicImage::new_rgb8(width, height))
    }

    /// JPEG-looking bytes, longer than the mock's output.
    fn big_jpeg_bytes() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xE0];
        data.resize(256, 0);
        data
    }

    fn live_photo_heif_backend(orientation: Orientation) -> MockBackend {
        MockBackend::with_metadata(OrientationMetadata {
            orientation: Some(orientation),
            apple_maker_tags: vec![17],
            heif_live_photo: None,
        })
    }

    // =========================================================================
    // Format dispatch
    // =========================================================================

    #[test]
    fn jpeg_original_reencodes_as_jpeg() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let original = big_jpeg_bytes();
        let request = CompressionRequest::new(bitmap(200, 100))
            .with_original(&original)
            .with_quality(0.7);

        let result = pipeline.compress(request).unwrap();

        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(result.bytes, b"encoded");
        assert!(!result.kept_original);
        assert_eq!(
            pipeline.backend().get_operations(),
            vec![RecordedOp::Encode {
                format: OutputFormat::Jpeg,
                quality: Some(0.7),
                width: 200,
                height: 100,
            }]
        );
    }

    #[test]
    fn without_original_bytes_writes_jpeg() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let result = pipeline
            .compress(CompressionRequest::new(bitmap(10, 10)))
            .unwrap();
        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!(result.bytes, b"encoded");
    }

    #[test]
    fn png_original_stays_png() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let mut original = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        original.resize(64, 0);

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(10, 10)).with_original(&original))
            .unwrap();

        assert_eq!(result.format, OutputFormat::Png);
        assert!(matches!(
            pipeline.backend().get_operations()[0],
            RecordedOp::Encode { quality: None, .. }
        ));
    }

    #[test]
    fn heif_without_encoder_is_unsupported() {
        let pipeline =
            CompressionPipeline::new(MockBackend::with_capabilities(BackendCapabilities::default()));
        let original = heic_header();

        let result = pipeline.compress(CompressionRequest::new(bitmap(10, 10)).with_original(&original));

        assert!(matches!(
            result,
            Err(CompressError::UnsupportedFormat(OutputFormat::Heif))
        ));
    }

    // =========================================================================
    // Ratio and resize
    // =========================================================================

    #[test]
    fn large_image_is_downscaled_by_luban_ratio() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let result = pipeline
            .compress(CompressionRequest::new(bitmap(2000, 1000)))
            .unwrap();

        assert_eq!(result.ratio, 2);
        assert_eq!((result.width, result.height), (1000, 500));
        assert!(!result.resize_fallback);
        assert_eq!(pipeline.backend().encoded_sizes(), vec![(1000, 500)]);
    }

    #[test]
    fn zero_sized_bitmap_is_invalid() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let result = pipeline.compress(CompressionRequest::new(Bitmap::empty()));

        assert!(matches!(result, Err(CompressError::InvalidDimensions(_))));
        assert!(pipeline.backend().get_operations().is_empty());
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    #[test]
    fn heif_live_photo_is_corrected_before_encode() {
        let pipeline = CompressionPipeline::new(live_photo_heif_backend(Orientation::Right));
        let original = heic_header();

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(40, 20)).with_original(&original))
            .unwrap();

        assert!(result.orientation_corrected);
        assert_eq!((result.width, result.height), (20, 40));
        assert_eq!(result.format, OutputFormat::Heif);
        let ops = pipeline.backend().get_operations();
        assert_eq!(ops[0], RecordedOp::ReadMetadata(original.len()));
        assert_eq!(pipeline.backend().encoded_sizes(), vec![(20, 40)]);
    }

    #[test]
    fn jpeg_is_never_orientation_corrected() {
        let pipeline = CompressionPipeline::new(live_photo_heif_backend(Orientation::Right));
        let original = big_jpeg_bytes();

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(40, 20)).with_original(&original))
            .unwrap();

        assert!(!result.orientation_corrected);
        assert_eq!(pipeline.backend().encoded_sizes(), vec![(40, 20)]);
        assert!(
            !pipeline
                .backend()
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::ReadMetadata(_)))
        );
    }

    #[test]
    fn decoded_orientation_is_applied_to_jpeg() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let original = big_jpeg_bytes();
        let source = bitmap(40, 20).with_orientation(Orientation::Right);

        let result = pipeline
            .compress(CompressionRequest::new(source).with_original(&original))
            .unwrap();

        assert!(result.orientation_corrected);
        assert_eq!((result.width, result.height), (20, 40));
        assert_eq!(pipeline.backend().encoded_sizes(), vec![(20, 40)]);
    }

    #[test]
    fn upright_bitmap_is_encoded_as_is() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let source = bitmap(40, 20).with_orientation(Orientation::Up);

        let result = pipeline.compress(CompressionRequest::new(source)).unwrap();

        assert!(!result.orientation_corrected);
        assert_eq!(pipeline.backend().encoded_sizes(), vec![(40, 20)]);
    }

    #[test]
    fn rotated_camera_jpeg_comes_out_upright() {
        let original = jpeg_with_exif(&synthetic_jpeg(200, 100), &exif_tiff(Some(6), None));
        let backend = RustBackend::new();
        let decoded = backend.decode(&original).unwrap();
        let options = PipelineOptions {
            never_grow: false,
            ..Default::default()
        };
        let pipeline = CompressionPipeline::with_options(backend, options);

        let result = pipeline
            .compress(CompressionRequest::new(decoded).with_original(&original))
            .unwrap();

        assert!(result.orientation_corrected);
        assert_eq!((result.width, result.height), (100, 200));
        let reread = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!((reread.width(), reread.height()), (100, 200));
    }

    #[test]
    fn legacy_detection_option_is_honoured() {
        let backend = MockBackend::with_metadata(OrientationMetadata {
            orientation: Some(Orientation::Left),
            ..Default::default()
        });
        let options = PipelineOptions {
            live_photo_detection: LivePhotoDetection::OrientationTag,
            ..Default::default()
        };
        let pipeline = CompressionPipeline::with_options(backend, options);
        let original = heic_header();

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(40, 20)).with_original(&original))
            .unwrap();

        assert!(result.orientation_corrected);
        assert_eq!((result.width, result.height), (20, 40));
    }

    // =========================================================================
    // Never-grow
    // =========================================================================

    #[test]
    fn larger_output_keeps_original() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        // Shorter than the mock's 7-byte output.
        let original = vec![0xFF, 0xD8, 0xFF, 0xE0];

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(30, 20)).with_original(&original))
            .unwrap();

        assert!(result.kept_original);
        assert_eq!(result.bytes, original);
        assert_eq!(result.format, OutputFormat::Jpeg);
        assert_eq!((result.width, result.height), (30, 20));
    }

    #[test]
    fn corrected_live_photo_is_never_swapped_for_original() {
        let pipeline = CompressionPipeline::new(MockBackend {
            encoded: vec![0; 100],
            ..live_photo_heif_backend(Orientation::Right)
        });
        let original = heic_header();

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(40, 20)).with_original(&original))
            .unwrap();

        assert!(!result.kept_original);
        assert!(result.orientation_corrected);
        assert_eq!(result.bytes.len(), 100);
        assert_eq!((result.width, result.height), (20, 40));
    }

    #[test]
    fn uncorrected_heif_still_keeps_original() {
        let pipeline = CompressionPipeline::new(MockBackend {
            encoded: vec![0; 100],
            ..MockBackend::new()
        });
        let original = heic_header();

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(40, 20)).with_original(&original))
            .unwrap();

        assert!(result.kept_original);
        assert_eq!(result.bytes, original);
    }

    #[test]
    fn equal_size_keeps_original() {
        let pipeline = CompressionPipeline::new(MockBackend {
            encoded: vec![1, 2, 3, 4],
            ..MockBackend::new()
        });
        let original = vec![0xFF, 0xD8, 0xFF, 0xE0];

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(30, 20)).with_original(&original))
            .unwrap();

        assert!(result.kept_original);
    }

    #[test]
    fn never_grow_can_be_disabled() {
        let options = PipelineOptions {
            never_grow: false,
            ..Default::default()
        };
        let pipeline = CompressionPipeline::with_options(MockBackend::new(), options);
        let original = vec![0xFF, 0xD8, 0xFF, 0xE0];

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(30, 20)).with_original(&original))
            .unwrap();

        assert!(!result.kept_original);
        assert_eq!(result.bytes, b"encoded");
    }

    #[test]
    fn unknown_original_is_never_returned() {
        let pipeline = CompressionPipeline::new(MockBackend::new());
        let original = b"xy".to_vec();

        let result = pipeline
            .compress(CompressionRequest::new(bitmap(30, 20)).with_original(&original))
            .unwrap();

        assert!(!result.kept_original);
        assert_eq!(result.bytes, b"encoded");
    }

    // =========================================================================
    // Request builder
    // =========================================================================

    #[test]
    fn request_defaults() {
        let request = CompressionRequest::new(bitmap(1, 1));
        assert_eq!(request.original, None);
        assert_eq!(request.quality, Quality::default());
    }

    #[test]
    fn request_quality_is_clamped() {
        let request = CompressionRequest::new(bitmap(1, 1)).with_quality(3.0);
        assert_eq!(request.quality.value(), 1.0);
    }
}
