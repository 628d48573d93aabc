//! Shared test utilities for the wicompress test suite.
//!
//! Builders for synthetic images and the encoded containers around them, so
//! tests never depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let note = apple_maker_note(&[17]);
//! let jpeg = jpeg_with_exif(&synthetic_jpeg(64, 48), &exif_tiff(Some(6), Some(&note)));
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, Rgb, RgbImage};

// =========================================================================
// Pixels
// =========================================================================

/// An RGB image with smooth gradients plus some texture, so JPEG output is
/// neither trivially small nor pathologically large.
pub fn synthetic_image(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        let b = ((x ^ y) & 0x3F) as u8;
        Rgb([r, g, b])
    });
    DynamicImage::ImageRgb8(img)
}

// =========================================================================
// Encoded containers
// =========================================================================

pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .unwrap();
    out
}

pub fn encode_png(image: &DynamicImage) -> Vec<u8> {
    let rgb = image.to_rgb8();
    let mut out = Vec::new();
    PngEncoder::new(&mut out)
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    out
}

/// A JPEG of a synthetic image at quality 90.
pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    encode_jpeg(&synthetic_image(width, height), 90)
}

/// Leading `ftyp` box of a HEIC file. Enough for format detection only.
pub fn heic_header() -> Vec<u8> {
    let mut data = vec![0, 0, 0, 24];
    data.extend_from_slice(b"ftypheic");
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(b"mif1heic");
    data
}

// =========================================================================
// EXIF
// =========================================================================

/// An Apple maker note whose IFD carries `tags` (values zeroed).
pub fn apple_maker_note(tags: &[u16]) -> Vec<u8> {
    let mut note = b"Apple iOS\0".to_vec();
    note.extend_from_slice(&[0x00, 0x01]);
    note.extend_from_slice(b"MM");
    note.extend_from_slice(&(tags.len() as u16).to_be_bytes());
    for &tag in tags {
        // SLONG, count 1, value 0
        ifd_entry(&mut note, tag, 9, 1, [0, 0, 0, 0]);
    }
    note.extend_from_slice(&0u32.to_be_bytes());
    note
}

/// A big-endian TIFF block with an optional Orientation in IFD0 and an
/// optional maker note in the Exif IFD.
///
/// Layout: header (8) | IFD0 | Exif IFD | maker note bytes.
pub fn exif_tiff(orientation: Option<u16>, maker_note: Option<&[u8]>) -> Vec<u8> {
    let ifd_len = |entries: usize| 2 + entries * 12 + 4;
    let ifd0_entries = orientation.is_some() as usize + maker_note.is_some() as usize;
    let exif_ifd_offset = 8 + ifd_len(ifd0_entries);
    let maker_offset = exif_ifd_offset + ifd_len(1);

    let mut out = b"MM\x00\x2A\x00\x00\x00\x08".to_vec();
    out.extend_from_slice(&(ifd0_entries as u16).to_be_bytes());
    if let Some(value) = orientation {
        let [hi, lo] = value.to_be_bytes();
        // SHORT, count 1, left-justified value
        ifd_entry(&mut out, 0x0112, 3, 1, [hi, lo, 0, 0]);
    }
    if maker_note.is_some() {
        // ExifIFDPointer, LONG
        ifd_entry(&mut out, 0x8769, 4, 1, (exif_ifd_offset as u32).to_be_bytes());
    }
    out.extend_from_slice(&0u32.to_be_bytes());

    if let Some(note) = maker_note {
        out.extend_from_slice(&1u16.to_be_bytes());
        // MakerNote, UNDEFINED
        ifd_entry(
            &mut out,
            0x927C,
            7,
            note.len() as u32,
            (maker_offset as u32).to_be_bytes(),
        );
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(note);
    }
    out
}

/// Splice an `APP1 Exif` segment carrying `tiff` right after the JPEG SOI.
pub fn jpeg_with_exif(jpeg: &[u8], tiff: &[u8]) -> Vec<u8> {
    assert!(jpeg.starts_with(&[0xFF, 0xD8]), "not a JPEG");
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn ifd_entry(out: &mut Vec<u8>, tag: u16, typ: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&tag.to_be_bytes());
    out.extend_from_slice(&typ.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&value);
}
