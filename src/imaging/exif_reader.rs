//! EXIF orientation and Apple maker-note reader.
//!
//! Extracts the two things the orientation corrector needs from encoded bytes:
//! - Orientation (`0x0112`) from the primary image, via `kamadak-exif`
//! - the tag ids of an Apple maker note (`0x927C`), via a small IFD walk
//!
//! `kamadak-exif` locates the TIFF block inside JPEG, PNG, HEIF and TIFF
//! containers and hands back the maker note as opaque bytes. Apple's maker
//! note is itself an IFD behind a fixed header:
//!
//! ```text
//! "Apple iOS\0" | version (2) | "MM" | entry count (u16) | 12-byte entries...
//! ```
//!
//! Every failure degrades to empty metadata.

use super::backend::OrientationMetadata;
use super::orientation::Orientation;
use exif::{In, Reader, Tag, Value};
use std::io::Cursor;

const APPLE_MAKER_HEADER: &[u8] = b"Apple iOS\0";
/// Byte-order mark position inside an Apple maker note.
const APPLE_BYTE_ORDER: usize = 12;
/// Entry count position; entries follow immediately.
const APPLE_IFD_START: usize = 14;
const IFD_ENTRY_LEN: usize = 12;

/// Read orientation and maker-note tags from encoded image bytes.
pub fn read_orientation_metadata(bytes: &[u8]) -> OrientationMetadata {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::trace!(error = %e, "no readable EXIF block");
            return OrientationMetadata::default();
        }
    };

    let orientation = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_exif);

    let apple_maker_tags = exif
        .get_field(Tag::MakerNote, In::PRIMARY)
        .map(|field| match &field.value {
            Value::Undefined(note, _) => apple_maker_tags(note),
            _ => Vec::new(),
        })
        .unwrap_or_default();

    OrientationMetadata {
        orientation,
        apple_maker_tags,
        heif_live_photo: None,
    }
}

/// List the tag ids of an Apple maker note, in file order.
///
/// Returns an empty list for non-Apple notes. A truncated IFD yields the
/// entries that fit.
pub fn apple_maker_tags(note: &[u8]) -> Vec<u16> {
    if !note.starts_with(APPLE_MAKER_HEADER) || note.len() < APPLE_IFD_START + 2 {
        return Vec::new();
    }

    let big_endian = match &note[APPLE_BYTE_ORDER..APPLE_BYTE_ORDER + 2] {
        b"MM" => true,
        b"II" => false,
        _ => return Vec::new(),
    };

    let read_u16 = |offset: usize| -> u16 {
        if big_endian {
            u16::from_be_bytes([note[offset], note[offset + 1]])
        } else {
            u16::from_le_bytes([note[offset], note[offset + 1]])
        }
    };

    let entry_count = read_u16(APPLE_IFD_START) as usize;
    let entries_start = APPLE_IFD_START + 2;

    (0..entry_count)
        .map(|i| entries_start + i * IFD_ENTRY_LEN)
        .take_while(|&offset| offset + IFD_ENTRY_LEN <= note.len())
        .map(read_u16)
        .collect()
}
