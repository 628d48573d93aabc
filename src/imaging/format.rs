//! Container-signature format detection.
//!
//! Classification looks only at the bytes: file extensions and MIME hints are
//! never consulted. Anything unrecognised (including empty input) is
//! [`ImageFormat::Unknown`], which the encoder treats as photographic and
//! writes as JPEG.
//!
//! | Family | Signature |
//! |---|---|
//! | JPEG | `FF D8 FF` |
//! | PNG | `89 50 4E 47 0D 0A 1A 0A` |
//! | HEIF | ISO-BMFF `ftyp` box at offset 4 with a HEIF/HEIC brand |

use serde::{Deserialize, Serialize};
use std::fmt;

const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const FTYP: &[u8] = b"ftyp";

/// Brands that mark an ISO-BMFF file as HEIF/HEIC (ISO/IEC 23008-12).
const HEIF_BRANDS: &[&[u8; 4]] = &[
    b"heic", b"heix", b"heim", b"heis", b"hevc", b"hevx", b"hevm", b"hevs", b"mif1", b"msf1",
    b"heif",
];

/// AVIF reuses `mif1`/`msf1` as compatible brands, so the major brand decides.
const AVIF_BRANDS: &[&[u8; 4]] = &[b"avif", b"avis"];

/// Coarse encoded-container family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Heif,
    Unknown,
}

/// Formats the encoder can actually write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    Heif,
}

impl ImageFormat {
    /// Classify encoded bytes by their container signature.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(JPEG_MAGIC) {
            ImageFormat::Jpeg
        } else if bytes.starts_with(PNG_MAGIC) {
            ImageFormat::Png
        } else if is_heif_container(bytes) {
            ImageFormat::Heif
        } else {
            ImageFormat::Unknown
        }
    }

    pub fn is_heif(self) -> bool {
        self == ImageFormat::Heif
    }

    /// The encoder target for this family. Unknown input is written as JPEG.
    pub fn output_format(self) -> OutputFormat {
        match self {
            ImageFormat::Jpeg | ImageFormat::Unknown => OutputFormat::Jpeg,
            ImageFormat::Png => OutputFormat::Png,
            ImageFormat::Heif => OutputFormat::Heif,
        }
    }

    /// Display name, as shown by the CLI.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "JPEG",
            ImageFormat::Png => "PNG",
            ImageFormat::Heif => "HEIC/HEIF",
            ImageFormat::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl OutputFormat {
    /// Whether `quality` influences the encoded result.
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }

    /// Conventional file extension for written output.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Heif => "heic",
        }
    }

    pub fn family(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Heif => ImageFormat::Heif,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family().name())
    }
}

/// Classify encoded bytes. Shorthand for [`ImageFormat::detect`].
pub fn detect(bytes: &[u8]) -> ImageFormat {
    ImageFormat::detect(bytes)
}

/// Check the leading `ftyp` box for a HEIF brand.
///
/// Box layout: size (u32 BE), `ftyp`, major brand (4), minor version (4),
/// then compatible brands (4 each) up to the box size.
fn is_heif_container(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || &bytes[4..8] != FTYP {
        return false;
    }

    let major = &bytes[8..12];
    if AVIF_BRANDS.iter().any(|b| b.as_slice() == major) {
        return false;
    }
    if HEIF_BRANDS.iter().any(|b| b.as_slice() == major) {
        return true;
    }

    let box_size = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let box_end = box_size.min(bytes.len());
    if box_end <= 16 {
        return false;
    }

    bytes[16..box_end]
        .chunks_exact(4)
        .any(|brand| HEIF_BRANDS.iter().any(|b| b.as_slice() == brand))
}
