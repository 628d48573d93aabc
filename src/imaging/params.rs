//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the pipeline (which decides the target format and
//! quality) and the [`backend`](super::backend) (which does the actual
//! encoding). This separation allows swapping backends (e.g. for testing with
//! a mock) without changing pipeline logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (0.0–1.0, default 0.6). Clamped on construction.
//! - [`EncodeParams`]: Target format plus quality (absent for lossless formats).

use super::format::OutputFormat;
use serde::Serialize;

/// Quality setting for lossy image encoding (0.0-1.0).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Quality(f32);

impl Quality {
    pub const DEFAULT: f32 = 0.6;

    /// Clamp into `[0.0, 1.0]`. NaN falls back to the default.
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    /// Quality on the 1–100 scale used by JPEG encoders.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl From<f32> for Quality {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

/// Parameters for a single encode call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncodeParams {
    pub format: OutputFormat,
    /// `None` for lossless formats.
    pub quality: Option<Quality>,
}

impl EncodeParams {
    /// Build params for `format`, dropping quality when the format is lossless.
    pub fn new(format: OutputFormat, quality: Quality) -> Self {
        Self {
            format,
            quality: format.is_lossy().then_some(quality),
        }
    }
}
