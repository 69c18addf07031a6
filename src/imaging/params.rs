//! Parameter types for image operations.
//!
//! These types describe *what* to produce, not *how*. The
//! [`operations`](super::operations) module plans derivatives with them and
//! the [`backend`](super::backend) does the pixel work, so a mock backend can
//! stand in during tests without touching the planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 90). Clamped on construction.
//! - [`Encoding`]: Output encodings: AVIF (modern) plus the JPEG/PNG fallbacks.
//! - [`SourceFormat`]: Decoded format of an input image, decides the fallback.
//! - [`Variant`]: Which derivative of a source this is: a breakpoint or the full-size copy.
//! - [`DerivativeParams`]: Everything one derivative encode needs.

use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Output encoding of a derivative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Modern compressed format, produced for every breakpoint and the full-size copy.
    Avif,
    /// Fallback for JPEG sources.
    Jpeg,
    /// Fallback for PNG sources.
    Png,
}

impl Encoding {
    /// File extension written for this encoding.
    pub fn extension(self) -> &'static str {
        match self {
            Encoding::Avif => "avif",
            Encoding::Jpeg => "jpg",
            Encoding::Png => "png",
        }
    }

    /// Key used for this encoding in the quality table.
    pub fn key(self) -> &'static str {
        match self {
            Encoding::Avif => "avif",
            Encoding::Jpeg => "jpeg",
            Encoding::Png => "png",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Extensions a derivative can carry. `jpeg` is accepted when re-scanning
/// output trees that were touched by hand.
pub const DERIVATIVE_EXTENSIONS: &[&str] = &["avif", "jpg", "jpeg", "png"];

/// Format of a source image, as detected from its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    Gif,
    Tiff,
    Bmp,
}

impl SourceFormat {
    /// Fallback encoding kept alongside AVIF. Only JPEG and PNG sources get one.
    pub fn fallback(self) -> Option<Encoding> {
        match self {
            SourceFormat::Jpeg => Some(Encoding::Jpeg),
            SourceFormat::Png => Some(Encoding::Png),
            SourceFormat::Gif | SourceFormat::Tiff | SourceFormat::Bmp => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Jpeg => "jpeg",
            SourceFormat::Png => "png",
            SourceFormat::Gif => "gif",
            SourceFormat::Tiff => "tiff",
            SourceFormat::Bmp => "bmp",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which derivative of a source image is being produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variant {
    /// Resized to the breakpoint with this label.
    Breakpoint(String),
    /// Unscaled, re-encoded as AVIF.
    Full,
}

impl Variant {
    pub fn label(&self) -> &str {
        match self {
            Variant::Breakpoint(label) => label,
            Variant::Full => "full",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Parameters for encoding one derivative.
///
/// `width`/`height` are the final pixel dimensions. When they equal the
/// source's dimensions the backend re-encodes without resampling.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivativeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub encoding: Encoding,
    pub quality: Quality,
}
