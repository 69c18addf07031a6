//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::ImageReader::with_guessed_format` + `into_dimensions` |
//! | Decode (JPEG, PNG, GIF, TIFF, BMP) | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless; quality picks compression effort) |

use super::backend::{BackendError, ImageBackend, SourceInfo};
use super::params::{DerivativeParams, Encoding, Quality, SourceFormat};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Input extensions and the decoder each one needs compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tiff", ImageFormat::Tiff),
    ("bmp", ImageFormat::Bmp),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of input file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn source_format(format: ImageFormat) -> Option<SourceFormat> {
    match format {
        ImageFormat::Jpeg => Some(SourceFormat::Jpeg),
        ImageFormat::Png => Some(SourceFormat::Png),
        ImageFormat::Gif => Some(SourceFormat::Gif),
        ImageFormat::Tiff => Some(SourceFormat::Tiff),
        ImageFormat::Bmp => Some(SourceFormat::Bmp),
        _ => None,
    }
}

/// Open a reader with the format sniffed from the file's content.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

/// PNG is always lossless here, so quality only trades encode time for size:
/// high quality favours fast encodes, low quality the smallest files.
fn png_compression(quality: Quality) -> CompressionType {
    match quality.value() {
        95.. => CompressionType::Fast,
        50..=94 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

/// Encode `img` to `path` in the requested encoding.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    encoding: Encoding,
    quality: Quality,
) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let encoded = match encoding {
        Encoding::Avif => {
            let encoder =
                AvifEncoder::new_with_speed_quality(&mut writer, 6, quality.value() as u8);
            to_8bit(img).write_with_encoder(encoder)
        }
        Encoding::Jpeg => {
            // JPEG has no alpha channel
            let encoder = JpegEncoder::new_with_quality(&mut writer, quality.value() as u8);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)
        }
        Encoding::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut writer,
                png_compression(quality),
                PngFilter::Adaptive,
            );
            img.write_with_encoder(encoder)
        }
    };
    encoded.map_err(|e| {
        BackendError::ProcessingFailed(format!("{} encode failed: {}", encoding, e))
    })?;
    writer.flush()?;
    Ok(())
}

/// AVIF encoding takes 8-bit RGB(A); keep alpha only when the source has it.
fn to_8bit(img: &DynamicImage) -> DynamicImage {
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<SourceInfo, BackendError> {
        let reader = open_reader(path)?;
        let format = reader
            .format()
            .and_then(source_format)
            .ok_or_else(|| {
                BackendError::ProcessingFailed(format!(
                    "Unrecognized image format: {}",
                    path.display()
                ))
            })?;
        let (width, height) = reader.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(SourceInfo {
            width,
            height,
            format,
        })
    }

    fn encode(&self, params: &DerivativeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let output = if (params.width, params.height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        };
        save_image(&output, &params.output, params.encoding, params.quality)
    }
}
