//! Shared test utilities.
//!
//! Synthetic source images for backend tests and manifest lookups that panic
//! with a readable message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! write_test_image(&tmp.path().join("work/hero.jpg"), 64, 48, ImageFormat::Jpeg);
//!
//! let manifest = build_manifest(out, &config).unwrap();
//! assert_eq!(find_entry(&manifest, "work/hero.avif").size, 1234);
//! ```

use crate::manifest::{Manifest, ManifestEntry};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::path::Path;

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a `width`x`height` gradient image in `format`, creating parent
/// directories as needed.
///
/// GIF is written as RGBA (the encoder works on RGBA frames); every other
/// format gets plain RGB.
pub fn write_test_image(path: &Path, width: u32, height: u32, format: ImageFormat) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let shade = |x: u32, y: u32| {
        (
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128u8,
        )
    };
    let img = if format == ImageFormat::Gif {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            let (r, g, b) = shade(x, y);
            Rgba([r, g, b, 255])
        }))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let (r, g, b) = shade(x, y);
            Rgb([r, g, b])
        }))
    };
    img.save_with_format(path, format).unwrap();
}

// =========================================================================
// Manifest lookups
// =========================================================================

/// Find a manifest entry by its relative path. Panics if not found.
pub fn find_entry<'a>(manifest: &'a Manifest, path: &str) -> &'a ManifestEntry {
    manifest
        .images
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| {
            panic!(
                "entry '{path}' not found. Available: {:?}",
                entry_paths(manifest)
            )
        })
}

/// All entry paths in manifest order.
pub fn entry_paths(manifest: &Manifest) -> Vec<&str> {
    manifest.images.iter().map(|e| e.path.as_str()).collect()
}
