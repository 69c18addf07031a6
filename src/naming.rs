//! Output naming for derivatives.
//!
//! Every derivative lands next to its siblings in a directory that mirrors
//! the source's position under the input root:
//!
//! ```text
//! assets/images/work/hero.jpg
//!   → public/images/work/hero-small.avif
//!   → public/images/work/hero-small.jpg
//!   → public/images/work/hero.avif          (full size)
//! ```
//!
//! Sized derivatives are `<stem>-<label>.<ext>`; the full-size AVIF is
//! `<stem>.<ext>`.

use crate::imaging::{Encoding, Variant};
use std::path::{Component, Path, PathBuf};

/// File name of a derivative.
///
/// - `("hero", Breakpoint("small"), Avif)` → `"hero-small.avif"`
/// - `("hero", Breakpoint("small"), Jpeg)` → `"hero-small.jpg"`
/// - `("hero", Full, Avif)` → `"hero.avif"`
pub fn derivative_file_name(stem: &str, variant: &Variant, encoding: Encoding) -> String {
    match variant {
        Variant::Breakpoint(label) => format!("{}-{}.{}", stem, label, encoding.extension()),
        Variant::Full => format!("{}.{}", stem, encoding.extension()),
    }
}

/// File stem of a source path (`work/hero.large.jpg` → `hero.large`).
pub fn source_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Directory a source's derivatives are written to.
///
/// `relative_source` is the source path relative to the input root.
pub fn mirrored_dir(output_root: &Path, relative_source: &Path) -> PathBuf {
    match relative_source.parent() {
        Some(parent) => output_root.join(parent),
        None => output_root.to_path_buf(),
    }
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
