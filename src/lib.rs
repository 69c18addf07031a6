//! # folio-images
//!
//! Build-time responsive image pipeline for a portfolio site. Point it at a
//! directory of raster images and it writes resized AVIF derivatives at fixed
//! breakpoints, a legacy-format fallback for JPEG and PNG sources, one
//! full-size AVIF per source, and a JSON manifest describing the result.
//!
//! # Architecture: Three-Stage Pipeline
//!
//! ```text
//! 1. Discover   assets/images/  →  [ImageFile]            (sorted, symlinks followed)
//! 2. Convert    [ImageFile]     →  public/images/**       (one image at a time)
//! 3. Manifest   public/images/  →  image-manifest.json    (re-scan of the output)
//! ```
//!
//! Stages run strictly in order. Within stage 2 each image's derivatives are
//! encoded concurrently and the image succeeds or fails as a unit; a failed
//! image is logged and the run continues. Errors outside that boundary
//! (creating the output root, discovery, writing the manifest) end the run.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`discover`] | Stage 1: recursive, extension-filtered walk of the input tree |
//! | [`convert`] | Stage 2 and the run entry point ([`convert::run`]) |
//! | [`manifest`] | Stage 3: output re-scan and `image-manifest.json` |
//! | [`imaging`] | Pure-Rust identify, resize and encode; derivative planning |
//! | [`config`] | `folio-images.toml` loading, merging onto stock defaults, validation |
//! | [`naming`] | Derivative file names and the mirrored output layout |
//! | [`output`] | CLI output formatting for progress events and summaries |
//!
//! # Embedding
//!
//! ```no_run
//! use folio_images::{config::Config, convert};
//!
//! let summary = convert::run(&Config::default())?;
//! println!("{} converted, {} failed", summary.converted.len(), summary.failed.len());
//! # Ok::<(), convert::ConvertError>(())
//! ```
//!
//! # Design Decisions
//!
//! ## AVIF Plus One Fallback
//!
//! Every derivative is AVIF. JPEG and PNG sources additionally get a fallback
//! in their own format at each breakpoint, for `<picture>` elements that must
//! serve older clients. GIF, TIFF and BMP sources get no fallback: none of
//! them is a sensible web delivery format.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling) and
//! `rav1e` through it for AVIF. No system libraries, so the pipeline runs the
//! same on a laptop and in CI.
//!
//! ## The Manifest Describes the Disk
//!
//! The manifest is built from a re-scan of the output root rather than from
//! what the run reports. It lists derivatives left by earlier runs as well,
//! and its sizes are whatever is on disk when it is written.

pub mod config;
pub mod convert;
pub mod discover;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
