//! Manifest emission.
//!
//! Stage 3 of the pipeline. After every image has been handled, the output
//! root is re-scanned and `image-manifest.json` is written next to the
//! derivatives:
//!
//! ```json
//! {
//!   "generated": "2026-03-01T12:00:00.000Z",
//!   "breakpoints": { "small": 400, "medium": 800, "large": 1200, "extra-large": 1600 },
//!   "quality": { "avif": 80, "jpeg": 85, "png": 90 },
//!   "images": [
//!     { "path": "work/hero-small.avif", "size": 18234, "modified": "2026-03-01T11:59:58.120Z" }
//!   ]
//! }
//! ```
//!
//! The manifest describes what is on disk, not what this run produced: files
//! left by earlier runs are listed too. It is rewritten in full every run.

use crate::config::{Breakpoint, Config, QualityConfig};
use crate::discover::{self, DiscoverError};
use crate::imaging::DERIVATIVE_EXTENSIONS;
use crate::naming::to_slash_path;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::ser::SerializeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use thiserror::Error;

pub const MANIFEST_FILENAME: &str = "image-manifest.json";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("cannot scan output: {0}")]
    Discover(#[from] DiscoverError),
    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Manifest {
    /// When the manifest was built (RFC 3339, UTC).
    pub generated: String,
    pub breakpoints: BreakpointTable,
    pub quality: QualityConfig,
    pub images: Vec<ManifestEntry>,
}

/// Breakpoints serialized as a `label → width` object in configuration order.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable(pub Vec<Breakpoint>);

impl Serialize for BreakpointTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for bp in &self.0 {
            map.serialize_entry(&bp.label, &bp.width)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManifestEntry {
    /// Relative to the output root, `/`-separated.
    pub path: String,
    /// Size on disk in bytes.
    pub size: u64,
    /// Last modification time (RFC 3339, UTC).
    pub modified: String,
}

/// Path of the manifest inside an output root.
pub fn manifest_path(output_root: &Path) -> PathBuf {
    output_root.join(MANIFEST_FILENAME)
}

fn timestamp(time: impl Into<DateTime<Utc>>) -> String {
    time.into().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn modified_or_epoch(path: &Path, modified: io::Result<SystemTime>) -> SystemTime {
    modified.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "mtime unavailable, using epoch");
        SystemTime::UNIX_EPOCH
    })
}

/// Scan `output_root` for derivatives and describe them.
pub fn build_manifest(output_root: &Path, config: &Config) -> Result<Manifest, ManifestError> {
    let files = discover::discover_files(output_root, DERIVATIVE_EXTENSIONS)?;

    let mut images = Vec::with_capacity(files.len());
    for file in files {
        let meta = match fs::metadata(&file.path) {
            Ok(meta) => meta,
            // Dangling symlink, or removed since the scan
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %file.path.display(), "skipping missing derivative");
                continue;
            }
            Err(source) => {
                return Err(ManifestError::Io {
                    path: file.path.clone(),
                    source,
                });
            }
        };
        let modified = modified_or_epoch(&file.path, meta.modified());
        images.push(ManifestEntry {
            path: to_slash_path(&file.relative),
            size: meta.len(),
            modified: timestamp(modified),
        });
    }

    Ok(Manifest {
        generated: timestamp(Utc::now()),
        breakpoints: BreakpointTable(config.breakpoints.clone()),
        quality: config.quality.clone(),
        images,
    })
}

/// Write `manifest` pretty-printed to `<output_root>/image-manifest.json`,
/// replacing any previous manifest.
pub fn write_manifest(manifest: &Manifest, output_root: &Path) -> Result<PathBuf, ManifestError> {
    let path = manifest_path(output_root);
    let json = serde_json::to_string_pretty(manifest)?;
    fs::write(&path, json).map_err(|source| ManifestError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// Build and write the manifest for `output_root` in one step.
pub fn emit_manifest(output_root: &Path, config: &Config) -> Result<Manifest, ManifestError> {
    let manifest = build_manifest(output_root, config)?;
    let path = write_manifest(&manifest, output_root)?;
    tracing::info!(
        path = %path.display(),
        images = manifest.images.len(),
        "manifest written"
    );
    Ok(manifest)
}
