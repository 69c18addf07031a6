//! Batch conversion.
//!
//! Stage 2 of the pipeline, and the entry point that drives all three stages:
//!
//! ```text
//! create output root → discover sources → convert each image → write manifest
//! ```
//!
//! Images are handled strictly one after another. Inside one image every
//! derivative is encoded concurrently (see
//! [`create_derivatives`](crate::imaging::create_derivatives)), and the image
//! fails as a unit if any of them fails. A failing image is logged and
//! reported, then the run moves on; only errors outside the per-image boundary
//! (config, output root, discovery, manifest) abort the run.
//!
//! ## Output Structure
//!
//! ```text
//! public/images/
//! ├── image-manifest.json
//! └── work/
//!     ├── hero-small.avif
//!     ├── hero-small.jpg         # fallback, JPEG sources only
//!     ├── hero-medium.avif
//!     ├── hero-medium.jpg
//!     └── hero.avif              # full size
//! ```
//!
//! Progress is reported as [`ConvertEvent`]s over an optional channel so a
//! caller can render it while the run is in flight.

use crate::config::{Config, ConfigError};
use crate::discover::{self, DiscoverError, ImageFile};
use crate::imaging::{
    BackendError, ConversionResult, Encoding, ImageBackend, RustBackend, SourceFormat, Variant,
    PlannedDerivative, create_derivatives, get_source_info, plan_derivatives,
    size_reduction_percent,
};
use crate::manifest::{self, ManifestError};
use crate::naming::{mirrored_dir, source_stem};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("derivative name collision with {other}: {output}")]
    NameCollision { output: PathBuf, other: PathBuf },
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Discovery failed: {0}")]
    Discover(#[from] DiscoverError),
    #[error("Manifest failed: {0}")]
    Manifest(#[from] ManifestError),
}

/// Source vs. full-size AVIF byte sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeSavings {
    pub source_bytes: u64,
    pub avif_bytes: u64,
    /// Negative when the AVIF is larger than the source.
    pub percent: f64,
}

/// Outcome of converting one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    /// Source path relative to the input root.
    pub source: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: SourceFormat,
    /// Every derivative written, in plan order.
    pub derivatives: Vec<ConversionResult>,
    /// Labels of breakpoints that produced sized derivatives.
    pub applied_breakpoints: Vec<String>,
    pub savings: Option<SizeSavings>,
}

impl ImageReport {
    /// The image was only copied at full size because every breakpoint is
    /// wider than the source.
    pub fn no_breakpoint_applied(&self) -> bool {
        self.applied_breakpoints.is_empty()
    }
}

/// A source that failed to convert.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Progress events emitted during a run.
#[derive(Debug, Clone)]
pub enum ConvertEvent {
    /// Discovery finished; `image_count` sources will be converted.
    Started {
        input: PathBuf,
        output: PathBuf,
        image_count: usize,
    },
    ImageConverted {
        index: usize,
        total: usize,
        report: ImageReport,
    },
    ImageFailed {
        index: usize,
        total: usize,
        failure: ImageFailure,
    },
    ManifestWritten { path: PathBuf, entries: usize },
}

/// What a finished run did.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub converted: Vec<ImageReport>,
    pub failed: Vec<ImageFailure>,
    /// Files listed in the manifest.
    pub manifest_entries: usize,
    pub elapsed: Duration,
}

/// Run the whole pipeline with the pure-Rust backend.
pub fn run(config: &Config) -> Result<RunSummary, ConvertError> {
    run_with_backend(&RustBackend::new(), config, None)
}

/// Run the whole pipeline with a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    config: &Config,
    events: Option<Sender<ConvertEvent>>,
) -> Result<RunSummary, ConvertError> {
    let started = Instant::now();
    let emit = |event: ConvertEvent| {
        if let Some(tx) = &events {
            // The receiver going away only stops progress output.
            let _ = tx.send(event);
        }
    };

    config.validate()?;
    create_dir(&config.output_dir)?;
    let images = discover::discover_images(&config.input_dir)?;
    let total = images.len();
    tracing::info!(
        input = %config.input_dir.display(),
        images = total,
        "discovered source images"
    );
    emit(ConvertEvent::Started {
        input: config.input_dir.clone(),
        output: config.output_dir.clone(),
        image_count: total,
    });

    let mut converted = Vec::new();
    let mut failed = Vec::new();
    let mut claims = OutputClaims::default();
    for (i, image) in images.iter().enumerate() {
        let index = i + 1;
        match convert_image(backend, image, &config.output_dir, config, &mut claims) {
            Ok(report) => {
                emit(ConvertEvent::ImageConverted {
                    index,
                    total,
                    report: report.clone(),
                });
                converted.push(report);
            }
            Err(e) => {
                tracing::error!(source = %image.path.display(), error = %e, "image failed");
                let failure = ImageFailure {
                    source: image.relative.clone(),
                    error: e.to_string(),
                };
                emit(ConvertEvent::ImageFailed {
                    index,
                    total,
                    failure: failure.clone(),
                });
                failed.push(failure);
            }
        }
    }

    let manifest = manifest::emit_manifest(&config.output_dir, config)?;
    emit(ConvertEvent::ManifestWritten {
        path: manifest::manifest_path(&config.output_dir),
        entries: manifest.images.len(),
    });

    let summary = RunSummary {
        converted,
        failed,
        manifest_entries: manifest.images.len(),
        elapsed: started.elapsed(),
    };
    tracing::info!(
        converted = summary.converted.len(),
        failed = summary.failed.len(),
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run finished"
    );
    Ok(summary)
}

/// Output paths already taken by earlier sources of the same run.
///
/// Sources sharing a stem in one folder (`hero.jpg`, `hero.png`) map to the
/// same derivative names; the first one in discovery order keeps them.
#[derive(Debug, Default)]
pub struct OutputClaims {
    owners: HashMap<PathBuf, PathBuf>,
}

impl OutputClaims {
    /// Claim every output of `plan` for `source`, or none of them when one
    /// is already owned by another source.
    pub fn claim(
        &mut self,
        plan: &[PlannedDerivative],
        source: &Path,
    ) -> Result<(), ConvertError> {
        if let Some((output, other)) = plan
            .iter()
            .find_map(|p| self.owners.get_key_value(&p.params.output))
        {
            return Err(ConvertError::NameCollision {
                output: output.clone(),
                other: other.clone(),
            });
        }
        for p in plan {
            self.owners.insert(p.params.output.clone(), source.to_path_buf());
        }
        Ok(())
    }
}

/// Convert one source image into all of its derivatives.
///
/// The derivative directory is created only once the source has been
/// identified and its output names claimed, right before the first
/// derivative is written.
pub fn convert_image(
    backend: &impl ImageBackend,
    image: &ImageFile,
    output_root: &Path,
    config: &Config,
    claims: &mut OutputClaims,
) -> Result<ImageReport, ConvertError> {
    let info = get_source_info(backend, &image.path)?;

    let out_dir = mirrored_dir(output_root, &image.relative);
    let plan = plan_derivatives(
        &image.path,
        &out_dir,
        &source_stem(&image.relative),
        info,
        &config.breakpoints,
        &config.quality,
    );
    claims.claim(&plan, &image.relative)?;

    create_dir(&out_dir)?;
    let derivatives = create_derivatives(backend, &plan)?;

    let applied_breakpoints: Vec<String> = derivatives
        .iter()
        .filter(|d| d.encoding == Encoding::Avif)
        .filter_map(|d| match &d.variant {
            Variant::Breakpoint(label) => Some(label.clone()),
            Variant::Full => None,
        })
        .collect();
    if applied_breakpoints.is_empty() {
        tracing::info!(
            source = %image.relative.display(),
            width = info.width,
            "no breakpoint applied, full size only"
        );
    }

    let savings = derivatives
        .iter()
        .find(|d| d.variant == Variant::Full)
        .and_then(|full| measure_savings(&image.path, &full.output));

    Ok(ImageReport {
        source: image.relative.clone(),
        width: info.width,
        height: info.height,
        format: info.format,
        derivatives,
        applied_breakpoints,
        savings,
    })
}

fn measure_savings(source: &Path, avif: &Path) -> Option<SizeSavings> {
    let source_bytes = fs::metadata(source).ok()?.len();
    let avif_bytes = fs::metadata(avif).ok()?.len();
    Some(SizeSavings {
        source_bytes,
        avif_bytes,
        percent: size_reduction_percent(source_bytes, avif_bytes),
    })
}

fn create_dir(path: &Path) -> Result<(), ConvertError> {
    fs::create_dir_all(path).map_err(|source| ConvertError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}
