//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they plan the
//! derivatives a source needs from the configuration, then run every encode
//! concurrently and judge the image as a unit.

use super::backend::{BackendError, ImageBackend, SourceInfo};
use super::calculations::{PlannedSize, applicable_breakpoints};
use super::params::{DerivativeParams, Encoding, Variant};
use crate::config::{Breakpoint, QualityConfig};
use crate::naming::derivative_file_name;
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Identify a source image using the backend.
pub fn get_source_info(backend: &impl ImageBackend, path: &Path) -> Result<SourceInfo> {
    backend.identify(path)
}

/// One derivative to produce: which variant it is and how to encode it.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedDerivative {
    pub variant: Variant,
    pub params: DerivativeParams,
}

/// A derivative that was written successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionResult {
    pub variant: Variant,
    pub encoding: Encoding,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Plan every derivative for one source without executing anything.
///
/// Per applicable breakpoint: AVIF, then the format's fallback if it has one.
/// Last: the full-size AVIF.
pub fn plan_derivatives(
    source: &Path,
    output_dir: &Path,
    stem: &str,
    info: SourceInfo,
    breakpoints: &[Breakpoint],
    quality: &QualityConfig,
) -> Vec<PlannedDerivative> {
    let mut plan = Vec::new();
    let make = |variant: Variant, encoding: Encoding, width: u32, height: u32| {
        let output = output_dir.join(derivative_file_name(stem, &variant, encoding));
        PlannedDerivative {
            variant,
            params: DerivativeParams {
                source: source.to_path_buf(),
                output,
                width,
                height,
                encoding,
                quality: quality.for_encoding(encoding),
            },
        }
    };

    for PlannedSize {
        label,
        width,
        height,
    } in applicable_breakpoints(info.dimensions(), breakpoints)
    {
        let variant = Variant::Breakpoint(label);
        plan.push(make(variant.clone(), Encoding::Avif, width, height));
        if let Some(fallback) = info.format.fallback() {
            plan.push(make(variant, fallback, width, height));
        }
    }

    plan.push(make(Variant::Full, Encoding::Avif, info.width, info.height));
    plan
}

/// Encode all planned derivatives concurrently.
///
/// Waits for every encode to finish before deciding: if any failed, the
/// first failure (in plan order) is returned and derivatives that were
/// already written are left in place.
pub fn create_derivatives(
    backend: &impl ImageBackend,
    plan: &[PlannedDerivative],
) -> Result<Vec<ConversionResult>> {
    let outcomes: Vec<Result<ConversionResult>> = plan
        .par_iter()
        .map(|planned| {
            backend.encode(&planned.params)?;
            tracing::debug!(
                output = %planned.params.output.display(),
                width = planned.params.width,
                encoding = %planned.params.encoding,
                "derivative written"
            );
            Ok(ConversionResult {
                variant: planned.variant.clone(),
                encoding: planned.params.encoding,
                output: planned.params.output.clone(),
                width: planned.params.width,
                height: planned.params.height,
            })
        })
        .collect();

    for (planned, outcome) in plan.iter().zip(&outcomes) {
        if let Err(e) = outcome {
            tracing::warn!(
                output = %planned.params.output.display(),
                error = %e,
                "derivative failed"
            );
        }
    }

    outcomes.into_iter().collect()
}
