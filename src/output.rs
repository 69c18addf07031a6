//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Convert
//!
//! ```text
//! Converting 3 images: assets/images → public/images
//! 001 work/hero.jpg (2000x1500 JPEG)
//!     small, medium, large, extra-large → 9 files
//!     Full size: 1.8 MB → 412.3 KB (77.6% smaller)
//! 002 logo.png (300x300 PNG)
//!     No breakpoint applied, full size only → 1 file
//!     Full size: 20.1 KB → 9.4 KB (53.2% smaller)
//! 003 broken.jpg FAILED
//!     Image processing failed: Processing failed: Failed to decode ...
//! Manifest → public/images/image-manifest.json (10 files)
//!
//! Converted 2 images, 1 failed in 4.21s
//!     broken.jpg
//! ```
//!
//! ## Check
//!
//! ```text
//! 2 images in assets/images
//! 001 work/hero.jpg
//! 002 logo.png
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::convert::{ConvertEvent, ImageReport, RunSummary, SizeSavings};
use crate::discover::ImageFile;
use crate::naming::to_slash_path;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Human-readable byte size with one decimal above 1 KB.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn format_savings(savings: &SizeSavings) -> String {
    let change = if savings.percent >= 0.0 {
        format!("{:.1}% smaller", savings.percent)
    } else {
        format!("{:.1}% larger", -savings.percent)
    };
    format!(
        "Full size: {} \u{2192} {} ({})",
        format_bytes(savings.source_bytes),
        format_bytes(savings.avif_bytes),
        change
    )
}

fn format_report(index: usize, report: &ImageReport) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} ({}x{} {})",
        format_index(index),
        to_slash_path(&report.source),
        report.width,
        report.height,
        report.format.name().to_uppercase()
    )];

    let files = plural(report.derivatives.len(), "file");
    if report.no_breakpoint_applied() {
        lines.push(format!(
            "{}No breakpoint applied, full size only \u{2192} {}",
            indent(1),
            files
        ));
    } else {
        lines.push(format!(
            "{}{} \u{2192} {}",
            indent(1),
            report.applied_breakpoints.join(", "),
            files
        ));
    }

    if let Some(savings) = &report.savings {
        lines.push(format!("{}{}", indent(1), format_savings(savings)));
    }
    lines
}

/// Format a single conversion progress event as display lines.
pub fn format_convert_event(event: &ConvertEvent) -> Vec<String> {
    match event {
        ConvertEvent::Started {
            input,
            image_count: 0,
            ..
        } => vec![format!("No images found in {}", input.display())],
        ConvertEvent::Started {
            input,
            output,
            image_count,
        } => vec![format!(
            "Converting {}: {} \u{2192} {}",
            plural(*image_count, "image"),
            input.display(),
            output.display()
        )],
        ConvertEvent::ImageConverted { index, report, .. } => format_report(*index, report),
        ConvertEvent::ImageFailed { index, failure, .. } => vec![
            format!(
                "{} {} FAILED",
                format_index(*index),
                to_slash_path(&failure.source)
            ),
            format!("{}{}", indent(1), failure.error),
        ],
        ConvertEvent::ManifestWritten { path, entries } => vec![format!(
            "Manifest \u{2192} {} ({})",
            path.display(),
            plural(*entries, "file")
        )],
    }
}

/// Format the closing summary of a run.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Converted {}, {} failed in {:.2}s",
        plural(summary.converted.len(), "image"),
        summary.failed.len(),
        summary.elapsed.as_secs_f64()
    )];
    for failure in &summary.failed {
        lines.push(format!("{}{}", indent(1), to_slash_path(&failure.source)));
    }
    lines
}

/// Print the closing summary of a run to stdout.
pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

/// Format the discovery listing shown by `check`.
pub fn format_check_output(images: &[ImageFile], input: &Path) -> Vec<String> {
    let mut lines = vec![format!(
        "{} in {}",
        plural(images.len(), "image"),
        input.display()
    )];
    for (i, image) in images.iter().enumerate() {
        lines.push(format!(
            "{} {}",
            format_index(i + 1),
            to_slash_path(&image.relative)
        ));
    }
    lines
}

/// Print the discovery listing to stdout.
pub fn print_check_output(images: &[ImageFile], input: &Path) {
    for line in format_check_output(images, input) {
        println!("{}", line);
    }
}
