//! Pure calculation functions for image dimensions and file sizes.
//!
//! All functions here are pure and testable without any I/O or images.

use crate::config::Breakpoint;

/// Scale `original` down to `target_width`, keeping the aspect ratio.
///
/// "Fit inside" semantics: the width is bounded, the height follows, and the
/// result is never larger than the original.
///
/// # Examples
/// ```
/// # use folio_images::imaging::fit_to_width;
/// assert_eq!(fit_to_width((2000, 1500), 800), (800, 600));
/// // Never upscales
/// assert_eq!(fit_to_width((300, 300), 400), (300, 300));
/// ```
pub fn fit_to_width(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if target_width >= orig_w || orig_w == 0 {
        return original;
    }
    let ratio = target_width as f64 / orig_w as f64;
    let height = ((orig_h as f64 * ratio).round() as u32).max(1);
    (target_width, height)
}

/// A breakpoint that applies to a given source, with its output dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSize {
    pub label: String,
    pub width: u32,
    pub height: u32,
}

/// Calculate which breakpoints apply to a source and their output dimensions.
///
/// A breakpoint applies when its width is at most the source width. Wider
/// breakpoints are dropped, so small sources yield fewer (possibly zero)
/// sized derivatives. Configuration order is preserved.
pub fn applicable_breakpoints(
    original: (u32, u32),
    breakpoints: &[Breakpoint],
) -> Vec<PlannedSize> {
    breakpoints
        .iter()
        .filter(|bp| bp.width <= original.0)
        .map(|bp| {
            let (width, height) = fit_to_width(original, bp.width);
            PlannedSize {
                label: bp.label.clone(),
                width,
                height,
            }
        })
        .collect()
}

/// Percentage of bytes saved going from `original_bytes` to `new_bytes`.
///
/// Negative when the new file is larger. Zero for an empty original.
pub fn size_reduction_percent(original_bytes: u64, new_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 0.0;
    }
    (original_bytes as f64 - new_bytes as f64) / original_bytes as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakpoints(widths: &[(&str, u32)]) -> Vec<Breakpoint> {
        widths
            .iter()
            .map(|(label, width)| Breakpoint {
                label: label.to_string(),
                width: *width,
            })
            .collect()
    }

    fn standard() -> Vec<Breakpoint> {
        breakpoints(&[
            ("small", 400),
            ("medium", 800),
            ("large", 1200),
            ("extra-large", 1600),
        ])
    }

    // =========================================================================
    // fit_to_width tests
    // =========================================================================

    #[test]
    fn fit_landscape() {
        // 2000x1500 → 800 wide: 1500 * 0.4 = 600
        assert_eq!(fit_to_width((2000, 1500), 800), (800, 600));
    }

    #[test]
    fn fit_portrait_bounds_width_only() {
        // Height is free: 1500x2000 → 750 wide gives 1000 tall
        assert_eq!(fit_to_width((1500, 2000), 750), (750, 1000));
    }

    #[test]
    fn fit_rounds_height() {
        // 1000x333 → 400 wide: 333 * 0.4 = 133.2
        assert_eq!(fit_to_width((1000, 333), 400), (400, 133));
    }

    #[test]
    fn fit_never_upscales() {
        assert_eq!(fit_to_width((300, 200), 400), (300, 200));
    }

    #[test]
    fn fit_equal_width_is_identity() {
        assert_eq!(fit_to_width((800, 600), 800), (800, 600));
    }

    #[test]
    fn fit_keeps_at_least_one_pixel_height() {
        assert_eq!(fit_to_width((4000, 1), 400), (400, 1));
    }

    // =========================================================================
    // applicable_breakpoints tests
    // =========================================================================

    #[test]
    fn all_breakpoints_apply_to_large_source() {
        let sizes = applicable_breakpoints((2000, 1500), &standard());
        let labels: Vec<&str> = sizes.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["small", "medium", "large", "extra-large"]);
        assert_eq!(sizes[3].width, 1600);
        assert_eq!(sizes[3].height, 1200);
    }

    #[test]
    fn wider_breakpoints_are_skipped() {
        let sizes = applicable_breakpoints((1000, 800), &standard());
        let labels: Vec<&str> = sizes.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["small", "medium"]);
    }

    #[test]
    fn breakpoint_equal_to_width_applies() {
        let sizes = applicable_breakpoints((800, 800), &standard());
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[1].width, 800);
    }

    #[test]
    fn small_source_gets_no_breakpoints() {
        assert!(applicable_breakpoints((300, 300), &standard()).is_empty());
    }

    #[test]
    fn tall_narrow_source_uses_width_not_longer_edge() {
        // 500 wide, 3000 tall: only "small" fits despite the long edge
        let sizes = applicable_breakpoints((500, 3000), &standard());
        assert_eq!(sizes.len(), 1);
        assert_eq!(sizes[0].width, 400);
        assert_eq!(sizes[0].height, 2400);
    }

    #[test]
    fn configuration_order_is_preserved() {
        let bps = breakpoints(&[("b", 800), ("a", 400)]);
        let sizes = applicable_breakpoints((1000, 1000), &bps);
        assert_eq!(sizes[0].label, "b");
        assert_eq!(sizes[1].label, "a");
    }

    #[test]
    fn no_planned_size_exceeds_source() {
        for source in [(399, 10), (400, 10), (1201, 900), (5000, 5000)] {
            for size in applicable_breakpoints(source, &standard()) {
                assert!(size.width <= source.0);
                assert!(size.height <= source.1);
            }
        }
    }

    // =========================================================================
    // size_reduction_percent tests
    // =========================================================================

    #[test]
    fn reduction_percent() {
        assert_eq!(size_reduction_percent(1000, 250), 75.0);
    }

    #[test]
    fn reduction_negative_when_larger() {
        assert_eq!(size_reduction_percent(100, 150), -50.0);
    }

    #[test]
    fn reduction_of_empty_original_is_zero() {
        assert_eq!(size_reduction_percent(0, 10), 0.0);
    }
}
