//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader` (content-sniffed format + dimensions) |
//! | **Resize** | Lanczos3, width-bounded, never upscaling |
//! | **Encode** | AVIF (rav1e), JPEG and PNG fallbacks |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and size math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Plan derivatives and run them as one concurrent unit

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, ImageBackend, SourceInfo};
pub use calculations::{PlannedSize, applicable_breakpoints, fit_to_width, size_reduction_percent};
pub use operations::{
    ConversionResult, PlannedDerivative, create_derivatives, get_source_info, plan_derivatives,
};
pub use params::{
    DERIVATIVE_EXTENSIONS, DerivativeParams, Encoding, Quality, SourceFormat, Variant,
};
pub use rust_backend::{RustBackend, supported_input_extensions};
