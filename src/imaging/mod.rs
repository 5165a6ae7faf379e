//! Image processing: pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Extract** | `DynamicImage::crop_imm` |
//! | **Measure** | `ImageReader::into_dimensions` |
//! | **Resize** | Lanczos3 `resize_exact` |
//! | **Composite** | cover resize + Gaussian blur + `imageops::overlay` → JPEG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for layout math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: The compositor, combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{FitLayout, calculate_cover_window, fit_layout};
pub use operations::{
    Stage, ThumbnailConfig, ThumbnailError, create_thumbnail, get_dimensions, plan_composite,
    plan_foreground,
};
pub use params::{
    Canvas, CompositeParams, ExtractRect, Gravity, Quality, RectViolation, Region, ResizeParams,
    Watermark,
};
pub use rust_backend::RustBackend;
