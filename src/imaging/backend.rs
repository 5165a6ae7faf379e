//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations the thumbnail
//! pipeline needs from an image engine: extract, measure, resize, and
//! composite. Buffers in and out are encoded images; the backend owns
//! decoding and encoding.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image`
//! crate.

use super::params::{CompositeParams, Region, ResizeParams};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error(
        "Region {width}x{height}+{left}+{top} exceeds image bounds {image_width}x{image_height}"
    )]
    OutOfBounds {
        top: u32,
        left: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of a measure operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// Every backend must implement all four operations so the compositor stays
/// backend-agnostic. None of them mutate their input.
pub trait ImageBackend: Send + Sync {
    /// Crop `source` to `region`. Fails if the region is outside the image.
    fn extract(&self, source: &[u8], region: Region) -> Result<Vec<u8>, BackendError>;

    /// Get image dimensions.
    fn measure(&self, buffer: &[u8]) -> Result<Dimensions, BackendError>;

    /// Resize to exact dimensions.
    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError>;

    /// Render the canvas-sized, blurred backdrop with the watermark on top.
    fn composite(&self, params: &CompositeParams) -> Result<Vec<u8>, BackendError>;
}
