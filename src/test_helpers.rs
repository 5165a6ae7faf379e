//! Shared test utilities for the blurframe test suite.
//!
//! Fixtures are generated in memory so tests never depend on files in the
//! repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let source = synthetic_jpeg(800, 600);
//! let thumb = create_thumbnail(&RustBackend::new(), &source, &rect, &config).unwrap();
//! assert_eq!(decode_dimensions(&thumb), (400, 300));
//! ```

use image::{DynamicImage, ImageEncoder, ImageFormat, RgbImage};
use std::io::Cursor;

// =========================================================================
// Fixture generation
// =========================================================================

/// A gradient JPEG of the given size, encoded at default quality.
pub fn synthetic_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let mut buf = Vec::new();
    image::codecs::jpeg::JpegEncoder::new(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    buf
}

/// A single-color PNG. Lossless, so pixel assertions are exact.
pub fn solid_png(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb(rgb)));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

// =========================================================================
// Assertions
// =========================================================================

/// Decode an encoded buffer and return its `(width, height)`. Panics on
/// undecodable input.
pub fn decode_dimensions(buffer: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(buffer)
        .unwrap_or_else(|e| panic!("buffer of {} bytes did not decode: {e}", buffer.len()));
    (img.width(), img.height())
}
