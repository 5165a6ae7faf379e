//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::load_from_memory` |
//! | Measure | `ImageReader::into_dimensions` (header only, no full decode) |
//! | Extract | `DynamicImage::crop_imm` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Crop-to-fill | [`Gravity`] crop window in source pixels, then resize |
//! | Blur | `DynamicImage::blur` (Gaussian) |
//! | Watermark | `image::imageops::overlay` |
//! | Encode (intermediate) | PNG, lossless |
//! | Encode (final) | `image::codecs::jpeg::JpegEncoder` at the requested quality |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::calculate_cover_window;
use super::params::{CompositeParams, Gravity, Quality, Region, ResizeParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(buffer: &[u8]) -> Result<DynamicImage, BackendError> {
    image::load_from_memory(buffer).map_err(|e| BackendError::Decode(e.to_string()))
}

/// Encode lossless for hand-off between pipeline stages.
fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {e}")))?;
    Ok(buf)
}

/// JPEG has no alpha channel, so flatten to RGB first.
fn encode_jpeg(img: &DynamicImage, quality: Quality) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality.value() as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {e}")))?;
    Ok(buf)
}

/// Cut the `target`-shaped window at `gravity` out of `img`, then resize it
/// to `target`.
fn fill_and_crop(img: &DynamicImage, target: (u32, u32), gravity: Gravity) -> DynamicImage {
    let window = calculate_cover_window(img.dimensions(), target);
    let (x, y) = gravity.offset(img.dimensions(), window);
    img.crop_imm(x, y, window.0, window.1)
        .resize_exact(target.0, target.1, FilterType::Lanczos3)
}

impl ImageBackend for RustBackend {
    fn extract(&self, source: &[u8], region: Region) -> Result<Vec<u8>, BackendError> {
        let img = decode(source)?;
        let (image_width, image_height) = img.dimensions();

        let right = region.left.checked_add(region.width);
        let bottom = region.top.checked_add(region.height);
        let fits =
            right.is_some_and(|r| r <= image_width) && bottom.is_some_and(|b| b <= image_height);
        if !fits {
            return Err(BackendError::OutOfBounds {
                top: region.top,
                left: region.left,
                width: region.width,
                height: region.height,
                image_width,
                image_height,
            });
        }

        let cropped = img.crop_imm(region.left, region.top, region.width, region.height);
        encode_png(&cropped)
    }

    fn measure(&self, buffer: &[u8]) -> Result<Dimensions, BackendError> {
        let (width, height) = ImageReader::new(Cursor::new(buffer))
            .with_guessed_format()?
            .into_dimensions()
            .map_err(|e| BackendError::Decode(format!("Failed to read dimensions: {e}")))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(params.source)?;
        let (src_w, src_h) = img.dimensions();

        if !params.enlarge && (params.width > src_w || params.height > src_h) {
            return encode_png(&img);
        }

        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        encode_png(&resized)
    }

    fn composite(&self, params: &CompositeParams) -> Result<Vec<u8>, BackendError> {
        let img = decode(params.source)?;
        let canvas = (params.canvas.width, params.canvas.height);
        let (src_w, src_h) = img.dimensions();

        if !params.enlarge && src_w < canvas.0 && src_h < canvas.1 {
            return Err(BackendError::ProcessingFailed(format!(
                "Source {src_w}x{src_h} is smaller than canvas {}x{} and enlargement is disabled",
                canvas.0, canvas.1
            )));
        }

        let backdrop = if params.crop {
            fill_and_crop(&img, canvas, params.gravity)
        } else {
            img.resize_exact(canvas.0, canvas.1, FilterType::Lanczos3)
        };

        let mut backdrop = if params.blur_sigma > 0.0 {
            backdrop.blur(params.blur_sigma)
        } else {
            backdrop
        };

        let watermark = decode(params.watermark.buffer)?;
        image::imageops::overlay(
            &mut backdrop,
            &watermark,
            params.watermark.left,
            params.watermark.top,
        );

        encode_jpeg(&backdrop, params.quality)
    }
}
