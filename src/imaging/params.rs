//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides what to render) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`ExtractRect`] — Crop window exactly as the client sent it. Untrusted.
//! - [`Region`] — A crop window that passed [`ExtractRect::to_region`].
//! - [`Canvas`] — Fixed output size (400×300 by default).
//! - [`Quality`] — Lossy encoding quality (1–100, default 95). Clamped on construction.
//! - [`Gravity`] — Which part of the cover-resized backdrop survives the crop.
//! - [`ResizeParams`] — Foreground render: source buffer, target size, enlarge flag.
//! - [`CompositeParams`] — Backdrop render: crop-to-fill, blur, quality, watermark.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crop window into the source image, in pixels, as supplied by the caller.
///
/// Values come straight from the request and are not trusted; convert with
/// [`to_region`](Self::to_region) before handing them to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractRect {
    pub top: i64,
    pub left: i64,
    pub width: i64,
    pub height: i64,
}

/// Why an [`ExtractRect`] was refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RectViolation {
    #[error("offset must be non-negative (top={top}, left={left})")]
    NegativeOffset { top: i64, left: i64 },
    #[error("area must be positive (width={width}, height={height})")]
    EmptyArea { width: i64, height: i64 },
    #[error("{0} does not fit in 32 bits")]
    TooLarge(&'static str),
}

impl ExtractRect {
    pub fn new(top: i64, left: i64, width: i64, height: i64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    /// Validate the rectangle's shape.
    ///
    /// Rejects negative offsets and zero or negative extents. Bounds against
    /// the actual source are left to the backend, which is the only place
    /// that knows the decoded size.
    pub fn to_region(&self) -> Result<Region, RectViolation> {
        if self.top < 0 || self.left < 0 {
            return Err(RectViolation::NegativeOffset {
                top: self.top,
                left: self.left,
            });
        }
        if self.width <= 0 || self.height <= 0 {
            return Err(RectViolation::EmptyArea {
                width: self.width,
                height: self.height,
            });
        }
        let narrow = |value: i64, field: &'static str| {
            u32::try_from(value).map_err(|_| RectViolation::TooLarge(field))
        };
        Ok(Region {
            top: narrow(self.top, "top")?,
            left: narrow(self.left, "left")?,
            width: narrow(self.width, "width")?,
            height: narrow(self.height, "height")?,
        })
    }
}

/// Validated, non-empty crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

/// Output canvas size. Every thumbnail is exactly this big.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 400,
            height: 300,
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Anchor for the crop window after a cover resize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gravity {
    #[default]
    Centre,
    North,
    South,
    East,
    West,
}

impl Gravity {
    /// Top-left corner of a `crop` window inside a `fill` area.
    pub fn offset(self, fill: (u32, u32), crop: (u32, u32)) -> (u32, u32) {
        let spare_x = fill.0.saturating_sub(crop.0);
        let spare_y = fill.1.saturating_sub(crop.1);
        match self {
            Self::Centre => (spare_x / 2, spare_y / 2),
            Self::North => (spare_x / 2, 0),
            Self::South => (spare_x / 2, spare_y),
            Self::East => (spare_x, spare_y / 2),
            Self::West => (0, spare_y / 2),
        }
    }
}

/// Parameters for the foreground resize.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams<'a> {
    pub source: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Allow the output to be larger than the source.
    pub enlarge: bool,
}

/// Image placed on top of the backdrop, offset from its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark<'a> {
    pub buffer: &'a [u8],
    pub left: i64,
    pub top: i64,
}

/// Parameters for the final render: backdrop plus watermark.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeParams<'a> {
    pub source: &'a [u8],
    pub canvas: Canvas,
    pub gravity: Gravity,
    /// Gaussian blur sigma; zero disables the blur.
    pub blur_sigma: f32,
    /// Cover-resize and crop to the canvas instead of stretching.
    pub crop: bool,
    pub quality: Quality,
    pub enlarge: bool,
    pub watermark: Watermark<'a>,
}
