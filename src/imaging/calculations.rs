//! Pure calculation functions for thumbnail geometry.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::Dimensions;
use super::params::Canvas;

/// Where the foreground lands inside the canvas, and how large it is.
///
/// Fields are kept real-valued; the `pixel_*` accessors truncate toward zero
/// and are what gets handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitLayout {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub left: f64,
}

impl FitLayout {
    pub fn pixel_width(&self) -> u32 {
        self.width as u32
    }

    pub fn pixel_height(&self) -> u32 {
        self.height as u32
    }

    /// Signed: a landscape region squarer than the canvas overflows it
    /// vertically and sits at a negative offset.
    pub fn pixel_top(&self) -> i64 {
        self.top as i64
    }

    pub fn pixel_left(&self) -> i64 {
        self.left as i64
    }
}

/// Fit a region inside the canvas, preserving its aspect ratio.
///
/// Landscape regions fill the canvas width and are centered vertically.
/// Everything else (portrait *and* square) fills the canvas height and is
/// centered horizontally.
///
/// Both `dims.width` and `dims.height` must be non-zero; callers reject
/// degenerate regions before getting here.
///
/// # Examples
/// ```
/// # use blurframe::imaging::{Canvas, Dimensions, fit_layout};
/// let layout = fit_layout(Dimensions { width: 800, height: 600 }, Canvas::default());
/// assert_eq!((layout.pixel_width(), layout.pixel_height()), (400, 300));
/// assert_eq!((layout.pixel_left(), layout.pixel_top()), (0, 0));
/// ```
pub fn fit_layout(dims: Dimensions, canvas: Canvas) -> FitLayout {
    let width = dims.width as f64;
    let height = dims.height as f64;
    let canvas_w = canvas.width as f64;
    let canvas_h = canvas.height as f64;

    if width > height {
        let scaled_h = height * (canvas_w / width);
        FitLayout {
            width: canvas_w,
            height: scaled_h,
            top: (canvas_h - scaled_h) / 2.0,
            left: 0.0,
        }
    } else {
        // Portrait or square: height is pinned to the canvas
        let scaled_w = width * (canvas_h / height);
        FitLayout {
            width: scaled_w,
            height: canvas_h,
            top: 0.0,
            left: (canvas_w - scaled_w) / 2.0,
        }
    }
}

/// Largest window inside `source` with the aspect ratio of `target`.
///
/// Crop-to-fill cuts this window out of the source first and only then
/// resizes it to `target`, so the intermediate image never exceeds the
/// source. Both sides are at least 1 and never exceed the source.
///
/// # Arguments
/// * `source` - Original image dimensions (width, height)
/// * `target` - Target area dimensions (width, height)
pub fn calculate_cover_window(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: keep full height, trim the sides
        let w = (src_h as f64 * tgt_aspect).round() as u32;
        (w.clamp(1, src_w), src_h)
    } else {
        // Source is taller: keep full width, trim top and bottom
        let h = (src_w as f64 / tgt_aspect).round() as u32;
        (src_w, h.clamp(1, src_h))
    }
}
