//! High-level image operations.
//!
//! [`create_thumbnail`] is the compositor: it chains calculations and backend
//! calls into the five-stage pipeline
//!
//! ```text
//! extract → measure → fit → render foreground → render composite
//! ```
//!
//! The backdrop is a *second* render of the extracted region, not a blurred
//! copy of the foreground, so its crop-to-fill framing is independent of the
//! foreground's letterboxed fit.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{FitLayout, fit_layout};
use super::params::{
    Canvas, CompositeParams, ExtractRect, Gravity, Quality, RectViolation, ResizeParams,
    Watermark,
};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Pipeline stage, carried by errors for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extract,
    Measure,
    RenderForeground,
    RenderComposite,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extract => "extract",
            Self::Measure => "measure",
            Self::RenderForeground => "render foreground",
            Self::RenderComposite => "render composite",
        })
    }
}

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("Invalid extract rectangle: {0}")]
    InvalidRect(#[from] RectViolation),
    #[error("{stage} failed: {source}")]
    Extraction {
        stage: Stage,
        #[source]
        source: BackendError,
    },
    #[error("{stage} failed: {source}")]
    Measurement {
        stage: Stage,
        #[source]
        source: BackendError,
    },
    #[error("{stage} failed: {source}")]
    Render {
        stage: Stage,
        #[source]
        source: BackendError,
    },
}

impl ThumbnailError {
    /// The stage that failed, or `None` if the request never reached the backend.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::InvalidRect(_) => None,
            Self::Extraction { stage, .. }
            | Self::Measurement { stage, .. }
            | Self::Render { stage, .. } => Some(*stage),
        }
    }
}

/// Result type for thumbnail operations.
pub type Result<T> = std::result::Result<T, ThumbnailError>;

/// Configuration for thumbnail generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailConfig {
    pub canvas: Canvas,
    pub blur_sigma: f32,
    pub quality: Quality,
    pub gravity: Gravity,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            blur_sigma: 15.0,
            quality: Quality::default(),
            gravity: Gravity::Centre,
        }
    }
}

/// Plan the foreground render without executing it.
///
/// A sliver thinner than one canvas pixel still renders one pixel thick.
pub fn plan_foreground<'a>(extracted: &'a [u8], layout: &FitLayout) -> ResizeParams<'a> {
    ResizeParams {
        source: extracted,
        width: layout.pixel_width().max(1),
        height: layout.pixel_height().max(1),
        enlarge: true,
    }
}

/// Plan the backdrop render, with `foreground` placed at the layout offset.
pub fn plan_composite<'a>(
    extracted: &'a [u8],
    foreground: &'a [u8],
    layout: &FitLayout,
    config: &ThumbnailConfig,
) -> CompositeParams<'a> {
    CompositeParams {
        source: extracted,
        canvas: config.canvas,
        gravity: config.gravity,
        blur_sigma: config.blur_sigma,
        crop: true,
        quality: config.quality,
        enlarge: true,
        watermark: Watermark {
            buffer: foreground,
            left: layout.pixel_left(),
            top: layout.pixel_top(),
        },
    }
}

/// Create a thumbnail: a blurred, canvas-filling backdrop with the
/// aspect-correct crop centered on top.
///
/// `rect` is validated first; zero-area or negative rectangles never reach
/// the backend. Each later failure is tagged with its [`Stage`] and
/// short-circuits the pipeline.
pub fn create_thumbnail<B: ImageBackend + ?Sized>(
    backend: &B,
    source: &[u8],
    rect: &ExtractRect,
    config: &ThumbnailConfig,
) -> Result<Vec<u8>> {
    let region = rect.to_region()?;

    let extracted = backend
        .extract(source, region)
        .map_err(|source| ThumbnailError::Extraction {
            stage: Stage::Extract,
            source,
        })?;

    let dims = backend
        .measure(&extracted)
        .map_err(|source| ThumbnailError::Measurement {
            stage: Stage::Measure,
            source,
        })?;
    if dims.width == 0 || dims.height == 0 {
        return Err(ThumbnailError::Measurement {
            stage: Stage::Measure,
            source: BackendError::ProcessingFailed(format!(
                "extracted region is empty ({}x{})",
                dims.width, dims.height
            )),
        });
    }

    let layout = fit_layout(dims, config.canvas);
    debug!(
        width = dims.width,
        height = dims.height,
        fg_width = layout.pixel_width(),
        fg_height = layout.pixel_height(),
        left = layout.pixel_left(),
        top = layout.pixel_top(),
        "fitted foreground"
    );

    let foreground = backend
        .resize(&plan_foreground(&extracted, &layout))
        .map_err(|source| ThumbnailError::Render {
            stage: Stage::RenderForeground,
            source,
        })?;

    let thumbnail = backend
        .composite(&plan_composite(&extracted, &foreground, &layout, config))
        .map_err(|source| ThumbnailError::Render {
            stage: Stage::RenderComposite,
            source,
        })?;
    debug!(bytes = thumbnail.len(), "rendered composite");

    Ok(thumbnail)
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, buffer: &[u8]) -> Result<Dimensions> {
    backend
        .measure(buffer)
        .map_err(|source| ThumbnailError::Measurement {
            stage: Stage::Measure,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::params::Region;
    use crate::test_helpers::{decode_dimensions, synthetic_jpeg};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    #[test]
    fn pipeline_runs_stages_in_order() {
        let backend = MockBackend::with_dimensions(vec![dims(800, 600)]);
        let rect = ExtractRect::new(0, 0, 800, 600);

        let out =
            create_thumbnail(&backend, b"upload", &rect, &ThumbnailConfig::default()).unwrap();
        assert_eq!(out, b"composite");

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 4);
        assert_eq!(
            ops[0],
            RecordedOp::Extract {
                source: b"upload".to_vec(),
                region: Region {
                    top: 0,
                    left: 0,
                    width: 800,
                    height: 600
                },
            }
        );
        assert_eq!(ops[1], RecordedOp::Measure(b"extract".to_vec()));
        assert_eq!(
            ops[2],
            RecordedOp::Resize {
                source: b"extract".to_vec(),
                width: 400,
                height: 300,
                enlarge: true,
            }
        );
        assert_eq!(
            ops[3],
            RecordedOp::Composite {
                source: b"extract".to_vec(),
                canvas: Canvas::default(),
                gravity: Gravity::Centre,
                blur_sigma: 15.0,
                crop: true,
                quality: 95,
                enlarge: true,
                watermark: b"resize".to_vec(),
                left: 0,
                top: 0,
            }
        );
    }

    #[test]
    fn portrait_region_is_centered_horizontally() {
        let backend = MockBackend::with_dimensions(vec![dims(300, 800)]);
        let rect = ExtractRect::new(0, 0, 300, 800);

        create_thumbnail(&backend, b"upload", &rect, &ThumbnailConfig::default()).unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[2],
            RecordedOp::Resize {
                width: 112,
                height: 300,
                ..
            }
        ));
        assert!(matches!(
            &ops[3],
            RecordedOp::Composite {
                left: 143,
                top: 0,
                ..
            }
        ));
    }

    #[test]
    fn config_flows_into_composite() {
        let backend = MockBackend::with_dimensions(vec![dims(100, 100)]);
        let config = ThumbnailConfig {
            canvas: Canvas::new(200, 100),
            blur_sigma: 4.5,
            quality: Quality::new(70),
            gravity: Gravity::North,
        };

        create_thumbnail(&backend, b"upload", &ExtractRect::new(0, 0, 100, 100), &config)
            .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[2],
            RecordedOp::Resize {
                width: 100,
                height: 100,
                ..
            }
        ));
        assert!(matches!(
            &ops[3],
            RecordedOp::Composite {
                canvas: Canvas { width: 200, height: 100 },
                gravity: Gravity::North,
                quality: 70,
                left: 50,
                top: 0,
                blur_sigma,
                ..
            } if (*blur_sigma - 4.5).abs() < f32::EPSILON
        ));
    }

    #[test]
    fn zero_area_rect_never_reaches_backend() {
        let backend = MockBackend::new();

        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(0, 0, 0, 100),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ThumbnailError::InvalidRect(_)));
        assert_eq!(err.stage(), None);
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn negative_rect_is_rejected() {
        let backend = MockBackend::new();
        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(-10, 0, 50, 50),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ThumbnailError::InvalidRect(RectViolation::NegativeOffset { top: -10, left: 0 })
        ));
        assert_eq!(
            err.to_string(),
            "Invalid extract rectangle: offset must be non-negative (top=-10, left=0)"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn extract_failure_is_classified() {
        let backend = MockBackend::new().failing("extract");
        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(0, 0, 10, 10),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ThumbnailError::Extraction { .. }));
        assert_eq!(err.stage(), Some(Stage::Extract));
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn measure_failure_is_classified() {
        let backend = MockBackend::new().failing("measure");
        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(0, 0, 10, 10),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ThumbnailError::Measurement { .. }));
        assert_eq!(err.stage(), Some(Stage::Measure));
    }

    #[test]
    fn zero_measured_dimension_is_a_measurement_error() {
        let backend = MockBackend::with_dimensions(vec![dims(0, 10)]);
        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(0, 0, 10, 10),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ThumbnailError::Measurement { .. }));
        // Nothing rendered after a degenerate measurement
        assert_eq!(backend.get_operations().len(), 2);
    }

    #[test]
    fn resize_failure_stops_before_composite() {
        let backend = MockBackend::with_dimensions(vec![dims(10, 10)]).failing("resize");
        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(0, 0, 10, 10),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::RenderForeground));
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Composite { .. }))
        );
    }

    #[test]
    fn composite_failure_is_a_render_error() {
        let backend = MockBackend::with_dimensions(vec![dims(10, 10)]).failing("composite");
        let err = create_thumbnail(
            &backend,
            b"upload",
            &ExtractRect::new(0, 0, 10, 10),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ThumbnailError::Render { .. }));
        assert_eq!(err.stage(), Some(Stage::RenderComposite));
        assert!(err.to_string().starts_with("render composite failed"));
    }

    #[test]
    fn plan_composite_uses_truncated_offsets() {
        let layout = FitLayout {
            width: 112.5,
            height: 300.0,
            top: 0.0,
            left: 143.75,
        };
        let params = plan_composite(b"src", b"fg", &layout, &ThumbnailConfig::default());
        assert_eq!(params.watermark.left, 143);
        assert_eq!(params.watermark.top, 0);
        assert!(params.crop);
        assert!(params.enlarge);
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(vec![dims(1920, 1080)]);
        assert_eq!(get_dimensions(&backend, b"img").unwrap(), dims(1920, 1080));
    }

    #[test]
    fn plan_foreground_keeps_slivers_visible() {
        // 2000x3 fits as 400x0.6; the layout keeps the exact value
        let wide = fit_layout(dims(2000, 3), Canvas::default());
        assert_eq!(wide.pixel_height(), 0);
        let params = plan_foreground(b"x", &wide);
        assert_eq!((params.width, params.height), (400, 1));

        let tall = fit_layout(dims(3, 2000), Canvas::default());
        assert_eq!(tall.pixel_width(), 0);
        let params = plan_foreground(b"x", &tall);
        assert_eq!((params.width, params.height), (1, 300));
    }

    // =========================================================================
    // Real backend
    // =========================================================================

    #[test]
    fn real_backend_landscape_end_to_end() {
        let source = synthetic_jpeg(800, 600);
        let out = create_thumbnail(
            &RustBackend::new(),
            &source,
            &ExtractRect::new(0, 0, 800, 600),
            &ThumbnailConfig::default(),
        )
        .unwrap();
        assert_eq!(decode_dimensions(&out), (400, 300));
    }

    #[test]
    fn real_backend_portrait_crop_end_to_end() {
        let source = synthetic_jpeg(1000, 1000);
        let out = create_thumbnail(
            &RustBackend::new(),
            &source,
            &ExtractRect::new(100, 200, 300, 800),
            &ThumbnailConfig::default(),
        )
        .unwrap();
        assert_eq!(decode_dimensions(&out), (400, 300));
    }

    #[test]
    fn real_backend_thin_crops_render() {
        let source = synthetic_jpeg(2000, 2000);
        for rect in [
            ExtractRect::new(0, 0, 2000, 3),
            ExtractRect::new(0, 0, 3, 2000),
        ] {
            let out = create_thumbnail(
                &RustBackend::new(),
                &source,
                &rect,
                &ThumbnailConfig::default(),
            )
            .unwrap();
            assert_eq!(decode_dimensions(&out), (400, 300), "rect {rect:?}");
        }
    }

    #[test]
    fn real_backend_out_of_bounds_is_extraction_error() {
        let source = synthetic_jpeg(200, 200);
        let err = create_thumbnail(
            &RustBackend::new(),
            &source,
            &ExtractRect::new(0, 0, 201, 50),
            &ThumbnailConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ThumbnailError::Extraction {
                source: BackendError::OutOfBounds { .. },
                ..
            }
        ));
    }
}
