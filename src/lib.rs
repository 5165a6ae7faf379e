//! # blurframe
//!
//! Upload an image and a crop rectangle; get back a fixed-size thumbnail in
//! which the crop sits, aspect ratio intact, on a blurred full-bleed backdrop
//! cut from the same crop. Each thumbnail can be downloaded exactly once.
//!
//! # Pipeline
//!
//! ```text
//! upload ─▶ extract ─▶ measure ─▶ fit ─▶ render foreground ─▶ render composite ─▶ store
//!                                                                                  │
//! download ◀─────────────────────────────── take once (file deleted) ◀─────────────┘
//! ```
//!
//! The only part with real arithmetic is [`imaging::fit_layout`]: it scales the
//! crop to fill one axis of the canvas and centers it on the other. Landscape
//! crops pin the width; portrait *and square* crops pin the height.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Geometry, the [`imaging::ImageBackend`] seam, the `image`-crate backend, and the compositor |
//! | [`store`] | One-shot thumbnail storage: store by id, take once |
//! | [`server`] | axum routes for upload, download, and the upload page |
//! | [`config`] | `config.toml` loading, validation, and defaults |
//!
//! # Design Decisions
//!
//! ## Two Renders From One Crop
//!
//! The backdrop is rendered from the extracted region independently of the
//! foreground. Its crop-to-fill framing therefore never depends on how the
//! foreground was letterboxed.
//!
//! ## Validate Shape Early, Bounds Late
//!
//! Negative offsets and empty rectangles are refused before any pixel work
//! ([`imaging::ExtractRect::to_region`]). Whether a rectangle fits the source
//! is only known after decoding, so that check lives in the backend and
//! surfaces as an extraction error.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate for decoding, Lanczos3
//! resampling, Gaussian blur and JPEG encoding. No system libraries are
//! needed; the binary is self-contained.

pub mod config;
pub mod imaging;
pub mod server;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
