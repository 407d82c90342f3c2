//! Resize engine.
//!
//! Turns a decoded source image into an output of exactly the requested size
//! under one of the three [`FitMode`] policies.
//!
//! # Geometry
//!
//! Aspect ratios are compared by integer cross-multiplication
//! (`src_w * new_h` against `src_h * new_w`, in `u64`) so equal ratios compare
//! exactly equal. Extents derived by integer division are clamped to at least
//! one pixel, which only matters for extreme aspect ratios.
//!
//! # Alpha
//!
//! JPEG has no alpha channel, so transparent sources are composited over the
//! background color in every mode. Compositing happens before resampling;
//! the filter never sees the color hidden under fully transparent pixels.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::ThumbnailError;

use super::request::FitMode;

/// Resampling filter used for every mode (bicubic).
pub const RESAMPLE_FILTER: FilterType = FilterType::CatmullRom;

/// Default pad/background color (white).
pub const DEFAULT_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Axis-aligned pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

// =============================================================================
// Geometry
// =============================================================================

/// Source sub-rectangle used by [`FitMode::Crop`].
///
/// The rectangle has the aspect ratio of the target and is centered in the
/// source. All inputs must be non-zero.
pub fn crop_region(src_width: u32, src_height: u32, new_width: u32, new_height: u32) -> Rect {
    let (sw, sh) = (u64::from(src_width), u64::from(src_height));
    let (nw, nh) = (u64::from(new_width), u64::from(new_height));

    let (mut width, mut height) = (sw, sh);
    let source_cross = sw * nh;
    let target_cross = sh * nw;
    if source_cross > target_cross {
        width = (sh * nw / nh).max(1);
    } else if source_cross < target_cross {
        height = (sw * nh / nw).max(1);
    }

    Rect {
        x: ((sw - width) / 2) as u32,
        y: ((sh - height) / 2) as u32,
        width: width as u32,
        height: height as u32,
    }
}

/// Destination sub-rectangle used by [`FitMode::Pad`].
///
/// The rectangle has the aspect ratio of the source and is centered in the
/// output canvas. All inputs must be non-zero.
pub fn pad_region(src_width: u32, src_height: u32, new_width: u32, new_height: u32) -> Rect {
    let (sw, sh) = (u64::from(src_width), u64::from(src_height));
    let (nw, nh) = (u64::from(new_width), u64::from(new_height));

    let (mut width, mut height) = (nw, nh);
    let source_cross = sw * nh;
    let target_cross = sh * nw;
    if source_cross > target_cross {
        height = (sh * nw / sw).max(1);
    } else if source_cross < target_cross {
        width = (sw * nh / sh).max(1);
    }

    Rect {
        x: ((nw - width) / 2) as u32,
        y: ((nh - height) / 2) as u32,
        width: width as u32,
        height: height as u32,
    }
}

// =============================================================================
// Resize Engine
// =============================================================================

/// Stateless resize engine carrying the background color.
#[derive(Debug, Clone)]
pub struct ResizeEngine {
    background: Rgb<u8>,
}

impl Default for ResizeEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND)
    }
}

impl ResizeEngine {
    pub fn new(background: Rgb<u8>) -> Self {
        Self { background }
    }

    pub fn background(&self) -> Rgb<u8> {
        self.background
    }

    /// Resize `source` to exactly `new_width x new_height` using `mode`.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::InvalidDimension`] if either target dimension
    /// is zero or the source image is empty.
    pub fn resize(
        &self,
        source: &DynamicImage,
        new_width: u32,
        new_height: u32,
        mode: FitMode,
    ) -> Result<RgbImage, ThumbnailError> {
        if new_width == 0 {
            return Err(ThumbnailError::InvalidDimension {
                parameter: "w",
                message: "must be greater than 0".to_string(),
            });
        }
        if new_height == 0 {
            return Err(ThumbnailError::InvalidDimension {
                parameter: "h",
                message: "must be greater than 0".to_string(),
            });
        }
        if source.width() == 0 || source.height() == 0 {
            return Err(ThumbnailError::InvalidDimension {
                parameter: "source",
                message: "source image has no pixels".to_string(),
            });
        }

        let pixels = self.flatten(&source.to_rgba8());
        let output = match mode {
            FitMode::Stretch => self.stretch(&pixels, new_width, new_height),
            FitMode::Crop => self.crop(&pixels, new_width, new_height),
            FitMode::Pad => self.pad(&pixels, new_width, new_height),
        };

        Ok(output)
    }

    fn stretch(&self, source: &RgbImage, new_width: u32, new_height: u32) -> RgbImage {
        imageops::resize(source, new_width, new_height, RESAMPLE_FILTER)
    }

    fn crop(&self, source: &RgbImage, new_width: u32, new_height: u32) -> RgbImage {
        let region = crop_region(source.width(), source.height(), new_width, new_height);
        let visible =
            imageops::crop_imm(source, region.x, region.y, region.width, region.height).to_image();
        imageops::resize(&visible, new_width, new_height, RESAMPLE_FILTER)
    }

    fn pad(&self, source: &RgbImage, new_width: u32, new_height: u32) -> RgbImage {
        let region = pad_region(source.width(), source.height(), new_width, new_height);
        let scaled = imageops::resize(source, region.width, region.height, RESAMPLE_FILTER);

        let mut canvas = RgbImage::from_pixel(new_width, new_height, self.background);
        imageops::replace(&mut canvas, &scaled, i64::from(region.x), i64::from(region.y));
        canvas
    }

    /// Composite `image` over the background color, dropping alpha.
    fn flatten(&self, image: &RgbaImage) -> RgbImage {
        let Rgb([bg_r, bg_g, bg_b]) = self.background;
        RgbImage::from_fn(image.width(), image.height(), |x, y| {
            let Rgba([r, g, b, a]) = *image.get_pixel(x, y);
            match a {
                255 => Rgb([r, g, b]),
                0 => self.background,
                a => Rgb([
                    blend_channel(r, bg_r, a),
                    blend_channel(g, bg_g, a),
                    blend_channel(b, bg_b, a),
                ]),
            }
        })
    }
}

#[inline]
fn blend_channel(foreground: u8, background: u8, alpha: u8) -> u8 {
    let alpha = u32::from(alpha);
    let value = u32::from(foreground) * alpha + u32::from(background) * (255 - alpha);
    ((value + 127) / 255) as u8
}

// =============================================================================
// Tests
// =============================================================================
