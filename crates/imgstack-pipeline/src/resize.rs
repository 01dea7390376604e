//! Resizing inputs to a common target size.
//!
//! When a [`LayoutSpec`](crate::LayoutSpec) carries a `resize` target,
//! every input is scaled to exactly that size before bordering. The
//! aspect ratio is not preserved.

use std::fmt;

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError, RasterImage};

/// Resampling filter used when resizing.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation: fast, decent quality.
    #[default]
    Triangle,
    /// Bicubic (Catmull-Rom): moderate speed, good quality.
    CatmullRom,
    /// Gaussian: moderate speed, smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: slowest, sharpest/best for photos.
    Lanczos3,
}

impl ResizeFilter {
    /// Convert to the `image` crate's `FilterType`.
    const fn to_image_filter(self) -> imageops::FilterType {
        match self {
            Self::Nearest => imageops::FilterType::Nearest,
            Self::Triangle => imageops::FilterType::Triangle,
            Self::CatmullRom => imageops::FilterType::CatmullRom,
            Self::Gaussian => imageops::FilterType::Gaussian,
            Self::Lanczos3 => imageops::FilterType::Lanczos3,
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// Resize `image` to exactly `target`, keeping its channel order.
///
/// An image already at the target size is returned as a copy without
/// resampling.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if either target axis is zero.
pub fn resize(
    image: &RasterImage,
    target: Dimensions,
    filter: ResizeFilter,
) -> Result<RasterImage, PipelineError> {
    if target.is_empty() {
        return Err(PipelineError::InvalidConfig(format!(
            "resize target must be non-zero, got {target}"
        )));
    }
    if image.dimensions() == target {
        return Ok(image.clone());
    }

    let resized = imageops::resize(
        image.pixels(),
        target.width,
        target.height,
        filter.to_image_filter(),
    );
    Ok(RasterImage::new(resized, image.channel_order()))
}
