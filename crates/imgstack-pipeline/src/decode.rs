//! Image decoding.
//!
//! Accepts raw image bytes (PNG, JPEG, BMP, WebP) and produces an RGB
//! [`RasterImage`]. Alpha is discarded: composites are opaque.
//!
//! This is the first step of every pipeline: raw bytes in, raster out.

use crate::types::{PipelineError, RasterImage};

/// Decode raw image bytes into an RGB raster.
///
/// Supports whatever the `image` crate was built to decode. The
/// result is always in [`ChannelOrder::Rgb`](crate::ChannelOrder::Rgb).
///
/// # Errors
///
/// Returns [`PipelineError::EmptySource`] if `bytes` is empty.
/// Returns [`PipelineError::ImageDecode`] if the image format is
/// unrecognized or the data is corrupt.
#[must_use = "returns the decoded raster"]
pub fn decode(bytes: &[u8]) -> Result<RasterImage, PipelineError> {
    if bytes.is_empty() {
        return Err(PipelineError::EmptySource);
    }

    let img = image::load_from_memory(bytes)?;
    Ok(RasterImage::from_rgb(img.to_rgb8()))
}
