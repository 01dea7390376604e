//! Uniform borders around a single image.

use image::imageops;

use crate::types::{Axis, Color, Dimensions, PipelineError, RasterImage};

/// Expand `image` by `size` pixels on all four sides, filled with `fill`.
///
/// The output is `(w + 2*size, h + 2*size)` with the source placed at
/// `(size, size)`. A zero `size` returns an identical copy.
///
/// # Errors
///
/// Returns [`PipelineError::DimensionOverflow`] if the bordered size
/// does not fit in `u32`.
pub fn add_border(
    image: &RasterImage,
    size: u32,
    fill: Color,
) -> Result<RasterImage, PipelineError> {
    if size == 0 {
        return Ok(image.clone());
    }

    let grow = |extent: u32, axis: Axis| {
        size.checked_mul(2)
            .and_then(|twice| extent.checked_add(twice))
            .ok_or(PipelineError::DimensionOverflow {
                stage: "border",
                axis,
            })
    };
    let dimensions = Dimensions::new(
        grow(image.width(), Axis::Width)?,
        grow(image.height(), Axis::Height)?,
    );

    let mut canvas = RasterImage::filled(dimensions, fill, image.channel_order()).into_pixels();
    imageops::replace(&mut canvas, image.pixels(), i64::from(size), i64::from(size));
    Ok(RasterImage::new(canvas, image.channel_order()))
}
