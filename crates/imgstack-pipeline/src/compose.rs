//! Layout composition: stack an ordered list of images into one raster.
//!
//! Every input is prepared independently (channel order, optional
//! resize, optional border) and then placed on a fresh canvas:
//!
//! - [`StackMode::Horizontal`]: left to right, top-aligned. Width is the
//!   sum of widths plus `spacing * (n - 1)`, height is the tallest image.
//! - [`StackMode::Vertical`]: top to bottom, left-aligned, symmetric.
//! - [`StackMode::Grid`]: rows of `grid_columns` images composed
//!   horizontally, then the rows composed vertically. A short last row
//!   keeps however many images it has and is not padded.
//!
//! Canvas regions no image covers (spacing gaps, slack from differing
//! sizes) are filled with [`LayoutSpec::background`], black by default.
//! Composition never crops or scales; scaling only happens in the
//! optional resize step before bordering.

use image::imageops;

use crate::border::add_border;
use crate::resize::resize;
use crate::types::{
    Axis, ChannelOrder, Color, Dimensions, LayoutSpec, PipelineError, RasterImage, StackMode,
};

/// Compose `images` into a single raster according to `spec`.
///
/// The output takes the channel order of the first image; inputs in a
/// different order are converted before placement.
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `images` is empty.
/// Returns [`PipelineError::InvalidConfig`] if `spec` fails validation.
/// Returns [`PipelineError::InvalidGroupSize`] in strict grid mode when
/// the image count is not a multiple of `grid_columns`.
/// Returns [`PipelineError::DimensionOverflow`] if the composite does
/// not fit in `u32` pixels on either axis.
pub fn compose(images: &[RasterImage], spec: &LayoutSpec) -> Result<RasterImage, PipelineError> {
    let Some(first) = images.first() else {
        return Err(PipelineError::EmptyInput);
    };
    spec.validate()?;

    let columns = usize::try_from(spec.grid_columns).unwrap_or(usize::MAX);
    if spec.mode == StackMode::Grid && spec.strict_grid && !images.len().is_multiple_of(columns) {
        return Err(PipelineError::InvalidGroupSize {
            count: images.len(),
            group_size: columns,
        });
    }

    let order = first.channel_order();
    let prepared = images
        .iter()
        .map(|image| prepare(image, spec, order))
        .collect::<Result<Vec<_>, _>>()?;

    let composite = match spec.mode {
        StackMode::Horizontal => stack(&prepared, Axis::Width, spec.spacing, spec.background)?,
        StackMode::Vertical => stack(&prepared, Axis::Height, spec.spacing, spec.background)?,
        StackMode::Grid => {
            let rows = prepared
                .chunks(columns)
                .map(|row| stack(row, Axis::Width, spec.spacing, spec.background))
                .collect::<Result<Vec<_>, _>>()?;
            stack(&rows, Axis::Height, spec.spacing, spec.background)?
        }
    };

    tracing::debug!(
        count = images.len(),
        mode = %spec.mode,
        output = %composite.dimensions(),
        "composed images",
    );
    Ok(composite)
}

/// Partition `items` into consecutive groups of exactly `group_size`.
///
/// Used when a batch is paired (or tripled, ...) into several
/// composites. A count that does not divide evenly is an error; items
/// are never dropped.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidConfig`] if `group_size` is zero.
/// Returns [`PipelineError::InvalidGroupSize`] if `items.len()` is not a
/// multiple of `group_size`.
pub fn group<T>(items: &[T], group_size: usize) -> Result<Vec<&[T]>, PipelineError> {
    if group_size == 0 {
        return Err(PipelineError::InvalidConfig(
            "group size must be at least 1".to_string(),
        ));
    }
    if !items.len().is_multiple_of(group_size) {
        return Err(PipelineError::InvalidGroupSize {
            count: items.len(),
            group_size,
        });
    }
    Ok(items.chunks_exact(group_size).collect())
}

/// Compose every consecutive group of `group_size` images separately.
///
/// # Errors
///
/// Returns the errors of [`group`] and [`compose`].
pub fn compose_groups(
    images: &[RasterImage],
    group_size: usize,
    spec: &LayoutSpec,
) -> Result<Vec<RasterImage>, PipelineError> {
    group(images, group_size)?
        .into_iter()
        .map(|members| compose(members, spec))
        .collect()
}

/// Channel order, then resize, then border.
fn prepare(
    image: &RasterImage,
    spec: &LayoutSpec,
    order: ChannelOrder,
) -> Result<RasterImage, PipelineError> {
    let image = image.to_channel_order(order);
    let image = match spec.resize {
        Some(target) => resize(&image, target, spec.resize_filter)?,
        None => image,
    };
    add_border(&image, spec.border_size, spec.border_fill)
}

fn extent(image: &RasterImage, axis: Axis) -> u32 {
    match axis {
        Axis::Width => image.width(),
        Axis::Height => image.height(),
    }
}

/// Concatenate prepared images along `axis`, `spacing` pixels apart.
///
/// All inputs must already share a channel order.
fn stack(
    images: &[RasterImage],
    axis: Axis,
    spacing: u32,
    background: Color,
) -> Result<RasterImage, PipelineError> {
    let Some(first) = images.first() else {
        return Err(PipelineError::EmptyInput);
    };
    let (stage, across_axis) = match axis {
        Axis::Width => ("horizontal stack", Axis::Height),
        Axis::Height => ("vertical stack", Axis::Width),
    };
    let overflow = || PipelineError::DimensionOverflow { stage, axis };

    let gaps = u32::try_from(images.len() - 1)
        .ok()
        .and_then(|n| n.checked_mul(spacing))
        .ok_or_else(overflow)?;
    let along = images
        .iter()
        .map(|image| extent(image, axis))
        .try_fold(gaps, u32::checked_add)
        .ok_or_else(overflow)?;
    let across = images
        .iter()
        .map(|image| extent(image, across_axis))
        .max()
        .unwrap_or(0);

    let dimensions = match axis {
        Axis::Width => Dimensions::new(along, across),
        Axis::Height => Dimensions::new(across, along),
    };
    let order = first.channel_order();
    let mut canvas = RasterImage::filled(dimensions, background, order).into_pixels();

    let mut offset: u32 = 0;
    for image in images {
        debug_assert_eq!(image.channel_order(), order, "stack inputs must share channel order");
        let (x, y) = match axis {
            Axis::Width => (offset, 0),
            Axis::Height => (0, offset),
        };
        imageops::replace(&mut canvas, image.pixels(), i64::from(x), i64::from(y));
        offset = offset
            .saturating_add(extent(image, axis))
            .saturating_add(spacing);
    }

    Ok(RasterImage::new(canvas, order))
}
