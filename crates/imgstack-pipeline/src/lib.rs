//! imgstack-pipeline: Pure image stacking pipeline (sans-IO).
//!
//! Turns several images into one composite through:
//! decode -> optional resize -> optional border -> stack
//! (horizontal, vertical, or grid).
//!
//! The detection-guided variant crops each image around the objects a
//! detector found and stacks the two crops side by side:
//! decode -> detect -> enclosing box -> crop pair -> horizontal stack.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and returns rasters. Encoding and archiving live in
//! `imgstack-export`; file handling lives in `imgstack-cli`.

pub mod annotate;
pub mod batch;
pub mod border;
pub mod compose;
pub mod crop;
pub mod decode;
pub mod detect;
pub mod resize;
pub mod types;

pub use annotate::annotate_detections;
pub use batch::{
    BatchItem, BatchOptions, BatchOutcome, ItemFailure, SourceImage, decode_batch, run_batch,
};
pub use border::add_border;
pub use compose::{compose, compose_groups, group};
pub use crop::{
    CropGeometry, CropOptions, CropPair, DetectionStack, Span, compose_crop_pair,
    derive_crop_pair, detect_and_stack,
};
pub use decode::decode;
pub use detect::{
    BoundingBox, Detection, ObjectDetector, PrecomputedDetector, enclosing_box,
    filter_by_confidence,
};
pub use resize::{ResizeFilter, resize};
pub use types::{
    Axis, ChannelOrder, Color, Dimensions, LayoutSpec, PipelineError, RasterImage, RgbImage,
    StackMode,
};

/// A composite together with the inputs that were left out of it.
#[derive(Debug)]
pub struct StackOutcome {
    /// Composite of every input that decoded.
    pub composite: RasterImage,
    /// Inputs that failed to decode, in input order.
    pub failures: Vec<ItemFailure>,
}

/// Decode every source in parallel and stack the ones that decode into
/// one composite.
///
/// # Pipeline steps
///
/// 1. Decode each source (failures are collected, not fatal)
/// 2. Optional resize of every image to `spec.resize`
/// 3. Optional border around every image
/// 4. Stack according to `spec.mode`
///
/// # Errors
///
/// Returns [`PipelineError::EmptyInput`] if `sources` is empty.
/// Returns [`PipelineError::NoDecodableInput`] if no source decodes.
/// Returns the errors of [`decode_batch`] and [`compose`].
pub fn stack(
    sources: &[SourceImage],
    spec: &LayoutSpec,
    options: BatchOptions,
) -> Result<StackOutcome, PipelineError> {
    if sources.is_empty() {
        return Err(PipelineError::EmptyInput);
    }
    spec.validate()?;

    let BatchOutcome {
        succeeded,
        failures,
    } = decode_batch(sources, options)?;
    if succeeded.is_empty() {
        return Err(PipelineError::NoDecodableInput { failures });
    }

    let images: Vec<RasterImage> = succeeded.into_iter().map(|item| item.value).collect();
    let composite = compose(&images, spec)?;
    Ok(StackOutcome {
        composite,
        failures,
    })
}
