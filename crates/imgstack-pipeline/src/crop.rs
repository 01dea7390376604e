//! Detection-guided cropping into a side-by-side pair.
//!
//! Given the boxes a detector found in one image, the enclosing box of
//! all of them defines the region of interest. Two crops are cut from
//! the same rows around it:
//!
//! ```text
//! rows   = [y_min - border,  y_max + border)
//! left   = [x_min - border,  x_max + spacing)
//! right  = [x_min - spacing, x_max + border)
//! ```
//!
//! `border` is clamped to `max_border = min(y_min, H - y_max)` and
//! `spacing` to `max_spacing = min(x_min, W - x_max)`. Because the two
//! values are chosen independently, every edge is clamped to the image
//! again when the offsets are applied.
//!
//! The crops are not mirror images of each other. Both cover the
//! enclosing region; the left one extends `border` to the left and
//! `spacing` to the right, the right one the other way round. Placed
//! side by side they read as two views of the same region, the inner
//! margins controlling the gap between the views.

use image::imageops;
use serde::{Deserialize, Serialize};

use crate::compose::compose;
use crate::detect::{BoundingBox, Detection, ObjectDetector, enclosing_box, filter_by_confidence};
use crate::types::{Dimensions, LayoutSpec, PipelineError, RasterImage, StackMode};

/// Half-open pixel range `[start, end)` along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// First pixel included.
    pub start: u32,
    /// First pixel past the range.
    pub end: u32,
}

impl Span {
    /// Number of pixels in the range.
    #[must_use]
    pub const fn len(self) -> u32 {
        self.end - self.start
    }

    /// Returns `true` if the range covers no pixels.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end == self.start
    }

    /// `[center_start - before, center_end + after)` clamped to `[0, limit)`.
    fn around(center_start: u32, center_end: u32, before: u32, after: u32, limit: u32) -> Self {
        Self {
            start: center_start.saturating_sub(before),
            end: center_end.saturating_add(after).min(limit),
        }
    }
}

/// Geometry of a crop pair, derived from an enclosing box and the
/// dimensions of the image it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropGeometry {
    /// Enclosing box of all detections.
    pub enclosing: BoundingBox,
    /// Largest border that keeps the rows inside the image:
    /// `min(y_min, height - y_max)`.
    pub max_border: u32,
    /// Largest spacing that keeps the columns inside the image:
    /// `min(x_min, width - x_max)`.
    pub max_spacing: u32,
    /// Requested border after clamping to `max_border`.
    pub border: u32,
    /// Requested spacing after clamping to `max_spacing`.
    pub spacing: u32,
    /// Rows shared by both crops.
    pub rows: Span,
    /// Columns of the left crop.
    pub left: Span,
    /// Columns of the right crop.
    pub right: Span,
}

impl CropGeometry {
    /// Derive the crop rectangles for `enclosing` inside an image of
    /// size `dimensions`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::BoxOutOfBounds`] if `enclosing` extends
    /// past the image.
    pub fn derive(
        dimensions: Dimensions,
        enclosing: BoundingBox,
        border: u32,
        spacing: u32,
    ) -> Result<Self, PipelineError> {
        if !enclosing.fits_within(dimensions) {
            return Err(PipelineError::BoxOutOfBounds {
                bbox: enclosing,
                width: dimensions.width,
                height: dimensions.height,
            });
        }
        let Dimensions { width, height } = dimensions;

        let max_border = enclosing.y_min().min(height - enclosing.y_max());
        let max_spacing = enclosing.x_min().min(width - enclosing.x_max());
        let border = border.min(max_border);
        let spacing = spacing.min(max_spacing);

        let (x_min, x_max) = (enclosing.x_min(), enclosing.x_max());
        Ok(Self {
            enclosing,
            max_border,
            max_spacing,
            border,
            spacing,
            rows: Span::around(enclosing.y_min(), enclosing.y_max(), border, border, height),
            left: Span::around(x_min, x_max, border, spacing, width),
            right: Span::around(x_min, x_max, spacing, border, width),
        })
    }
}

/// The two crops cut around a detected region.
#[derive(Debug, Clone)]
pub struct CropPair {
    /// Crop extending `border` to the left and `spacing` to the right.
    pub left: RasterImage,
    /// Crop extending `spacing` to the left and `border` to the right.
    pub right: RasterImage,
    /// Rectangles the crops were cut from.
    pub geometry: CropGeometry,
}

/// Cut the left/right crop pair around the enclosing box of `boxes`.
///
/// `border` and `spacing` are clamped as described in the module docs.
/// With both zero, each crop is exactly the enclosing box. The source
/// image is only read.
///
/// # Errors
///
/// Returns [`PipelineError::NoDetections`] if `boxes` is empty.
/// Returns [`PipelineError::BoxOutOfBounds`] if the enclosing box
/// extends past the image.
pub fn derive_crop_pair(
    image: &RasterImage,
    boxes: &[BoundingBox],
    border: u32,
    spacing: u32,
) -> Result<CropPair, PipelineError> {
    let enclosing = enclosing_box(boxes)?;
    let geometry = CropGeometry::derive(image.dimensions(), enclosing, border, spacing)?;

    tracing::debug!(
        enclosing = %enclosing,
        border = geometry.border,
        spacing = geometry.spacing,
        "derived crop geometry",
    );

    Ok(CropPair {
        left: cut(image, geometry.left, geometry.rows),
        right: cut(image, geometry.right, geometry.rows),
        geometry,
    })
}

fn cut(image: &RasterImage, columns: Span, rows: Span) -> RasterImage {
    let pixels = imageops::crop_imm(
        image.pixels(),
        columns.start,
        rows.start,
        columns.len(),
        rows.len(),
    )
    .to_image();
    RasterImage::new(pixels, image.channel_order())
}

/// Place a crop pair side by side.
///
/// The mode is always [`StackMode::Horizontal`]; every other field of
/// `spec` (resize, border, spacing, colors) applies as usual.
///
/// # Errors
///
/// Returns the errors of [`compose`].
pub fn compose_crop_pair(pair: &CropPair, spec: &LayoutSpec) -> Result<RasterImage, PipelineError> {
    let spec = LayoutSpec {
        mode: StackMode::Horizontal,
        ..spec.clone()
    };
    compose(&[pair.left.clone(), pair.right.clone()], &spec)
}

/// Parameters of the detection-driven flow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
    /// Margin above, below, and on the outer side of each crop.
    pub border: u32,
    /// Margin on the inner side of each crop.
    pub spacing: u32,
    /// Detections below this confidence are ignored.
    pub min_confidence: f32,
}

impl CropOptions {
    /// Default minimum detection confidence.
    pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.25;
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            border: 0,
            spacing: 0,
            min_confidence: Self::DEFAULT_MIN_CONFIDENCE,
        }
    }
}

/// Output of [`detect_and_stack`].
#[derive(Debug, Clone)]
pub struct DetectionStack {
    /// The side-by-side composite.
    pub composite: RasterImage,
    /// Detections that passed the confidence filter.
    pub detections: Vec<Detection>,
    /// Geometry of the crops in the composite.
    pub geometry: CropGeometry,
}

/// Detect, crop around the detections, and place the crops side by side.
///
/// # Errors
///
/// Returns [`PipelineError::NoDetections`] if nothing passes the
/// confidence filter, plus the errors of [`derive_crop_pair`] and
/// [`compose`].
pub fn detect_and_stack(
    image: &RasterImage,
    detector: &dyn ObjectDetector,
    options: &CropOptions,
    spec: &LayoutSpec,
) -> Result<DetectionStack, PipelineError> {
    let detections = filter_by_confidence(detector.detect(image), options.min_confidence);
    let boxes: Vec<BoundingBox> = detections.iter().map(|d| d.bbox).collect();
    let pair = derive_crop_pair(image, &boxes, options.border, options.spacing)?;
    let composite = compose_crop_pair(&pair, spec)?;
    Ok(DetectionStack {
        composite,
        detections,
        geometry: pair.geometry,
    })
}
