//! Shared types for the imgstack pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::batch::ItemFailure;
use crate::detect::BoundingBox;
use crate::resize::ResizeFilter;

/// Re-export `RgbImage` so downstream crates can reference raw pixel
/// buffers without depending on `image` directly.
pub use image::RgbImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimensions value.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either axis is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Order of the three color channels inside a raster's pixel buffer.
///
/// Sources disagree on this (codecs hand out RGB, many vision models
/// hand out BGR), so every [`RasterImage`] carries it explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

/// An opaque color in canonical red/green/blue order.
///
/// Colors are always specified as RGB and written into a raster in
/// that raster's [`ChannelOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 3]);

impl Color {
    /// Pure black, the default border and background fill.
    pub const BLACK: Self = Self([0, 0, 0]);
    /// Pure white.
    pub const WHITE: Self = Self([255, 255, 255]);

    /// The pixel value for this color in the given channel order.
    #[must_use]
    pub const fn to_pixel(self, order: ChannelOrder) -> image::Rgb<u8> {
        let [r, g, b] = self.0;
        match order {
            ChannelOrder::Rgb => image::Rgb([r, g, b]),
            ChannelOrder::Bgr => image::Rgb([b, g, r]),
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}

impl FromStr for Color {
    type Err = String;

    /// Parse `black`, `white`, `#rrggbb`, or `r,g,b`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "black" => return Ok(Self::BLACK),
            "white" => return Ok(Self::WHITE),
            _ => {}
        }

        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("expected #rrggbb, got '{s}'"));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|e| format!("invalid hex color '{s}': {e}"))
            };
            return Ok(Self([channel(0)?, channel(2)?, channel(4)?]));
        }

        let parts: Vec<&str> = s.split(',').collect();
        if parts.len() != 3 {
            return Err(format!("color must be a name, '#rrggbb', or 'r,g,b', got '{s}'"));
        }
        let mut rgb = [0u8; 3];
        for (slot, part) in rgb.iter_mut().zip(&parts) {
            *slot = part
                .trim()
                .parse()
                .map_err(|e| format!("invalid color component '{part}': {e}"))?;
        }
        Ok(Self(rgb))
    }
}

/// A decoded 8-bit, three-channel raster together with its channel order.
///
/// Each stage owns the raster it holds. Composition reads its inputs and
/// produces a fresh output; nothing is mutated in place behind a shared
/// reference.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pixels: RgbImage,
    order: ChannelOrder,
}

impl RasterImage {
    /// Number of channels per pixel. Always three.
    pub const CHANNEL_COUNT: u8 = 3;

    /// Wrap a pixel buffer whose channels are laid out in `order`.
    #[must_use]
    pub const fn new(pixels: RgbImage, order: ChannelOrder) -> Self {
        Self { pixels, order }
    }

    /// Wrap a pixel buffer in RGB order.
    #[must_use]
    pub const fn from_rgb(pixels: RgbImage) -> Self {
        Self::new(pixels, ChannelOrder::Rgb)
    }

    /// A raster of the given size filled with a single color.
    #[must_use]
    pub fn filled(dimensions: Dimensions, color: Color, order: ChannelOrder) -> Self {
        let pixels =
            RgbImage::from_pixel(dimensions.width, dimensions.height, color.to_pixel(order));
        Self::new(pixels, order)
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// Width and height.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width(), self.height())
    }

    /// Number of channels per pixel.
    #[must_use]
    pub const fn channel_count(&self) -> u8 {
        Self::CHANNEL_COUNT
    }

    /// Channel layout of the pixel buffer.
    #[must_use]
    pub const fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /// The raw pixel buffer, in [`channel_order`](Self::channel_order).
    #[must_use]
    pub const fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    /// Consume the raster and return its pixel buffer.
    #[must_use]
    pub fn into_pixels(self) -> RgbImage {
        self.pixels
    }

    /// The color at `(x, y)` in canonical RGB order, or `None` when out
    /// of bounds.
    #[must_use]
    pub fn color_at(&self, x: u32, y: u32) -> Option<Color> {
        let [first, second, third] = self.pixels.get_pixel_checked(x, y)?.0;
        Some(match self.order {
            ChannelOrder::Rgb => Color([first, second, third]),
            ChannelOrder::Bgr => Color([third, second, first]),
        })
    }

    /// Return this raster with its channels laid out in `order`.
    ///
    /// Swaps the first and third channel of every pixel when the orders
    /// differ; otherwise returns the raster unchanged.
    #[must_use]
    pub fn into_channel_order(mut self, order: ChannelOrder) -> Self {
        if self.order != order {
            for pixel in self.pixels.pixels_mut() {
                pixel.0.swap(0, 2);
            }
            self.order = order;
        }
        self
    }

    /// Borrowing variant of [`into_channel_order`](Self::into_channel_order).
    #[must_use]
    pub fn to_channel_order(&self, order: ChannelOrder) -> Self {
        self.clone().into_channel_order(order)
    }
}

/// How images are arranged into the composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackMode {
    /// Left to right, top-aligned.
    #[default]
    Horizontal,
    /// Top to bottom, left-aligned.
    Vertical,
    /// Rows of `grid_columns` images, each row stacked horizontally,
    /// then the rows stacked vertically.
    Grid,
}

impl fmt::Display for StackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horizontal => f.write_str("Horizontal"),
            Self::Vertical => f.write_str("Vertical"),
            Self::Grid => f.write_str("Grid"),
        }
    }
}

/// Configuration for [`compose`](crate::compose::compose).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSpec {
    /// Arrangement of the images.
    pub mode: StackMode,

    /// Resize every input to exactly this size before bordering.
    /// Aspect ratio is not preserved.
    pub resize: Option<Dimensions>,

    /// Resampling filter used when `resize` is set.
    pub resize_filter: ResizeFilter,

    /// Border added on all four sides of every input, in pixels.
    pub border_size: u32,

    /// Border color.
    pub border_fill: Color,

    /// Gap between adjacent images, in pixels. Applied on both axes in
    /// grid mode.
    pub spacing: u32,

    /// Fill for canvas regions no image covers: spacing gaps and the
    /// slack left when images differ in size.
    pub background: Color,

    /// Images per row in grid mode. Must be positive.
    pub grid_columns: u32,

    /// In grid mode, require the image count to be an exact multiple of
    /// `grid_columns` instead of allowing a short last row.
    pub strict_grid: bool,
}

impl LayoutSpec {
    /// Default stacking mode.
    pub const DEFAULT_MODE: StackMode = StackMode::Horizontal;
    /// Default border size (no border).
    pub const DEFAULT_BORDER_SIZE: u32 = 0;
    /// Default spacing (images placed flush).
    pub const DEFAULT_SPACING: u32 = 0;
    /// Default number of grid columns.
    pub const DEFAULT_GRID_COLUMNS: u32 = 2;
    /// Default resampling filter.
    pub const DEFAULT_RESIZE_FILTER: ResizeFilter = ResizeFilter::Triangle;

    /// Check the spec for values no layout can satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidConfig`] if `grid_columns` is zero
    /// or `resize` has a zero axis.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.grid_columns == 0 {
            return Err(PipelineError::InvalidConfig(
                "grid_columns must be at least 1".to_string(),
            ));
        }
        if let Some(target) = self.resize
            && target.is_empty()
        {
            return Err(PipelineError::InvalidConfig(format!(
                "resize target must be non-zero, got {target}"
            )));
        }
        Ok(())
    }
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            mode: Self::DEFAULT_MODE,
            resize: None,
            resize_filter: Self::DEFAULT_RESIZE_FILTER,
            border_size: Self::DEFAULT_BORDER_SIZE,
            border_fill: Color::BLACK,
            spacing: Self::DEFAULT_SPACING,
            background: Color::BLACK,
            grid_columns: Self::DEFAULT_GRID_COLUMNS,
            strict_grid: false,
        }
    }
}

/// Image axis, used to report where a size computation overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal extent.
    Width,
    /// Vertical extent.
    Height,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Width => f.write_str("width"),
            Self::Height => f.write_str("height"),
        }
    }
}

/// Errors that can occur during pipeline processing.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Failed to decode an input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptySource,

    /// Composition was requested with no images.
    #[error("no images to compose")]
    EmptyInput,

    /// Every input of a batch failed to decode.
    #[error("none of the {} inputs could be decoded", .failures.len())]
    NoDecodableInput {
        /// Why each input failed, in input order.
        failures: Vec<ItemFailure>,
    },

    /// The image count does not divide into groups of the required size.
    #[error("{count} images cannot be split into groups of exactly {group_size}")]
    InvalidGroupSize {
        /// Number of images supplied.
        count: usize,
        /// Required group size.
        group_size: usize,
    },

    /// Crop derivation was requested with no detected boxes.
    #[error("no detections to derive a crop from")]
    NoDetections,

    /// A bounding box has its minimum corner past its maximum corner.
    #[error("invalid bounding box ({x_min}, {y_min}, {x_max}, {y_max}): min must not exceed max")]
    InvalidBox {
        /// Left edge.
        x_min: u32,
        /// Top edge.
        y_min: u32,
        /// Right edge.
        x_max: u32,
        /// Bottom edge.
        y_max: u32,
    },

    /// The enclosing box extends past the image.
    #[error("bounding box {bbox} lies outside the {width}x{height} image")]
    BoxOutOfBounds {
        /// The offending box.
        bbox: BoundingBox,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// A composite dimension does not fit in `u32`.
    #[error("composite {axis} overflows during {stage}")]
    DimensionOverflow {
        /// Operation that overflowed.
        stage: &'static str,
        /// Axis that overflowed.
        axis: Axis,
    },

    /// Pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // --- Color tests ---

    #[test]
    fn color_parses_names() {
        assert_eq!("black".parse::<Color>().unwrap(), Color::BLACK);
        assert_eq!("White".parse::<Color>().unwrap(), Color::WHITE);
    }

    #[test]
    fn color_parses_hex() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color([255, 128, 0]));
    }

    #[test]
    fn color_parses_triplet() {
        assert_eq!("10, 20,30".parse::<Color>().unwrap(), Color([10, 20, 30]));
    }

    #[test]
    fn color_rejects_garbage() {
        assert!("#12".parse::<Color>().is_err());
        assert!("1,2".parse::<Color>().is_err());
        assert!("1,2,300".parse::<Color>().is_err());
        assert!("mauve".parse::<Color>().is_err());
    }

    #[test]
    fn color_display_is_hex() {
        assert_eq!(Color([1, 171, 255]).to_string(), "#01abff");
    }

    #[test]
    fn color_to_pixel_respects_order() {
        let c = Color([1, 2, 3]);
        assert_eq!(c.to_pixel(ChannelOrder::Rgb), image::Rgb([1, 2, 3]));
        assert_eq!(c.to_pixel(ChannelOrder::Bgr), image::Rgb([3, 2, 1]));
    }

    // --- RasterImage tests ---

    #[test]
    fn raster_reports_dimensions_and_channels() {
        let r = RasterImage::filled(Dimensions::new(7, 3), Color::WHITE, ChannelOrder::Rgb);
        assert_eq!(r.dimensions(), Dimensions::new(7, 3));
        assert_eq!(r.channel_count(), 3);
        assert_eq!(r.channel_order(), ChannelOrder::Rgb);
    }

    #[test]
    fn channel_order_conversion_swaps_red_and_blue() {
        let rgb = RasterImage::filled(
            Dimensions::new(2, 2),
            Color([10, 20, 30]),
            ChannelOrder::Rgb,
        );
        let bgr = rgb.to_channel_order(ChannelOrder::Bgr);
        assert_eq!(bgr.channel_order(), ChannelOrder::Bgr);
        assert_eq!(bgr.pixels().get_pixel(0, 0).0, [30, 20, 10]);
        // Same logical color either way.
        assert_eq!(bgr.color_at(1, 1), Some(Color([10, 20, 30])));
        assert_eq!(rgb.color_at(1, 1), Some(Color([10, 20, 30])));
    }

    #[test]
    fn channel_order_conversion_to_same_order_is_identity() {
        let rgb = RasterImage::filled(Dimensions::new(1, 1), Color([1, 2, 3]), ChannelOrder::Rgb);
        let same = rgb.to_channel_order(ChannelOrder::Rgb);
        assert_eq!(same.pixels().as_raw(), rgb.pixels().as_raw());
    }

    #[test]
    fn color_at_out_of_bounds_is_none() {
        let r = RasterImage::filled(Dimensions::new(2, 2), Color::BLACK, ChannelOrder::Rgb);
        assert_eq!(r.color_at(2, 0), None);
    }

    // --- LayoutSpec tests ---

    #[test]
    fn layout_spec_defaults() {
        let spec = LayoutSpec::default();
        assert_eq!(spec.mode, StackMode::Horizontal);
        assert_eq!(spec.resize, None);
        assert_eq!(spec.border_size, 0);
        assert_eq!(spec.border_fill, Color::BLACK);
        assert_eq!(spec.spacing, 0);
        assert_eq!(spec.background, Color::BLACK);
        assert_eq!(spec.grid_columns, 2);
        assert!(!spec.strict_grid);
    }

    #[test]
    fn layout_spec_rejects_zero_columns() {
        let spec = LayoutSpec {
            grid_columns: 0,
            ..LayoutSpec::default()
        };
        assert!(matches!(spec.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn layout_spec_rejects_zero_resize() {
        let spec = LayoutSpec {
            resize: Some(Dimensions::new(0, 10)),
            ..LayoutSpec::default()
        };
        assert!(matches!(spec.validate(), Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn layout_spec_partial_json_fills_defaults() {
        let spec: LayoutSpec = serde_json::from_str(r#"{"mode":"Grid","spacing":4}"#).unwrap();
        assert_eq!(spec.mode, StackMode::Grid);
        assert_eq!(spec.spacing, 4);
        assert_eq!(spec.grid_columns, LayoutSpec::DEFAULT_GRID_COLUMNS);
    }

    #[test]
    fn layout_spec_serde_round_trip() {
        let spec = LayoutSpec {
            mode: StackMode::Vertical,
            resize: Some(Dimensions::new(400, 300)),
            resize_filter: ResizeFilter::Lanczos3,
            border_size: 5,
            border_fill: Color::WHITE,
            spacing: 3,
            background: Color([9, 9, 9]),
            grid_columns: 3,
            strict_grid: true,
        };
        let json = serde_json::to_string(&spec).unwrap();
        let deserialized: LayoutSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, deserialized);
    }

    // --- PipelineError tests ---

    #[test]
    fn error_invalid_group_size_display() {
        let err = PipelineError::InvalidGroupSize {
            count: 5,
            group_size: 2,
        };
        assert_eq!(
            err.to_string(),
            "5 images cannot be split into groups of exactly 2"
        );
    }

    #[test]
    fn error_overflow_display_names_stage_and_axis() {
        let err = PipelineError::DimensionOverflow {
            stage: "horizontal stack",
            axis: Axis::Width,
        };
        assert_eq!(err.to_string(), "composite width overflows during horizontal stack");
    }
}
