//! Detected objects and the pluggable detector seam.
//!
//! The detection model itself lives outside this crate. Callers obtain
//! one once and pass it in as an [`ObjectDetector`]; the pipeline only
//! consumes the boxes it returns.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, PipelineError, RasterImage};

/// Axis-aligned rectangle in pixel coordinates.
///
/// `x_max` and `y_max` are exclusive edges, so a box spanning a whole
/// `W x H` image is `(0, 0, W, H)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBox")]
pub struct BoundingBox {
    x_min: u32,
    y_min: u32,
    x_max: u32,
    y_max: u32,
}

/// Unchecked wire form of [`BoundingBox`].
#[derive(Deserialize)]
struct RawBox {
    x_min: u32,
    y_min: u32,
    x_max: u32,
    y_max: u32,
}

impl TryFrom<RawBox> for BoundingBox {
    type Error = PipelineError;

    fn try_from(raw: RawBox) -> Result<Self, Self::Error> {
        Self::new(raw.x_min, raw.y_min, raw.x_max, raw.y_max)
    }
}

impl BoundingBox {
    /// Create a box, rejecting inverted corners.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidBox`] if `x_min > x_max` or
    /// `y_min > y_max`.
    pub fn new(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> Result<Self, PipelineError> {
        if x_min > x_max || y_min > y_max {
            return Err(PipelineError::InvalidBox {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Left edge.
    #[must_use]
    pub const fn x_min(&self) -> u32 {
        self.x_min
    }

    /// Top edge.
    #[must_use]
    pub const fn y_min(&self) -> u32 {
        self.y_min
    }

    /// Right edge (exclusive).
    #[must_use]
    pub const fn x_max(&self) -> u32 {
        self.x_max
    }

    /// Bottom edge (exclusive).
    #[must_use]
    pub const fn y_max(&self) -> u32 {
        self.y_max
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.x_max - self.x_min
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.y_max - self.y_min
    }

    /// Returns `true` if the box lies entirely inside an image of the
    /// given size.
    #[must_use]
    pub const fn fits_within(&self, dimensions: Dimensions) -> bool {
        self.x_max <= dimensions.width && self.y_max <= dimensions.height
    }

    /// Smallest box containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// Minimal box enclosing every box in `boxes`.
///
/// # Errors
///
/// Returns [`PipelineError::NoDetections`] if `boxes` is empty.
pub fn enclosing_box<'a, I>(boxes: I) -> Result<BoundingBox, PipelineError>
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    boxes
        .into_iter()
        .copied()
        .reduce(BoundingBox::union)
        .ok_or(PipelineError::NoDetections)
}

/// One object reported by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Extent of the object.
    pub bbox: BoundingBox,
    /// Class name reported by the model.
    #[serde(default)]
    pub label: String,
    /// Model confidence in `0.0..=1.0`.
    #[serde(default = "full_confidence")]
    pub confidence: f32,
}

const fn full_confidence() -> f32 {
    1.0
}

/// Pluggable object detection backend.
///
/// Implement this trait to wire a model (ONNX, a remote service, ...)
/// into [`detect_and_stack`](crate::crop::detect_and_stack). The
/// pipeline holds no detector state of its own.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in `image`.
    fn detect(&self, image: &RasterImage) -> Vec<Detection>;
}

/// A detector that returns a fixed list of detections.
///
/// Useful when detection ran elsewhere and its results arrive as data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrecomputedDetector(pub Vec<Detection>);

impl ObjectDetector for PrecomputedDetector {
    fn detect(&self, _image: &RasterImage) -> Vec<Detection> {
        self.0.clone()
    }
}

/// Keep detections whose confidence is at least `min_confidence`.
#[must_use]
pub fn filter_by_confidence(detections: Vec<Detection>, min_confidence: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= min_confidence)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ChannelOrder, Color};

    fn bbox(x_min: u32, y_min: u32, x_max: u32, y_max: u32) -> BoundingBox {
        BoundingBox::new(x_min, y_min, x_max, y_max).unwrap()
    }

    fn detection(b: BoundingBox, confidence: f32) -> Detection {
        Detection {
            bbox: b,
            label: "person".to_string(),
            confidence,
        }
    }

    #[test]
    fn inverted_box_is_rejected() {
        assert!(matches!(
            BoundingBox::new(10, 0, 5, 5),
            Err(PipelineError::InvalidBox { x_min: 10, .. })
        ));
        assert!(BoundingBox::new(0, 6, 5, 5).is_err());
    }

    #[test]
    fn degenerate_box_is_allowed() {
        let b = bbox(3, 3, 3, 3);
        assert_eq!(b.width(), 0);
        assert_eq!(b.height(), 0);
    }

    #[test]
    fn fits_within_checks_far_edges() {
        let b = bbox(0, 0, 100, 50);
        assert!(b.fits_within(Dimensions::new(100, 50)));
        assert!(!b.fits_within(Dimensions::new(99, 50)));
        assert!(!b.fits_within(Dimensions::new(100, 49)));
    }

    #[test]
    fn enclosing_box_is_componentwise_min_max() {
        let boxes = [bbox(20, 30, 40, 80), bbox(25, 20, 80, 60), bbox(50, 50, 60, 70)];
        assert_eq!(enclosing_box(&boxes).unwrap(), bbox(20, 20, 80, 80));
    }

    #[test]
    fn enclosing_box_of_one_is_itself() {
        let b = bbox(1, 2, 3, 4);
        assert_eq!(enclosing_box(&[b]).unwrap(), b);
    }

    #[test]
    fn enclosing_box_of_nothing_fails() {
        let boxes: [BoundingBox; 0] = [];
        assert!(matches!(
            enclosing_box(&boxes),
            Err(PipelineError::NoDetections)
        ));
    }

    #[test]
    fn confidence_filter_keeps_threshold_and_above() {
        let detections = vec![
            detection(bbox(0, 0, 1, 1), 0.2),
            detection(bbox(0, 0, 2, 2), 0.5),
            detection(bbox(0, 0, 3, 3), 0.9),
        ];
        let kept = filter_by_confidence(detections, 0.5);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|d| d.confidence >= 0.5));
    }

    #[test]
    fn precomputed_detector_returns_its_list() {
        let detections = vec![detection(bbox(1, 1, 4, 4), 0.7)];
        let detector = PrecomputedDetector(detections.clone());
        let image = RasterImage::filled(Dimensions::new(5, 5), Color::BLACK, ChannelOrder::Rgb);
        assert_eq!(detector.detect(&image), detections);
    }

    #[test]
    fn detection_json_defaults_label_and_confidence() {
        let json = r#"{"bbox":{"x_min":1,"y_min":2,"x_max":3,"y_max":4}}"#;
        let d: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(d.bbox, bbox(1, 2, 3, 4));
        assert!(d.label.is_empty());
        assert!((d.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn detection_json_rejects_inverted_box() {
        let json = r#"{"bbox":{"x_min":9,"y_min":2,"x_max":3,"y_max":4}}"#;
        assert!(serde_json::from_str::<Detection>(json).is_err());
    }

    #[test]
    fn bounding_box_display() {
        assert_eq!(bbox(1, 2, 3, 4).to_string(), "(1, 2, 3, 4)");
    }
}
