//! Detection preview: outline every detected box on a copy of the image.

use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::detect::Detection;
use crate::types::{Color, RasterImage};

/// Default outline color for detection previews.
pub const DEFAULT_ANNOTATION_COLOR: Color = Color([255, 0, 0]);

/// Return a copy of `image` with each detection outlined.
///
/// The outline is drawn `thickness` pixels wide, growing inward from the
/// box edge. Boxes with zero width or height are skipped.
#[must_use]
pub fn annotate_detections(
    image: &RasterImage,
    detections: &[Detection],
    color: Color,
    thickness: u32,
) -> RasterImage {
    let mut pixels = image.pixels().clone();
    let pixel = color.to_pixel(image.channel_order());

    for detection in detections {
        let b = detection.bbox;
        for inset in 0..thickness {
            let width = b.width().saturating_sub(inset * 2);
            let height = b.height().saturating_sub(inset * 2);
            if width == 0 || height == 0 {
                break;
            }
            let (Ok(x), Ok(y)) = (
                i32::try_from(b.x_min() + inset),
                i32::try_from(b.y_min() + inset),
            ) else {
                break;
            };
            draw_hollow_rect_mut(&mut pixels, Rect::at(x, y).of_size(width, height), pixel);
        }
    }

    RasterImage::new(pixels, image.channel_order())
}
