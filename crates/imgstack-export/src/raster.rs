//! Raster encoding.
//!
//! Converts a [`RasterImage`] into PNG or JPEG bytes. Channel order is
//! resolved here: BGR rasters are converted to RGB before encoding, so
//! the file always stores the colors the raster logically holds.

use std::fmt;

use image::ImageEncoder;
use imgstack_pipeline::{ChannelOrder, RasterImage};
use serde::{Deserialize, Serialize};

use crate::ExportError;

/// Encoded output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// Lossy JPEG at the given quality (1-100).
    Jpeg {
        /// Encoder quality; values outside 1-100 are clamped.
        quality: u8,
    },
}

impl OutputFormat {
    /// Default JPEG quality.
    pub const DEFAULT_JPEG_QUALITY: u8 = 90;

    /// JPEG at [`DEFAULT_JPEG_QUALITY`](Self::DEFAULT_JPEG_QUALITY).
    pub const JPEG: Self = Self::Jpeg {
        quality: Self::DEFAULT_JPEG_QUALITY,
    };

    /// File extension without the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }

    /// Pick a format from a file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::JPEG),
            _ => None,
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => f.write_str("PNG"),
            Self::Jpeg { quality } => write!(f, "JPEG (quality {quality})"),
        }
    }
}

/// Encode `image` in the given format.
///
/// # Errors
///
/// Returns [`ExportError::EmptyImage`] if either dimension is zero.
/// Returns [`ExportError::Encode`] if the encoder fails.
pub fn encode(image: &RasterImage, format: OutputFormat) -> Result<Vec<u8>, ExportError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExportError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }

    let rgb = match image.channel_order() {
        ChannelOrder::Rgb => None,
        ChannelOrder::Bgr => Some(image.to_channel_order(ChannelOrder::Rgb)),
    };
    let pixels = rgb.as_ref().unwrap_or(image).pixels();

    let mut bytes = Vec::new();
    match format {
        OutputFormat::Png => {
            let encoder = image::codecs::png::PngEncoder::new(&mut bytes);
            encoder.write_image(
                pixels.as_raw(),
                pixels.width(),
                pixels.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
        OutputFormat::Jpeg { quality } => {
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                &mut bytes,
                quality.clamp(1, 100),
            );
            encoder.write_image(
                pixels.as_raw(),
                pixels.width(),
                pixels.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use imgstack_pipeline::{Color, Dimensions, decode};

    use super::*;

    fn gradient(w: u32, h: u32) -> RasterImage {
        #[allow(clippy::cast_possible_truncation)]
        let pixels = image::RgbImage::from_fn(w, h, |x, y| {
            image::Rgb([(x * 8) as u8, (y * 8) as u8, 128])
        });
        RasterImage::from_rgb(pixels)
    }

    #[test]
    fn png_starts_with_signature() {
        let bytes = encode(&gradient(4, 4), OutputFormat::Png).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn jpeg_starts_with_soi_marker() {
        let bytes = encode(&gradient(4, 4), OutputFormat::JPEG).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn bgr_raster_is_stored_as_rgb() {
        let rgb = RasterImage::filled(
            Dimensions::new(3, 3),
            Color([200, 10, 30]),
            ChannelOrder::Rgb,
        );
        let bgr = rgb.to_channel_order(ChannelOrder::Bgr);

        let from_rgb = encode(&rgb, OutputFormat::Png).unwrap();
        let from_bgr = encode(&bgr, OutputFormat::Png).unwrap();
        assert_eq!(from_rgb, from_bgr);

        let decoded = decode(&from_bgr).unwrap();
        assert_eq!(decoded.color_at(1, 1), Some(Color([200, 10, 30])));
    }

    #[test]
    fn zero_area_image_is_rejected() {
        let empty = RasterImage::from_rgb(image::RgbImage::new(0, 5));
        let result = encode(&empty, OutputFormat::Png);
        assert!(matches!(
            result,
            Err(ExportError::EmptyImage {
                width: 0,
                height: 5
            })
        ));
    }

    #[test]
    fn extension_round_trip() {
        assert_eq!(OutputFormat::from_extension("PNG"), Some(OutputFormat::Png));
        assert_eq!(OutputFormat::from_extension("jpeg"), Some(OutputFormat::JPEG));
        assert_eq!(OutputFormat::from_extension("gif"), None);
        assert_eq!(OutputFormat::JPEG.extension(), "jpg");
    }

    #[test]
    fn output_format_serde_round_trip() {
        let format = OutputFormat::Jpeg { quality: 75 };
        let json = serde_json::to_string(&format).unwrap();
        let deserialized: OutputFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(format, deserialized);
    }
}
