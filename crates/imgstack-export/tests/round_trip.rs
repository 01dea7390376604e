//! Integration test: compose, encode, package, then read everything back.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use imgstack_export::{ArchiveEntry, OutputFormat, encode, read_zip, to_zip, unique_names};
use imgstack_pipeline::{
    BoundingBox, ChannelOrder, Color, CropOptions, Detection, Dimensions, LayoutSpec,
    PrecomputedDetector, RasterImage, StackMode, compose, decode, detect_and_stack,
};

fn gradient(width: u32, height: u32) -> RasterImage {
    #[allow(clippy::cast_possible_truncation)]
    let pixels = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 7) as u8, ((x + y) * 3) as u8])
    });
    RasterImage::from_rgb(pixels)
}

#[test]
fn png_output_decodes_to_the_same_pixels() {
    let images = [gradient(20, 12), gradient(16, 16), gradient(9, 4)];
    let spec = LayoutSpec {
        mode: StackMode::Grid,
        border_size: 1,
        spacing: 2,
        ..LayoutSpec::default()
    };
    let composite = compose(&images, &spec).unwrap();

    let bytes = encode(&composite, OutputFormat::Png).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.dimensions(), composite.dimensions());
    assert_eq!(decoded.pixels().as_raw(), composite.pixels().as_raw());
}

#[test]
fn jpeg_output_is_close_to_the_source() {
    let composite = RasterImage::filled(
        Dimensions::new(32, 16),
        Color([180, 60, 20]),
        ChannelOrder::Rgb,
    );
    let bytes = encode(&composite, OutputFormat::JPEG).unwrap();
    let decoded = decode(&bytes).unwrap();

    assert_eq!(decoded.dimensions(), composite.dimensions());
    let Color(actual) = decoded.color_at(16, 8).unwrap();
    for (a, e) in actual.iter().zip([180u8, 60, 20]) {
        assert!(a.abs_diff(e) <= 8, "channel {a} too far from {e}");
    }
}

#[test]
fn detection_stack_survives_archive_round_trip() {
    let source = gradient(100, 100);
    let detector = PrecomputedDetector(vec![
        Detection {
            bbox: BoundingBox::new(20, 20, 40, 40).unwrap(),
            label: "cat".to_string(),
            confidence: 0.9,
        },
        Detection {
            bbox: BoundingBox::new(60, 50, 80, 80).unwrap(),
            label: "dog".to_string(),
            confidence: 0.8,
        },
    ]);
    let options = CropOptions {
        border: 10,
        spacing: 5,
        ..CropOptions::default()
    };
    let stacked = detect_and_stack(&source, &detector, &options, &LayoutSpec::default()).unwrap();

    let names = unique_names(["shot.png", "shot.png"]);
    let png = encode(&stacked.composite, OutputFormat::Png).unwrap();
    let entries: Vec<_> = names
        .iter()
        .map(|name| ArchiveEntry::new(name.clone(), png.clone()))
        .collect();

    let zip = to_zip(&entries).unwrap();
    let extracted = read_zip(&zip).unwrap();

    assert_eq!(extracted, entries);
    assert_eq!(extracted[1].name, "shot-1.png");
    let decoded = decode(&extracted[0].bytes).unwrap();
    assert_eq!(decoded.dimensions(), stacked.composite.dimensions());
}
