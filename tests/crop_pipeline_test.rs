use std::io::Cursor;

use ai_photo_studio::codec::{self, CodecConfig, CodecError, ImageMime};
use ai_photo_studio::crop::{
    CropRegion, CropSession, Viewport, centered_aspect_crop, constrain_to_surface,
};
use ai_photo_studio::style::AspectRatio;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use proptest::prelude::*;

fn create_image_bytes(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let r = (x % 255) as u8;
        let g = (y % 255) as u8;
        let b = ((x + y) % 255) as u8;
        Rgba([r, g, b, 255])
    });

    let dyn_img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
        _ => DynamicImage::ImageRgba8(img),
    };
    let mut cursor = Cursor::new(Vec::new());
    dyn_img
        .write_to(&mut cursor, format)
        .expect("failed to encode test image");
    cursor.into_inner()
}

fn decoded_size(bytes: &[u8]) -> (u32, u32) {
    let image = image::load_from_memory(bytes).expect("decode output");
    (image.width(), image.height())
}

#[test]
fn square_photo_cropped_to_landscape() {
    let bytes = create_image_bytes(1000, 1000, ImageFormat::Png);
    let raster = codec::decode(&bytes, "image/png", &CodecConfig::default()).expect("decode");

    let mut session = CropSession::new(Viewport::new(1000.0, 1000.0));
    let region = session
        .on_image_load(raster, AspectRatio::Landscape)
        .expect("initialized");

    let px = region.to_pixels(1000.0, 1000.0);
    assert!((px.x - 50.0).abs() < 1e-6);
    assert!((px.y - 246.875).abs() < 1e-6);
    assert!((px.width - 900.0).abs() < 1e-6);
    assert!((px.height - 506.25).abs() < 1e-6);

    let encoded = session.save().expect("save");
    assert_eq!(encoded.mime(), ImageMime::Png);
    assert_eq!(decoded_size(encoded.payload()), (900, 506));
}

#[test]
fn downscaled_display_maps_back_to_natural_pixels() {
    let bytes = create_image_bytes(1000, 1000, ImageFormat::Png);
    let raster = codec::decode(&bytes, "image/png", &CodecConfig::default()).expect("decode");

    // 默认视口 800x600：显示为 600x600，保存时仍按原图像素输出
    let mut session = CropSession::new(Viewport::default());
    session
        .on_image_load(raster, AspectRatio::Landscape)
        .expect("initialized");
    assert_eq!(session.displayed_size(), Some((600.0, 600.0)));

    let encoded = session.save().expect("save");
    assert_eq!(decoded_size(encoded.payload()), (900, 506));
}

#[test]
fn cropped_pixels_come_from_the_selected_region() {
    let bytes = create_image_bytes(100, 100, ImageFormat::Png);
    let raster = codec::decode(&bytes, "image/png", &CodecConfig::default()).expect("decode");

    let mut session = CropSession::new(Viewport::new(100.0, 100.0));
    session
        .on_image_load(raster, AspectRatio::Square)
        .expect("initialized");
    session
        .on_user_drag(CropRegion::pixels(10.0, 20.0, 30.0, 30.0))
        .expect("drag");

    let encoded = session.save().expect("save");
    let output = image::load_from_memory(encoded.payload())
        .expect("decode output")
        .to_rgba8();

    assert_eq!(output.dimensions(), (30, 30));
    assert_eq!(output.get_pixel(0, 0), &Rgba([10, 20, 30, 255]));
    assert_eq!(output.get_pixel(29, 29), &Rgba([39, 49, 88, 255]));
}

#[test]
fn oversized_upload_is_rejected_before_decoding() {
    let config = CodecConfig::default();
    let bytes = vec![0u8; 15 * 1024 * 1024];

    let err = codec::decode(&bytes, "image/jpeg", &config).unwrap_err();

    assert!(matches!(err, CodecError::FileTooLarge { .. }));
    assert_eq!(err.code(), "file_too_large");
    assert!(codec::check_upload_size(5 * 1024 * 1024, &config).is_ok());
}

/// 在 SOI 之后插入若干注释段，把一张小 JPEG 撑到指定体积以上。
fn pad_jpeg_with_comments(jpeg: &[u8], min_size: usize) -> Vec<u8> {
    const SEGMENT_PAYLOAD: usize = 65533;
    let mut padded = Vec::with_capacity(min_size + jpeg.len() + SEGMENT_PAYLOAD);
    padded.extend_from_slice(&jpeg[..2]);
    while padded.len() + jpeg.len() < min_size {
        padded.extend_from_slice(&[0xFF, 0xFE, 0xFF, 0xFF]);
        padded.extend(std::iter::repeat_n(b'x', SEGMENT_PAYLOAD));
    }
    padded.extend_from_slice(&jpeg[2..]);
    padded
}

#[test]
fn five_mib_jpeg_upload_is_accepted() {
    let jpeg = create_image_bytes(64, 48, ImageFormat::Jpeg);
    let bytes = pad_jpeg_with_comments(&jpeg, 5 * 1024 * 1024);
    assert!(bytes.len() >= 5 * 1024 * 1024);

    let raster = codec::decode(&bytes, "image/jpeg", &CodecConfig::default()).expect("decode");

    assert_eq!((raster.natural_width(), raster.natural_height()), (64, 48));
    assert_eq!(raster.declared_mime(), ImageMime::Jpeg);
}

#[test]
fn jpeg_upload_crops_back_to_jpeg() {
    let bytes = create_image_bytes(400, 300, ImageFormat::Jpeg);
    let raster = codec::decode(&bytes, "image/jpeg", &CodecConfig::default()).expect("decode");

    let mut session = CropSession::new(Viewport::default());
    session
        .on_image_load(raster, AspectRatio::Portrait)
        .expect("initialized");
    let encoded = session.save().expect("save");

    assert_eq!(encoded.mime(), ImageMime::Jpeg);
    assert!(encoded.to_data_uri().starts_with("data:image/jpeg;base64,/9j/"));
    // 300 * 0.9 = 270 高，宽 202.5 → 202
    assert_eq!(decoded_size(encoded.payload()), (202, 270));
}

#[test]
fn gif_upload_is_unsupported() {
    let bytes = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;".to_vec();
    let err = codec::decode(&bytes, "image/gif", &CodecConfig::default()).unwrap_err();
    assert!(matches!(err, CodecError::UnsupportedFormat(_)));
}

fn aspect_strategy() -> impl Strategy<Value = AspectRatio> {
    prop_oneof![
        Just(AspectRatio::Square),
        Just(AspectRatio::Portrait),
        Just(AspectRatio::Landscape),
    ]
}

proptest! {
    #[test]
    fn initial_crop_is_centered_locked_and_inside(
        width in 1.0f64..5000.0,
        height in 1.0f64..5000.0,
        aspect in aspect_strategy(),
    ) {
        let region = centered_aspect_crop(width, height, aspect.ratio()).expect("region");
        let px = region.to_pixels(width, height);

        prop_assert!(region.fits_within(width, height));
        prop_assert!((px.width / px.height - aspect.ratio()).abs() < 1e-9);
        prop_assert!(px.width <= width * 0.9 + 1e-9);
        prop_assert!(px.height <= height * 0.9 + 1e-9);
        prop_assert!((px.x + px.width / 2.0 - width / 2.0).abs() < 1e-6);
        prop_assert!((px.y + px.height / 2.0 - height / 2.0).abs() < 1e-6);
        // 至少一边撑满 90%
        prop_assert!(
            (px.width - width * 0.9).abs() < 1e-6 || (px.height - height * 0.9).abs() < 1e-6
        );
    }

    #[test]
    fn constrained_drag_stays_inside_with_locked_ratio(
        x in -500.0f64..1500.0,
        y in -500.0f64..1500.0,
        w in 1.0f64..3000.0,
        h in 1.0f64..3000.0,
        aspect in aspect_strategy(),
    ) {
        let rect = CropRegion::pixels(x, y, w, h);
        let fixed = constrain_to_surface(&rect, aspect.ratio(), 1000.0, 800.0).expect("constrained");

        prop_assert!(fixed.fits_within(1000.0, 800.0));
        prop_assert!((fixed.width / fixed.height - aspect.ratio()).abs() < 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn output_size_is_floor_of_mapped_region(
        natural_w in 4u32..96,
        natural_h in 4u32..96,
        zoom in 1.0f64..3.0,
        fx in 0.0f64..0.5,
        fy in 0.0f64..0.5,
        fw in 0.1f64..0.5,
        fh in 0.1f64..0.5,
    ) {
        let bytes = create_image_bytes(natural_w, natural_h, ImageFormat::Png);
        let raster = codec::decode(&bytes, "image/png", &CodecConfig::default()).expect("decode");

        let mut session = CropSession::new(Viewport::new(4096.0, 4096.0));
        session.on_image_load(raster, AspectRatio::Square).expect("initialized");
        session.on_zoom_changed(zoom).expect("zoom");
        let (dw, dh) = session.displayed_size().expect("displayed");

        let region = CropRegion::pixels(fx * dw, fy * dh, fw * dw, fh * dh);
        session.on_user_drag(region).expect("drag");

        let expected_w = region.width * natural_w as f64 / dw;
        let expected_h = region.height * natural_h as f64 / dh;

        match session.save() {
            Ok(encoded) => {
                let (out_w, out_h) = decoded_size(encoded.payload());
                prop_assert!((out_w as f64) <= expected_w + 1e-6);
                prop_assert!((out_w as f64) > expected_w - 1.0);
                prop_assert!((out_h as f64) <= expected_h + 1e-6);
                prop_assert!((out_h as f64) > expected_h - 1.0);
            }
            Err(_) => prop_assert!(expected_w < 1.0 + 1e-6 || expected_h < 1.0 + 1e-6),
        }
    }
}
