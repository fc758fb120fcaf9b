//! Integration tests for the JPEG re-encoder
//!
//! These tests verify that:
//! 1. JPEG, PNG and WebP sources are all re-encoded to JPEG
//! 2. Output is progressive by default and baseline when disabled
//! 3. Re-encoding is deterministic
//! 4. Quality drives output size
//! 5. The adapter plugs into the domain's OptimizationService

use bytes::Bytes;
use image::{DynamicImage, ImageBuffer, Rgb};
use optipress_codec::{reencode, EncoderOptions, JpegReencoder};
use optipress_domain::optimization::{
    OptimizationError, OptimizationService, Quality, UploadRequest,
};
use std::io::Cursor;

/// A noisy gradient so quality settings make a visible difference
fn sample_image(width: u32, height: u32) -> DynamicImage {
    let buffer = ImageBuffer::from_fn(width, height, |x, y| {
        let noise = ((x * 31 + y * 17) ^ (x * y)) % 64;
        Rgb([
            ((x * 255) / width) as u8,
            ((y * 255) / height) as u8,
            (noise * 4) as u8,
        ])
    });
    DynamicImage::ImageRgb8(buffer)
}

fn encode_as(image: &DynamicImage, format: image::ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
    bytes
}

/// Walk JPEG segments up to the first start-of-frame marker
fn frame_marker(jpeg: &[u8]) -> Option<u8> {
    let mut pos = 2;
    while pos + 4 <= jpeg.len() {
        if jpeg[pos] != 0xFF {
            return None;
        }
        let marker = jpeg[pos + 1];
        if (0xC0..=0xC2).contains(&marker) {
            return Some(marker);
        }
        let length = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        pos += 2 + length;
    }
    None
}

#[test]
fn test_png_source_becomes_jpeg() {
    let png = encode_as(&sample_image(64, 48), image::ImageFormat::Png);

    let jpeg = reencode(&png, 80, EncoderOptions::default()).unwrap();

    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8], "missing SOI marker");
    assert_eq!(&jpeg[jpeg.len() - 2..], &[0xFF, 0xD9], "missing EOI marker");

    let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (64, 48));
}

#[test]
fn test_jpeg_source_is_reencoded() {
    let original = encode_as(&sample_image(64, 64), image::ImageFormat::Jpeg);

    let jpeg = reencode(&original, 60, EncoderOptions::default()).unwrap();

    assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
}

#[test]
fn test_webp_source_is_reencoded() {
    let webp = encode_as(&sample_image(32, 32), image::ImageFormat::WebP);

    let jpeg = reencode(&webp, 80, EncoderOptions::default()).unwrap();

    let decoded = image::load_from_memory_with_format(&jpeg, image::ImageFormat::Jpeg).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (32, 32));
}

#[test]
fn test_output_is_progressive_by_default() {
    let png = encode_as(&sample_image(32, 32), image::ImageFormat::Png);

    let jpeg = reencode(&png, 80, EncoderOptions::default()).unwrap();

    assert_eq!(frame_marker(&jpeg), Some(0xC2), "expected SOF2 (progressive)");
}

#[test]
fn test_baseline_when_progressive_disabled() {
    let png = encode_as(&sample_image(32, 32), image::ImageFormat::Png);
    let options = EncoderOptions {
        progressive: false,
        optimize_huffman: false,
    };

    let jpeg = reencode(&png, 80, options).unwrap();

    assert_eq!(frame_marker(&jpeg), Some(0xC0), "expected SOF0 (baseline)");
}

#[test]
fn test_reencode_is_deterministic() {
    let png = encode_as(&sample_image(48, 48), image::ImageFormat::Png);

    let first = reencode(&png, 70, EncoderOptions::default()).unwrap();
    let second = reencode(&png, 70, EncoderOptions::default()).unwrap();

    assert_eq!(first, second, "same input and quality must give identical bytes");
}

#[test]
fn test_lower_quality_gives_smaller_output() {
    let png = encode_as(&sample_image(128, 128), image::ImageFormat::Png);

    let low = reencode(&png, 10, EncoderOptions::default()).unwrap();
    let high = reencode(&png, 100, EncoderOptions::default()).unwrap();

    assert!(
        low.len() < high.len(),
        "quality 10 ({} bytes) should be smaller than quality 100 ({} bytes)",
        low.len(),
        high.len()
    );
}

#[test]
fn test_truncated_source_fails() {
    let png = encode_as(&sample_image(32, 32), image::ImageFormat::Png);

    let result = reencode(&png[..png.len() / 3], 80, EncoderOptions::default());

    assert!(result.is_err());
}

#[tokio::test]
async fn test_service_with_reencoder() {
    let png = encode_as(&sample_image(96, 64), image::ImageFormat::Png);
    let service = OptimizationService::with_encoder(JpegReencoder::default());

    let request = UploadRequest::new(Bytes::from(png.clone()))
        .with_content_type("image/png")
        .with_file_name("gradient.png")
        .with_quality(Some(Quality::new(70).unwrap()));

    let optimized = service.optimize(request).await.unwrap();

    assert_eq!(optimized.original_size(), png.len());
    assert_eq!(&optimized.data()[0..2], &[0xFF, 0xD8]);
    assert_eq!(optimized.file_name(), "gradient_optimized.jpg");
    assert_eq!(optimized.quality().value(), 70);
}

#[tokio::test]
async fn test_service_reports_corrupt_upload_as_encoding_failure() {
    let service = OptimizationService::with_encoder(JpegReencoder::default());

    let request = UploadRequest::new(Bytes::from_static(b"\x89PNG but not really"))
        .with_content_type("image/png");

    let err = service.optimize(request).await.unwrap_err();

    assert!(matches!(err, OptimizationError::EncodingFailed(_)));
}

#[tokio::test]
async fn test_declared_type_does_not_need_to_match_content() {
    // A JPEG declared as PNG still decodes: the codec sniffs the real format
    let jpeg = encode_as(&sample_image(16, 16), image::ImageFormat::Jpeg);
    let service = OptimizationService::with_encoder(JpegReencoder::default());

    let request = UploadRequest::new(Bytes::from(jpeg)).with_content_type("image/png");

    assert!(service.optimize(request).await.is_ok());
}
