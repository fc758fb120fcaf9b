//! JPEG Re-encoder Implementation
//!
//! This module implements the `ImageEncoder` trait using the `image` crate to
//! decode JPEG, PNG and WebP sources and `jpeg-encoder` to write a progressive
//! JPEG. It converts codec errors to domain errors.

use image::{DynamicImage, GrayImage, RgbImage};
use jpeg_encoder::{ColorType, Encoder};
use optipress_domain::{
    optimization::{OptimizationError, ValidatedUpload},
    ports::ImageEncoder,
};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Errors raised by the codec itself
#[derive(Debug, Error)]
pub enum CodecError {
    /// The source bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// JPEG cannot represent images this large
    #[error("Image dimensions {width}x{height} exceed the JPEG limit of 65535 pixels per side")]
    DimensionsTooLarge { width: u32, height: u32 },

    /// The JPEG encoder rejected the pixel data
    #[error("Failed to encode JPEG: {0}")]
    Encode(String),
}

impl From<CodecError> for OptimizationError {
    fn from(err: CodecError) -> Self {
        OptimizationError::encoding_failed(err.to_string())
    }
}

/// Output layout options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOptions {
    /// Write a progressive JPEG (coarse full image first, refined by later scans)
    pub progressive: bool,
    /// Compute image-specific Huffman tables instead of the standard ones
    pub optimize_huffman: bool,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            progressive: true,
            optimize_huffman: true,
        }
    }
}

/// Decode `data` and write it back out as JPEG at `quality`
///
/// The source format is sniffed from the bytes, not taken from the declared
/// MIME type. Transparent pixels are composited onto white, and grayscale
/// sources stay single-channel. The output is deterministic for a given
/// input, quality and options.
///
/// # Example
///
/// ```
/// use std::io::Cursor;
/// use optipress_codec::{reencode, EncoderOptions};
///
/// let image = image::DynamicImage::new_rgb8(16, 16);
/// let mut png = Vec::new();
/// image.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png).unwrap();
///
/// let jpeg = reencode(&png, 80, EncoderOptions::default()).unwrap();
/// assert_eq!(&jpeg[0..2], &[0xFF, 0xD8]);
/// ```
pub fn reencode(data: &[u8], quality: u8, options: EncoderOptions) -> Result<Vec<u8>, CodecError> {
    let decoded = image::load_from_memory(data).map_err(|e| CodecError::Decode(e.to_string()))?;

    let (width, height) = (decoded.width(), decoded.height());
    let too_large = width > u32::from(u16::MAX) || height > u32::from(u16::MAX);
    if too_large {
        return Err(CodecError::DimensionsTooLarge { width, height });
    }

    let mut buffer = Vec::new();
    let mut encoder = Encoder::new(&mut buffer, quality);
    encoder.set_progressive(options.progressive);
    encoder.set_optimized_huffman_tables(options.optimize_huffman);

    let result = if decoded.color().has_color() {
        let rgb = flatten_rgb(&decoded);
        encoder.encode(rgb.as_raw(), width as u16, height as u16, ColorType::Rgb)
    } else {
        let gray = flatten_luma(&decoded);
        encoder.encode(gray.as_raw(), width as u16, height as u16, ColorType::Luma)
    };
    result.map_err(|e| CodecError::Encode(e.to_string()))?;

    Ok(buffer)
}

// Composite over white: out = src * a + 255 * (1 - a)
fn blend_on_white(channel: u8, alpha: u8) -> u8 {
    let alpha = u16::from(alpha);
    ((u16::from(channel) * alpha + 255 * (255 - alpha) + 127) / 255) as u8
}

fn flatten_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        dst.0 = [
            blend_on_white(r, a),
            blend_on_white(g, a),
            blend_on_white(b, a),
        ];
    }
    rgb
}

fn flatten_luma(image: &DynamicImage) -> GrayImage {
    if !image.color().has_alpha() {
        return image.to_luma8();
    }

    let luma_alpha = image.to_luma_alpha8();
    let mut gray = GrayImage::new(luma_alpha.width(), luma_alpha.height());
    for (dst, src) in gray.pixels_mut().zip(luma_alpha.pixels()) {
        let [l, a] = src.0;
        dst.0 = [blend_on_white(l, a)];
    }
    gray
}

/// `image`/`jpeg-encoder` implementation of the ImageEncoder port
///
/// Decoding and encoding are CPU-bound, so each call runs on tokio's
/// blocking pool and the request future only awaits the result.
///
/// ## Error Handling
///
/// Codec errors become `OptimizationError::EncodingFailed`; a panicked or
/// cancelled blocking task becomes `OptimizationError::Internal`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegReencoder {
    options: EncoderOptions,
}

impl JpegReencoder {
    /// Create a re-encoder with the given output options
    pub fn new(options: EncoderOptions) -> Self {
        info!(
            progressive = options.progressive,
            optimize_huffman = options.optimize_huffman,
            "Initializing JpegReencoder"
        );
        Self { options }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }
}

impl ImageEncoder for JpegReencoder {
    #[instrument(skip(self, upload), fields(upload_id = %upload.id(), size = upload.size(), quality = %upload.quality()))]
    fn encode(
        &self,
        upload: &ValidatedUpload,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, OptimizationError>> + Send {
        let data = upload.data().clone();
        let quality = upload.quality().value();
        let format = upload.format();
        let options = self.options;

        async move {
            debug!(format = %format, "Re-encoding image as JPEG");

            let outcome = tokio::task::spawn_blocking(move || reencode(&data, quality, options)).await;

            match outcome {
                Ok(Ok(encoded)) => {
                    info!(output_size = encoded.len(), "Successfully re-encoded image");
                    Ok(encoded)
                }
                Ok(Err(err)) => {
                    error!(error = %err, "Failed to re-encode image");
                    Err(err.into())
                }
                Err(err) => {
                    error!(error = ?err, "Encoding task did not complete");
                    Err(OptimizationError::internal(format!(
                        "encoding task failed: {}",
                        err
                    )))
                }
            }
        }
    }
}
