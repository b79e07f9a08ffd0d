//! Image resizing and encoding utilities.
//!
//! This module shrinks a freshly selected image file down to a bounded
//! resolution before it is handed to the crop dialog, and converts between
//! raster images and base64 data URIs.
//!
//! # Bounds
//!
//! A selected file may be far larger than the edit screen ever displays.
//! Resizing caps both dimensions at [`MAX_DIMENSION`] while preserving the
//! aspect ratio, and JPEG output is re-encoded at [`RESIZE_QUALITY`] so the
//! staged image stays small enough to move through the crop pipeline quickly.

use crate::error::{AppError, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, imageops::FilterType};
use std::io::Cursor;

/// Neither output dimension ever exceeds this, in pixels.
pub const MAX_DIMENSION: u32 = 750;

/// JPEG re-encode quality for the staged image.
pub const RESIZE_QUALITY: u8 = 50;

/// Stateless codec for the selection workflow.
///
/// Converts a selected file into a bounded, base64-encoded staging image and
/// decodes that staging image back into a raster for display and cropping.
pub struct ImageCodec;

impl ImageCodec {
    /// Decodes `bytes`, downscales so neither dimension exceeds
    /// [`MAX_DIMENSION`] (never upscales), re-encodes in the declared type
    /// and returns a `data:<mime>;base64,<payload>` URI.
    ///
    /// `declared_mime` is advisory: it selects the output encoding and falls
    /// back to JPEG when unrecognized. JPEG output uses [`RESIZE_QUALITY`];
    /// PNG and GIF re-encode losslessly.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the input cannot be decoded
    /// or the output encode fails. Malformed input is a hard error rather
    /// than a silent no-op, so callers can tell the user what went wrong.
    pub fn resize_to_data_uri(bytes: &[u8], declared_mime: &str) -> Result<String> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| AppError::image(format!("Failed to decode image: {}", e)))?;

        let resized = if decoded.width() <= MAX_DIMENSION && decoded.height() <= MAX_DIMENSION {
            decoded
        } else {
            decoded.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
        };

        let format = output_format(declared_mime);
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        match format {
            ImageFormat::Jpeg => {
                // JPEG has no alpha channel
                let encoder = JpegEncoder::new_with_quality(&mut cursor, RESIZE_QUALITY);
                resized
                    .to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;
            }
            other => {
                resized
                    .write_to(&mut cursor, other)
                    .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;
            }
        }

        tracing::debug!(
            width = resized.width(),
            height = resized.height(),
            mime = format.to_mime_type(),
            "resized selected image for cropping"
        );

        Ok(format!(
            "data:{};base64,{}",
            format.to_mime_type(),
            BASE64.encode(&buffer)
        ))
    }

    /// Decodes a `data:<mime>;base64,` URI produced by
    /// [`resize_to_data_uri`](Self::resize_to_data_uri) back into a raster.
    pub fn decode_data_uri(uri: &str) -> Result<DynamicImage> {
        let payload = uri
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, data)| data)
            .ok_or_else(|| AppError::image("Not a base64 data URI"))?;

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| AppError::image(format!("Invalid base64 payload: {}", e)))?;

        image::load_from_memory(&bytes)
            .map_err(|e| AppError::image(format!("Failed to decode image: {}", e)))
    }
}

/// Maps a declared MIME type onto the output encoding, defaulting to JPEG.
pub(crate) fn output_format(mime: &str) -> ImageFormat {
    match mime {
        "image/png" => ImageFormat::Png,
        "image/gif" => ImageFormat::Gif,
        _ => ImageFormat::Jpeg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            image::Rgba([120, 40, 200, 255]),
        ));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn output_never_exceeds_bounds() {
        let uri = ImageCodec::resize_to_data_uri(&png_bytes(1500, 900), "image/png").unwrap();
        let roundtrip = ImageCodec::decode_data_uri(&uri).unwrap();

        assert!(roundtrip.width() <= MAX_DIMENSION);
        assert!(roundtrip.height() <= MAX_DIMENSION);
        // Aspect ratio is preserved by the proportional downscale
        assert_eq!(roundtrip.width(), 750);
        assert_eq!(roundtrip.height(), 450);
    }

    #[test]
    fn small_input_is_not_upscaled() {
        let uri = ImageCodec::resize_to_data_uri(&png_bytes(320, 200), "image/png").unwrap();
        let roundtrip = ImageCodec::decode_data_uri(&uri).unwrap();

        assert_eq!((roundtrip.width(), roundtrip.height()), (320, 200));
    }

    #[test]
    fn declared_type_selects_encoding_and_uri_prefix() {
        let bytes = png_bytes(64, 64);

        let png = ImageCodec::resize_to_data_uri(&bytes, "image/png").unwrap();
        assert!(png.starts_with("data:image/png;base64,"));

        let jpeg = ImageCodec::resize_to_data_uri(&bytes, "image/jpeg").unwrap();
        assert!(jpeg.starts_with("data:image/jpeg;base64,"));

        // Unknown declared types fall back to JPEG
        let fallback = ImageCodec::resize_to_data_uri(&bytes, "image/bmp").unwrap();
        assert!(fallback.starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn malformed_input_is_an_explicit_error() {
        let result = ImageCodec::resize_to_data_uri(b"not an image", "image/jpeg");
        assert!(matches!(result, Err(AppError::ImageProcessing(_))));
    }

    #[test]
    fn rejects_non_data_uri() {
        assert!(ImageCodec::decode_data_uri("https://example.com/a.png").is_err());
    }
}
