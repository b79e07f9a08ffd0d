//! Crop rasterization and export.
//!
//! The crop dialog works in display space, where the staged image may be
//! rendered smaller than its true resolution. Exporting from display space
//! directly would bake that shrink into the output, so the rasterizer maps
//! the crop rectangle back to natural resolution and corrects for the device
//! pixel ratio before drawing.
//!
//! The draw goes through a small affine pipeline (translate to the crop
//! origin, rotate about the image center, scale) so the geometry stays
//! correct if a nonzero angle or non-unit scale is ever configured; the trim
//! settings in current use fix both at identity.

use crate::crop::geometry::CropRect;
use crate::image_processing::output_format;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Logical size of the rendered image element, in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySize {
    pub width: f32,
    pub height: f32,
}

impl DisplaySize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Rotation and scale applied while drawing, both about the image center.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimSettings {
    pub scale: f32,
    pub rotate_degrees: f32,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotate_degrees: 0.0,
        }
    }
}

/// Result of a rasterization attempt.
///
/// `NotReady` means a precondition was missing (no proposed or completed
/// rectangle, degenerate geometry). It is a state, not an error: the caller
/// keeps waiting for the user to finish adjusting.
#[derive(Debug)]
pub enum RasterOutcome {
    Ready(RgbaImage),
    NotReady,
}

impl RasterOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// Result of encoding a rasterized crop.
#[derive(Debug)]
pub enum ExportOutcome {
    Ok(ExportedBlob),
    Failed(String),
}

/// Final binary image produced by the crop pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedBlob {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ExportedBlob {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Draws the crop region of `source` into a new raster at natural resolution,
/// corrected for the device pixel ratio.
///
/// `crop` is the live (proposed) rectangle and `completed` the one recorded
/// at gesture end; both must be present before export is allowed, so a
/// missing one yields [`RasterOutcome::NotReady`].
///
/// The output buffer is `floor(crop.width * scale_x * pixel_ratio)` by
/// `floor(crop.height * scale_y * pixel_ratio)` where `scale_x`/`scale_y`
/// relate the natural and displayed sizes.
pub fn rasterize(
    source: &DynamicImage,
    crop: Option<&CropRect>,
    completed: Option<&CropRect>,
    displayed: DisplaySize,
    pixel_ratio: f32,
    settings: TrimSettings,
) -> RasterOutcome {
    let (Some(crop), Some(_completed)) = (crop, completed) else {
        return RasterOutcome::NotReady;
    };
    if crop.is_empty() || displayed.width <= 0.0 || displayed.height <= 0.0 || pixel_ratio <= 0.0 {
        return RasterOutcome::NotReady;
    }

    let natural_width = source.width() as f32;
    let natural_height = source.height() as f32;
    let scale_x = natural_width / displayed.width;
    let scale_y = natural_height / displayed.height;

    let out_width = (crop.width * scale_x * pixel_ratio).floor() as u32;
    let out_height = (crop.height * scale_y * pixel_ratio).floor() as u32;
    if out_width == 0 || out_height == 0 {
        return RasterOutcome::NotReady;
    }

    let center_x = natural_width / 2.0;
    let center_y = natural_height / 2.0;

    // Same accumulation order as a drawing surface: the rightmost transform
    // applies to the source first.
    let transform = Affine::scaling(pixel_ratio, pixel_ratio)
        .then(Affine::translation(-crop.x * scale_x, -crop.y * scale_y))
        .then(Affine::translation(center_x, center_y))
        .then(Affine::rotation(settings.rotate_degrees.to_radians()))
        .then(Affine::scaling(settings.scale, settings.scale))
        .then(Affine::translation(-center_x, -center_y));

    let Some(inverse) = transform.invert() else {
        return RasterOutcome::NotReady;
    };

    let rgba = source.to_rgba8();
    let mut output = RgbaImage::new(out_width, out_height);

    // Inverse-map each output pixel center back into the source and sample
    // bilinearly (the maximum-smoothing path of a drawing surface).
    for y in 0..out_height {
        for x in 0..out_width {
            let (sx, sy) = inverse.apply(x as f32 + 0.5, y as f32 + 0.5);
            output.put_pixel(x, y, sample_bilinear(&rgba, sx - 0.5, sy - 0.5));
        }
    }

    tracing::debug!(
        out_width,
        out_height,
        scale_x,
        scale_y,
        pixel_ratio,
        "rasterized crop at natural resolution"
    );

    RasterOutcome::Ready(output)
}

/// Encodes a rasterized crop into the requested MIME type.
///
/// Unknown or empty MIME types fall back to `image/jpeg`. `quality` is only
/// meaningful for JPEG and is expressed on a 0.0–1.0 scale; the crop dialog
/// exports at 1.0.
pub fn export(buffer: &RgbaImage, mime: &str, quality: f32) -> ExportOutcome {
    let format = output_format(mime);
    let mut bytes: Vec<u8> = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);

    let encoded = match format {
        ImageFormat::Jpeg => {
            let jpeg_quality = (quality.clamp(0.0, 1.0) * 100.0).round() as u8;
            let encoder = JpegEncoder::new_with_quality(&mut cursor, jpeg_quality);
            DynamicImage::ImageRgba8(buffer.clone())
                .to_rgb8()
                .write_with_encoder(encoder)
        }
        other => DynamicImage::ImageRgba8(buffer.clone()).write_to(&mut cursor, other),
    };

    match encoded {
        Ok(()) => ExportOutcome::Ok(ExportedBlob {
            bytes,
            mime: format.to_mime_type().to_string(),
        }),
        Err(e) => ExportOutcome::Failed(format!("Failed to encode crop: {}", e)),
    }
}

/// 2D affine transform in drawing-surface form: `[a c e; b d f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Affine {
    fn translation(tx: f32, ty: f32) -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: tx,
            f: ty,
        }
    }

    fn scaling(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        }
    }

    fn rotation(theta: f32) -> Self {
        let (sin, cos) = theta.sin_cos();
        Self {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Matrix product `self * other`; `other` applies to a point first.
    fn then(self, other: Self) -> Self {
        Self {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    fn invert(self) -> Option<Self> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f32::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Self {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }

    fn apply(self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }
}

/// Samples `image` at a fractional position; coordinates outside the source
/// contribute transparent black, as an uncovered region of a drawing surface
/// would.
fn sample_bilinear(image: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let x0 = x.floor();
    let y0 = y.floor();
    let tx = x - x0;
    let ty = y - y0;

    let fetch = |ix: i64, iy: i64| -> [f32; 4] {
        if ix < 0 || iy < 0 || ix >= image.width() as i64 || iy >= image.height() as i64 {
            return [0.0; 4];
        }
        let pixel = image.get_pixel(ix as u32, iy as u32);
        [
            pixel[0] as f32,
            pixel[1] as f32,
            pixel[2] as f32,
            pixel[3] as f32,
        ]
    };

    let p00 = fetch(x0 as i64, y0 as i64);
    let p10 = fetch(x0 as i64 + 1, y0 as i64);
    let p01 = fetch(x0 as i64, y0 as i64 + 1);
    let p11 = fetch(x0 as i64 + 1, y0 as i64 + 1);

    let mut channels = [0u8; 4];
    for i in 0..4 {
        let top = p00[i] * (1.0 - tx) + p10[i] * tx;
        let bottom = p01[i] * (1.0 - tx) + p11[i] * tx;
        channels[i] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_source(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 17 % 256) as u8, (y * 29 % 256) as u8, 64, 255])
        }))
    }

    #[test]
    fn missing_completed_rect_is_not_ready() {
        let source = gradient_source(10, 10);
        let crop = CropRect::new(0.0, 0.0, 10.0, 10.0);

        let outcome = rasterize(
            &source,
            Some(&crop),
            None,
            DisplaySize::new(10.0, 10.0),
            1.0,
            TrimSettings::default(),
        );
        assert!(!outcome.is_ready());

        let outcome = rasterize(
            &source,
            None,
            None,
            DisplaySize::new(10.0, 10.0),
            1.0,
            TrimSettings::default(),
        );
        assert!(!outcome.is_ready());
    }

    #[test]
    fn empty_crop_is_not_ready() {
        let source = gradient_source(10, 10);
        let crop = CropRect::new(2.0, 2.0, 0.0, 5.0);

        let outcome = rasterize(
            &source,
            Some(&crop),
            Some(&crop),
            DisplaySize::new(10.0, 10.0),
            1.0,
            TrimSettings::default(),
        );
        assert!(!outcome.is_ready());
    }

    #[test]
    fn full_bounds_crop_scales_by_pixel_ratio() {
        let source = gradient_source(8, 6);
        let crop = CropRect::new(0.0, 0.0, 8.0, 6.0);

        // Displayed at natural size, so both scale factors are 1
        let outcome = rasterize(
            &source,
            Some(&crop),
            Some(&crop),
            DisplaySize::new(8.0, 6.0),
            2.0,
            TrimSettings::default(),
        );

        let RasterOutcome::Ready(buffer) = outcome else {
            panic!("expected a buffer");
        };
        assert_eq!((buffer.width(), buffer.height()), (16, 12));
    }

    #[test]
    fn subregion_at_unit_scale_copies_source_pixels() {
        let source = gradient_source(10, 10);
        let crop = CropRect::new(2.0, 3.0, 4.0, 4.0);

        let outcome = rasterize(
            &source,
            Some(&crop),
            Some(&crop),
            DisplaySize::new(10.0, 10.0),
            1.0,
            TrimSettings::default(),
        );

        let RasterOutcome::Ready(buffer) = outcome else {
            panic!("expected a buffer");
        };
        assert_eq!((buffer.width(), buffer.height()), (4, 4));

        let rgba = source.to_rgba8();
        assert_eq!(buffer.get_pixel(0, 0), rgba.get_pixel(2, 3));
        assert_eq!(buffer.get_pixel(3, 3), rgba.get_pixel(5, 6));
    }

    #[test]
    fn display_shrink_is_corrected_on_export() {
        let source = gradient_source(100, 80);
        // Browser shrank the element to half size; crop is in display space
        let crop = CropRect::new(10.0, 10.0, 20.0, 20.0);

        let outcome = rasterize(
            &source,
            Some(&crop),
            Some(&crop),
            DisplaySize::new(50.0, 40.0),
            1.0,
            TrimSettings::default(),
        );

        let RasterOutcome::Ready(buffer) = outcome else {
            panic!("expected a buffer");
        };
        assert_eq!((buffer.width(), buffer.height()), (40, 40));

        let rgba = source.to_rgba8();
        assert_eq!(buffer.get_pixel(0, 0), rgba.get_pixel(20, 20));
    }

    #[test]
    fn export_falls_back_to_jpeg_for_unknown_mime() {
        let buffer = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));

        let ExportOutcome::Ok(blob) = export(&buffer, "", 1.0) else {
            panic!("expected a blob");
        };
        assert_eq!(blob.mime, "image/jpeg");
        assert!(!blob.is_empty());
    }

    #[test]
    fn export_honors_declared_png() {
        let buffer = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 255]));

        let ExportOutcome::Ok(blob) = export(&buffer, "image/png", 1.0) else {
            panic!("expected a blob");
        };
        assert_eq!(blob.mime, "image/png");
        // PNG signature
        assert_eq!(&blob.bytes[..4], &[0x89, b'P', b'N', b'G']);
    }
}
