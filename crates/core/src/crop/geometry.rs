//! Crop rectangle type and initial placement.
//!
//! Rectangles produced here live in display space: the coordinate system of
//! the rendered (possibly scaled-down) image, not the source asset. The
//! rasterizer applies the display-to-natural correction when exporting.

/// Coordinate unit of a [`CropRect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// Display pixels.
    Px,
}

/// A crop rectangle in display-space coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub unit: Unit,
}

impl CropRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            unit: Unit::Px,
        }
    }

    /// A rectangle with zero area is not a usable crop.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Computes the initial crop for a newly loaded image: the maximal rectangle
/// of the given aspect ratio, centered in the displayed image.
///
/// Pure function; called once per image-load. Subsequent rectangles come from
/// direct user manipulation, not from here.
pub fn centered_aspect_crop(display_width: f32, display_height: f32, aspect: f32) -> CropRect {
    if display_width <= 0.0 || display_height <= 0.0 || aspect <= 0.0 {
        return CropRect::new(0.0, 0.0, 0.0, 0.0);
    }

    let (width, height) = if display_width / display_height > aspect {
        (display_height * aspect, display_height)
    } else {
        (display_width, display_width / aspect)
    };

    CropRect::new(
        (display_width - width) / 2.0,
        (display_height - height) / 2.0,
        width,
        height,
    )
}
