//! Interactive crop session state machine.
//!
//! A session walks `Idle → Loaded → Adjusting → Completed` and ends in a
//! confirm or a cancel. Transitions are driven by UI gesture events on a
//! single thread; there is never more than one session in flight.

use crate::crop::geometry::{CropRect, centered_aspect_crop};
use crate::crop::raster::{
    self, DisplaySize, ExportOutcome, ExportedBlob, RasterOutcome, TrimSettings,
};
use crate::error::Result;
use crate::image_processing::ImageCodec;
use image::DynamicImage;

/// Crop aspect ratio is fixed at 1:1.
pub const CROP_ASPECT: f32 = 1.0;

/// Current phase of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image staged.
    Idle,
    /// An image is staged but not yet measured on screen.
    Loaded,
    /// The user is dragging; the rectangle updates continuously.
    Adjusting,
    /// A gesture finished; confirm is available.
    Completed,
}

/// Result of a confirm attempt.
#[derive(Debug)]
pub enum ConfirmOutcome {
    /// Export succeeded; the session has reset to [`SessionState::Idle`].
    Exported(ExportedBlob),
    /// A proposed or completed rectangle was missing; nothing happened.
    NotReady,
    /// The encode failed; the session stays in [`SessionState::Completed`].
    Failed(String),
}

/// Holds the staged image and crop rectangles between gesture events.
pub struct CropSession {
    state: SessionState,
    image: Option<DynamicImage>,
    mime: String,
    displayed: Option<DisplaySize>,
    crop: Option<CropRect>,
    completed: Option<CropRect>,
    settings: TrimSettings,
}

impl CropSession {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            image: None,
            mime: String::new(),
            displayed: None,
            crop: None,
            completed: None,
            settings: TrimSettings::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn image(&self) -> Option<&DynamicImage> {
        self.image.as_ref()
    }

    pub fn crop(&self) -> Option<CropRect> {
        self.crop
    }

    pub fn completed_crop(&self) -> Option<CropRect> {
        self.completed
    }

    /// Stages a decoded image; the session moves to [`SessionState::Loaded`]
    /// and previous rectangles are discarded.
    pub fn stage(&mut self, image: DynamicImage, mime: impl Into<String>) {
        self.image = Some(image);
        self.mime = mime.into();
        self.displayed = None;
        self.crop = None;
        self.completed = None;
        self.state = SessionState::Loaded;
    }

    /// Stages a base64 data URI as produced by the resize step.
    pub fn stage_data_uri(&mut self, uri: &str, mime: impl Into<String>) -> Result<()> {
        let image = ImageCodec::decode_data_uri(uri)?;
        self.stage(image, mime);
        Ok(())
    }

    /// Records the rendered size of the staged image and seeds the initial
    /// centered crop. Called once per image, on load-complete.
    pub fn on_image_load(&mut self, displayed: DisplaySize) {
        if self.state == SessionState::Idle {
            return;
        }
        self.displayed = Some(displayed);
        self.crop = Some(centered_aspect_crop(
            displayed.width,
            displayed.height,
            CROP_ASPECT,
        ));
        self.state = SessionState::Adjusting;
    }

    /// Continuous update while the user drags. The completed rectangle is
    /// left alone until the gesture ends.
    pub fn update_crop(&mut self, rect: CropRect) {
        if self.state == SessionState::Idle {
            return;
        }
        self.crop = Some(rect);
        self.state = SessionState::Adjusting;
    }

    /// Gesture end: records the completed rectangle and enables confirm.
    pub fn complete_crop(&mut self, rect: CropRect) {
        if self.state == SessionState::Idle {
            return;
        }
        self.crop = Some(rect);
        self.completed = Some(rect);
        self.state = SessionState::Completed;
    }

    /// Whether the confirm action should be enabled.
    pub fn can_confirm(&self) -> bool {
        self.state == SessionState::Completed && self.completed.is_some()
    }

    /// Rasterizes and encodes the crop.
    ///
    /// On success the blob is returned and the session resets to idle; on an
    /// encode failure the session stays in `Completed` so the user can try
    /// again; with no completed rectangle this is a no-op.
    pub fn confirm(&mut self, pixel_ratio: f32) -> ConfirmOutcome {
        let (Some(image), Some(displayed)) = (self.image.as_ref(), self.displayed) else {
            return ConfirmOutcome::NotReady;
        };

        let buffer = match raster::rasterize(
            image,
            self.crop.as_ref(),
            self.completed.as_ref(),
            displayed,
            pixel_ratio,
            self.settings,
        ) {
            RasterOutcome::Ready(buffer) => buffer,
            RasterOutcome::NotReady => return ConfirmOutcome::NotReady,
        };

        match raster::export(&buffer, &self.mime, 1.0) {
            ExportOutcome::Ok(blob) => {
                tracing::debug!(bytes = blob.len(), mime = %blob.mime, "crop confirmed");
                self.reset();
                ConfirmOutcome::Exported(blob)
            }
            ExportOutcome::Failed(reason) => {
                tracing::warn!(%reason, "crop export failed");
                ConfirmOutcome::Failed(reason)
            }
        }
    }

    /// Dismisses the session without exporting. The caller's preview is
    /// left untouched.
    pub fn cancel(&mut self) {
        self.reset();
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.image = None;
        self.mime.clear();
        self.displayed = None;
        self.crop = None;
        self.completed = None;
    }
}

impl Default for CropSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn staged_session() -> CropSession {
        let mut session = CropSession::new();
        session.stage(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 30, Rgba([9, 9, 9, 255]))),
            "image/png",
        );
        session
    }

    #[test]
    fn image_load_seeds_a_centered_square() {
        let mut session = staged_session();
        session.on_image_load(DisplaySize::new(40.0, 30.0));

        assert_eq!(session.state(), SessionState::Adjusting);
        let crop = session.crop().unwrap();
        assert_eq!(crop.width, crop.height);
        assert_eq!(crop.center(), (20.0, 15.0));
    }

    #[test]
    fn confirm_before_gesture_end_is_a_no_op() {
        let mut session = staged_session();
        session.on_image_load(DisplaySize::new(40.0, 30.0));
        session.update_crop(CropRect::new(5.0, 5.0, 10.0, 10.0));

        assert!(!session.can_confirm());
        let outcome = session.confirm(1.0);
        assert!(matches!(outcome, ConfirmOutcome::NotReady));
        assert_eq!(session.state(), SessionState::Adjusting);
    }

    #[test]
    fn confirm_exports_and_resets() {
        let mut session = staged_session();
        session.on_image_load(DisplaySize::new(40.0, 30.0));
        session.complete_crop(CropRect::new(4.0, 4.0, 10.0, 10.0));

        assert!(session.can_confirm());
        let ConfirmOutcome::Exported(blob) = session.confirm(1.0) else {
            panic!("expected a blob");
        };
        assert_eq!(blob.mime, "image/png");
        assert!(!blob.is_empty());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.image().is_none());
    }

    #[test]
    fn cancel_resets_from_adjusting_and_completed() {
        let mut session = staged_session();
        session.on_image_load(DisplaySize::new(40.0, 30.0));
        session.cancel();
        assert_eq!(session.state(), SessionState::Idle);

        let mut session = staged_session();
        session.on_image_load(DisplaySize::new(40.0, 30.0));
        session.complete_crop(CropRect::new(0.0, 0.0, 8.0, 8.0));
        session.cancel();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.crop().is_none());
        assert!(session.completed_crop().is_none());
    }

    #[test]
    fn stage_replaces_previous_selection() {
        let mut session = staged_session();
        session.on_image_load(DisplaySize::new(40.0, 30.0));
        session.complete_crop(CropRect::new(0.0, 0.0, 8.0, 8.0));

        session.stage(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([1, 1, 1, 255]))),
            "image/jpeg",
        );
        assert_eq!(session.state(), SessionState::Loaded);
        assert!(session.crop().is_none());
        assert!(!session.can_confirm());
    }
}
