//! Modal crop dialog.
//!
//! Shows the staged (already resized) image, lets the user drag out a
//! square crop, and exports the result through the crop session on confirm.

use super::messages;
use super::rendering::{draw_crop_border, draw_crop_grid, draw_crop_overlay};
use super::selection::{DragEvent, aspect_rect_from_drag, process_drag_event, to_crop_rect, to_screen_rect};
use crate::crop::raster::{DisplaySize, ExportedBlob};
use crate::crop::session::{CROP_ASPECT, ConfirmOutcome, CropSession, SessionState};
use crate::error::Result;
use crate::flow::StagedSelection;
use eframe::egui;

/// Longest edge of the image as rendered inside the dialog, in points.
const MAX_DISPLAY: f32 = 520.0;

/// Overlay darkness outside the crop rectangle.
const OVERLAY_ALPHA: u8 = 150;

/// What the dialog did this frame.
#[derive(Debug)]
pub enum ModalOutcome {
    /// Not visible.
    Idle,
    /// Visible, still waiting on the user.
    Open,
    /// The user confirmed; the exported blob is ready for staging.
    Confirmed(ExportedBlob),
    /// The user dismissed the dialog; no blob is emitted.
    Cancelled,
}

/// The crop dialog and its per-image texture state.
pub struct CropModal {
    session: CropSession,
    texture: Option<egui::TextureHandle>,
    /// Pre-converted image data for fast texture upload
    color_image: Option<egui::ColorImage>,
    drag_start: Option<egui::Pos2>,
    drag_current: Option<egui::Pos2>,
}

impl CropModal {
    pub fn new() -> Self {
        Self {
            session: CropSession::new(),
            texture: None,
            color_image: None,
            drag_start: None,
            drag_current: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.state() != SessionState::Idle
    }

    /// Stages a resized selection and prepares its texture data.
    ///
    /// The conversion to [`egui::ColorImage`] happens here, before the
    /// dialog is first drawn, because it is the expensive step.
    pub fn open(&mut self, staged: StagedSelection) -> Result<()> {
        self.session.stage_data_uri(&staged.data_uri, staged.mime)?;

        if let Some(image) = self.session.image() {
            let buffer = image.to_rgba8();
            let size = [image.width() as usize, image.height() as usize];
            let pixels = buffer.as_flat_samples();
            self.color_image = Some(egui::ColorImage::from_rgba_unmultiplied(
                size,
                pixels.as_slice(),
            ));
        }
        self.texture = None;
        self.drag_start = None;
        self.drag_current = None;

        Ok(())
    }

    /// Draws the dialog when a session is active.
    pub fn show(&mut self, ctx: &egui::Context) -> ModalOutcome {
        if !self.is_open() {
            return ModalOutcome::Idle;
        }

        // Upload the texture on first frame using the pre-converted data
        if self.texture.is_none() {
            if let Some(color_image) = self.color_image.take() {
                self.texture = Some(ctx.load_texture(
                    "crop-image",
                    color_image,
                    egui::TextureOptions::LINEAR,
                ));
            }
        }

        let mut outcome = ModalOutcome::Open;
        let mut keep_open = true;

        egui::Window::new(messages::SELECT_AREA)
            .collapsible(false)
            .resizable(false)
            .open(&mut keep_open)
            .show(ctx, |ui| {
                let Some((natural_width, natural_height)) = self
                    .session
                    .image()
                    .map(|image| (image.width() as f32, image.height() as f32))
                else {
                    return;
                };

                let fit = (MAX_DISPLAY / natural_width)
                    .min(MAX_DISPLAY / natural_height)
                    .min(1.0);
                let display = egui::vec2(natural_width * fit, natural_height * fit);

                let (image_rect, response) =
                    ui.allocate_exact_size(display, egui::Sense::drag());

                if let Some(texture) = &self.texture {
                    ui.painter().image(
                        texture.id(),
                        image_rect,
                        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        egui::Color32::WHITE,
                    );
                }

                // The rendered size is only known now; seed the initial crop
                if self.session.state() == SessionState::Loaded {
                    self.session
                        .on_image_load(DisplaySize::new(display.x, display.y));
                }

                match process_drag_event(&response, &mut self.drag_start, &mut self.drag_current) {
                    DragEvent::Dragging => {
                        if let (Some(start), Some(current)) = (self.drag_start, self.drag_current) {
                            let rect =
                                aspect_rect_from_drag(start, current, CROP_ASPECT, image_rect);
                            self.session.update_crop(to_crop_rect(rect, image_rect.min));
                        }
                    }
                    DragEvent::Finished => {
                        if let Some(crop) = self.session.crop() {
                            self.session.complete_crop(crop);
                        }
                    }
                    DragEvent::Started | DragEvent::Discarded | DragEvent::None => {}
                }

                if let Some(crop) = self.session.crop() {
                    if !crop.is_empty() {
                        let crop_rect = to_screen_rect(&crop, image_rect.min);
                        draw_crop_overlay(ui.painter(), image_rect, crop_rect, OVERLAY_ALPHA);
                        draw_crop_border(ui.painter(), crop_rect, 2.0, egui::Color32::WHITE);
                        draw_crop_grid(
                            ui.painter(),
                            crop_rect,
                            egui::Color32::from_white_alpha(90),
                        );
                    }
                }

                ui.separator();
                ui.horizontal(|ui| {
                    let confirm = ui.add_enabled(
                        self.session.can_confirm(),
                        egui::Button::new("Confirm"),
                    );
                    if confirm.clicked() {
                        match self.session.confirm(ctx.pixels_per_point()) {
                            ConfirmOutcome::Exported(blob) => {
                                self.texture = None;
                                outcome = ModalOutcome::Confirmed(blob);
                            }
                            // Not ready: the button gating should prevent
                            // this, but the rasterizer double-checks
                            ConfirmOutcome::NotReady => {}
                            ConfirmOutcome::Failed(reason) => {
                                tracing::warn!(%reason, "crop export failed");
                            }
                        }
                    }

                    if ui.button("Cancel").clicked() {
                        self.session.cancel();
                        self.texture = None;
                        outcome = ModalOutcome::Cancelled;
                    }
                });
            });

        if !keep_open {
            self.session.cancel();
            self.texture = None;
            outcome = ModalOutcome::Cancelled;
        }

        outcome
    }
}

impl Default for CropModal {
    fn default() -> Self {
        Self::new()
    }
}
