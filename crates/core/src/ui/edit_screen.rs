//! The profile edit screen.
//!
//! An `eframe::App` holding the form buffers, the preview image and the
//! crop dialog. Network and image work happens on worker threads; results
//! come back through a channel and are folded into the flow between frames.

use super::crop_modal::{CropModal, ModalOutcome};
use super::messages;
use super::state::{FlowEvent, UiState};
use crate::api::ProfileBackend;
use crate::flow::{self, PreviewReference, ProfileEditFlow, SourceFile};
use crate::image_processing::ImageCodec;
use crate::profile::ProfileUpdateRequest;
use eframe::egui;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

/// Longest edge of the preview thumbnail, in points.
const PREVIEW_SIZE: f32 = 240.0;

/// The profile edit screen.
pub struct EditScreen {
    flow: ProfileEditFlow<dyn ProfileBackend>,
    state: UiState,

    // Read-only header fields
    profile_name: String,
    specialty: String,

    // Form buffers
    introduction: String,
    counselling_time: String,
    visitable_area: String,
    strong_area_codes: String,

    // Image state
    image_path_input: String,
    preview_texture: Option<egui::TextureHandle>,
    preview_failed: bool,
    crop_modal: CropModal,

    notice: Option<String>,

    rx: Receiver<FlowEvent>,
    tx: Sender<FlowEvent>,
}

impl EditScreen {
    /// Creates the screen and starts the profile fetch.
    pub fn new(cc: &eframe::CreationContext<'_>, backend: Arc<dyn ProfileBackend>) -> Self {
        let (tx, rx) = channel();

        let screen = Self {
            flow: ProfileEditFlow::new(backend),
            state: UiState::Loading,
            profile_name: String::new(),
            specialty: String::new(),
            introduction: String::new(),
            counselling_time: String::new(),
            visitable_area: String::new(),
            strong_area_codes: String::new(),
            image_path_input: String::new(),
            preview_texture: None,
            preview_failed: false,
            crop_modal: CropModal::new(),
            notice: None,
            rx,
            tx,
        };

        screen.spawn_fetch(cc.egui_ctx.clone());
        screen
    }

    fn spawn_fetch(&self, ctx: egui::Context) {
        let tx = self.tx.clone();
        let backend = self.flow.backend();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            let event = match runtime {
                Ok(rt) => match rt.block_on(backend.fetch_profile()) {
                    Ok(profile) => FlowEvent::ProfileLoaded(Box::new(profile)),
                    Err(e) => FlowEvent::ProfileFailed(e.to_string()),
                },
                Err(e) => {
                    FlowEvent::ProfileFailed(format!("Failed to create async runtime: {}", e))
                }
            };

            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    fn spawn_resize(&mut self, ctx: egui::Context, source: SourceFile) {
        let token = self.flow.begin_selection();
        let tx = self.tx.clone();

        thread::spawn(move || {
            let event = match ImageCodec::resize_to_data_uri(&source.bytes, &source.mime) {
                Ok(data_uri) => FlowEvent::Resized {
                    token,
                    data_uri,
                    mime: source.mime,
                },
                Err(e) => FlowEvent::ResizeFailed {
                    token,
                    reason: e.to_string(),
                },
            };

            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    fn spawn_submit(&mut self, ctx: &egui::Context) {
        let update = ProfileUpdateRequest {
            introduction: self.introduction.clone(),
            counselling_time: self.counselling_time.clone(),
            visitable_area: self.visitable_area.clone(),
            strong_area_codes: self
                .strong_area_codes
                .split(',')
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(String::from)
                .collect(),
        };

        let plan = self.flow.begin_submit(update);
        self.notice = None;

        let tx = self.tx.clone();
        let backend = self.flow.backend();
        let ctx = ctx.clone();

        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build();

            let event = match runtime {
                Ok(rt) => match rt.block_on(ProfileEditFlow::execute(backend.as_ref(), plan)) {
                    Ok(message) => FlowEvent::Submitted(message),
                    Err(e) => FlowEvent::SubmitFailed(e.to_string()),
                },
                Err(e) => {
                    FlowEvent::SubmitFailed(format!("Failed to create async runtime: {}", e))
                }
            };

            let _ = tx.send(event);
            ctx.request_repaint();
        });
    }

    /// Folds worker results into the flow between frames.
    fn process_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            match event {
                FlowEvent::ProfileLoaded(profile) => {
                    self.flow.apply_profile(&profile);
                    self.profile_name = profile.name;
                    self.specialty = profile.specialty.name;
                    self.introduction = profile.introduction;
                    self.counselling_time = profile.counselling_time;
                    self.visitable_area = profile.visitable_area;
                    self.strong_area_codes = profile
                        .strong_areas
                        .iter()
                        .map(|area| area.code.as_str())
                        .collect::<Vec<_>>()
                        .join(", ");
                    self.preview_texture = None;
                    self.preview_failed = false;
                    self.state = UiState::Editing;
                }
                FlowEvent::ProfileFailed(reason) => {
                    self.state = UiState::Error(reason);
                }
                FlowEvent::Resized {
                    token,
                    data_uri,
                    mime,
                } => {
                    if self.flow.apply_resized(token, data_uri, mime) {
                        if let Some(staged) = self.flow.take_staged() {
                            if let Err(e) = self.crop_modal.open(staged) {
                                tracing::warn!(error = %e, "failed to open crop dialog");
                            }
                        }
                    }
                }
                FlowEvent::ResizeFailed { token, reason } => {
                    tracing::warn!(token, %reason, "image resize failed");
                }
                FlowEvent::Submitted(message) => {
                    self.flow.finish_submit();
                    tracing::info!(%message, "profile saved");
                    self.notice = Some(messages::SAVE.to_string());
                }
                FlowEvent::SubmitFailed(reason) => {
                    // No error toast in this screen; the failure is only logged
                    self.flow.finish_submit();
                    tracing::warn!(%reason, "profile submit failed");
                }
            }
        }
    }

    fn pick_file(&mut self, ctx: &egui::Context, path: PathBuf) {
        // Cleared after every pick so re-selecting the identical file still
        // triggers a fresh selection
        self.image_path_input.clear();

        match flow::load_source_file(&path) {
            Ok(source) => self.spawn_resize(ctx.clone(), source),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "rejected selected file");
            }
        }
    }

    fn ensure_preview_texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if self.preview_texture.is_none() && !self.preview_failed {
            if let Some(blob) = self.flow.trimmed() {
                match image::load_from_memory(&blob.bytes) {
                    Ok(image) => {
                        let buffer = image.to_rgba8();
                        let size = [image.width() as usize, image.height() as usize];
                        let pixels = buffer.as_flat_samples();
                        let color_image =
                            egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
                        self.preview_texture = Some(ctx.load_texture(
                            "profile-preview",
                            color_image,
                            egui::TextureOptions::LINEAR,
                        ));
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to decode staged preview");
                        self.preview_failed = true;
                    }
                }
            }
        }
        self.preview_texture.clone()
    }

    fn render_form(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&self.profile_name).strong().size(18.0));
            if !self.specialty.is_empty() {
                ui.label(egui::RichText::new(&self.specialty).weak());
            }
        });
        ui.separator();

        ui.label("Introduction");
        ui.add(
            egui::TextEdit::multiline(&mut self.introduction)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        ui.label("Counselling hours");
        ui.add(
            egui::TextEdit::singleline(&mut self.counselling_time).desired_width(f32::INFINITY),
        );

        ui.label("Visitable area");
        ui.add(egui::TextEdit::singleline(&mut self.visitable_area).desired_width(f32::INFINITY));

        ui.label("Strong area codes (comma separated)");
        ui.add(
            egui::TextEdit::singleline(&mut self.strong_area_codes)
                .hint_text("01, 02")
                .desired_width(f32::INFINITY),
        );

        ui.separator();
        ui.label(egui::RichText::new("Photo").size(16.0));
        self.render_image_field(ui, ctx);

        ui.separator();
        ui.horizontal(|ui| {
            let save = ui.add_enabled(self.flow.can_submit(), egui::Button::new("Save"));
            if save.clicked() {
                self.spawn_submit(ctx);
            }
            if self.flow.loading() {
                ui.spinner();
            }
            if let Some(notice) = self.notice.clone() {
                ui.colored_label(egui::Color32::from_rgb(60, 160, 60), notice);
            }
        });
    }

    fn render_image_field(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        if self.flow.preview().is_set() {
            match self.flow.preview().clone() {
                PreviewReference::Local(_) => {
                    if let Some(texture) = self.ensure_preview_texture(ctx) {
                        ui.add(
                            egui::Image::new(&texture)
                                .max_size(egui::vec2(PREVIEW_SIZE, PREVIEW_SIZE)),
                        );
                    }
                }
                PreviewReference::Remote(path) => {
                    // The saved image lives on the server; show its path
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.set_min_size(egui::vec2(PREVIEW_SIZE, 40.0));
                        ui.label(egui::RichText::new(format!("Saved image: {}", path)).weak());
                    });
                }
                PreviewReference::None => {}
            }

            if ui.small_button(messages::REMOVE_IMAGE).clicked() {
                self.flow.delete_image();
                self.preview_texture = None;
            }

            if self.flow.oversize() {
                ui.colored_label(egui::Color32::RED, messages::OVER_IMAGE_SIZE);
            }
        } else {
            ui.horizontal(|ui| {
                ui.add(
                    egui::TextEdit::singleline(&mut self.image_path_input)
                        .hint_text("path/to/image.jpg")
                        .desired_width(300.0),
                );
                if ui.button("Choose image").clicked() && !self.image_path_input.trim().is_empty()
                {
                    let path = PathBuf::from(self.image_path_input.trim());
                    self.pick_file(ctx, path);
                }
            });
            ui.label(egui::RichText::new(messages::RECOMMENDED_SIZE).small());
            ui.label(
                egui::RichText::new("You can also drop an image file onto this window.").small(),
            );
        }
    }
}

impl eframe::App for EditScreen {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process any pending worker results
        self.process_events();

        // Dropped files act as file selection while the form is editable
        if matches!(self.state, UiState::Editing) && !self.crop_modal.is_open() {
            let dropped = ctx.input(|i| i.raw.dropped_files.clone());
            for file in dropped {
                if let Some(path) = file.path {
                    self.pick_file(ctx, path);
                }
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Edit profile");
                ui.add_space(8.0);

                match self.state.clone() {
                    UiState::Loading => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label("Loading profile...");
                        });
                    }
                    UiState::Editing => {
                        self.render_form(ui, ctx);
                    }
                    UiState::Error(reason) => {
                        ui.colored_label(
                            egui::Color32::RED,
                            format!("Failed to load profile: {}", reason),
                        );
                    }
                }
            });
        });

        match self.crop_modal.show(ctx) {
            ModalOutcome::Confirmed(blob) => {
                self.flow.stage_export(blob);
                self.preview_texture = None;
                self.preview_failed = false;
            }
            ModalOutcome::Idle | ModalOutcome::Open | ModalOutcome::Cancelled => {}
        }
    }
}
