//! User interface for the profile edit screen.
//!
//! This module provides the form, the image preview and the modal crop
//! dialog over a [`ProfileBackend`](crate::api::ProfileBackend).
//!
//! # Architecture
//!
//! The UI is split into focused submodules:
//! - [`state`]: Screen state and worker event definitions
//! - [`messages`]: User-facing message constants
//! - [`rendering`]: Drawing utilities for the crop overlay
//! - [`selection`]: Drag handling and coordinate mapping
//! - [`crop_modal`]: The modal crop dialog
//! - [`edit_screen`]: The form and its submit workflow
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use profile_edit_core::{api::DemoBackend, ui};
//!
//! ui::run_edit_ui(Arc::new(DemoBackend::sample()))?;
//! ```

mod crop_modal;
pub mod messages;
mod rendering;
mod selection;
mod state;

pub mod edit_screen;

// Public API exports
pub use crop_modal::{CropModal, ModalOutcome};
pub use edit_screen::EditScreen;
pub use state::UiState;

use crate::api::ProfileBackend;
use crate::error::{AppError, Result};
use eframe::egui;
use std::sync::Arc;

/// Launches the edit screen and returns when the user closes the window.
///
/// The screen fetches the profile from `backend` on startup, then lets the
/// user edit the text fields, stage and crop a new image, and submit.
pub fn run_edit_ui(backend: Arc<dyn ProfileBackend>) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([780.0, 860.0])
            .with_min_inner_size([520.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Profile Edit",
        options,
        Box::new(move |cc| Ok(Box::new(EditScreen::new(cc, backend)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
