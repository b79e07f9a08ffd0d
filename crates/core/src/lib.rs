//! Profile Edit Core Library
//!
//! This library provides the core functionality for the profile edit screen,
//! including the image crop pipeline, the edit workflow and the profile API
//! client.
//!
//! # Overview
//!
//! The screen lets a user update textual profile fields and upload, crop or
//! delete a profile image. The library handles:
//!
//! - **Image Staging**: Bounded resize and data-URI encoding via [`image_processing`]
//! - **Cropping**: Geometry, natural-resolution rasterization and the
//!   interactive session via [`crop`]
//! - **Orchestration**: Selection tokens, the size ceiling and the submit
//!   plan via [`flow`]
//! - **Networking**: The profile REST client and its demo double via [`api`]
//! - **User Interface**: The edit form and crop dialog via [`ui`]
//!
//! # Quick Start
//!
//! The simplest way to use the library is through the [`ProfileEditor`] facade:
//!
//! ```ignore
//! use profile_edit_core::ProfileEditor;
//!
//! // Initialize from environment configuration
//! let editor = ProfileEditor::new()?;
//!
//! // Launch the interactive edit screen
//! editor.run_interactive()?;
//! ```
//!
//! # Module Structure
//!
//! - [`api`]: Profile backend trait, HTTP client and demo double
//! - [`config`]: Configuration loading
//! - [`crop`]: The crop pipeline
//! - [`error`]: Error types and result aliases
//! - [`flow`]: Edit-screen orchestration
//! - [`image_processing`]: Image resizing and data-URI codec
//! - [`profile`]: Entity and wire types
//! - [`ui`]: The edit screen and crop dialog

pub mod api;
pub mod config;
pub mod crop;
pub mod error;
pub mod flow;
pub mod image_processing;
pub mod profile;
pub mod ui;

// Re-export primary types for convenience
pub use api::{DemoBackend, ProfileApi, ProfileBackend};
pub use config::Config;
pub use error::{AppError, Result};
pub use flow::ProfileEditFlow;
pub use profile::Specialist;

use std::sync::Arc;

/// Main entry point for the profile edit application.
///
/// This struct provides a facade over the various subsystems, handling
/// initialization and orchestration. It's the recommended way to use the
/// library for most use cases.
pub struct ProfileEditor {
    backend: Arc<dyn ProfileBackend>,
}

impl ProfileEditor {
    /// Creates an editor backed by the real profile service.
    ///
    /// Loads configuration from environment variables (including `.env`
    /// files) and builds the HTTP client from it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is incomplete or the client
    /// cannot be constructed.
    pub fn new() -> Result<Self> {
        let config = Config::load()?;
        Self::with_config(&config)
    }

    /// Creates an editor from a pre-built configuration.
    pub fn with_config(config: &Config) -> Result<Self> {
        let api = ProfileApi::new(config)?;
        Ok(Self {
            backend: Arc::new(api),
        })
    }

    /// Creates an editor over any backend, such as a test double.
    pub fn with_backend(backend: Arc<dyn ProfileBackend>) -> Self {
        Self { backend }
    }

    /// Creates an editor with the in-memory demo backend. No configuration
    /// or network access is required.
    pub fn demo() -> Self {
        Self::with_backend(Arc::new(DemoBackend::sample()))
    }

    /// Launches the interactive edit screen.
    ///
    /// This is the main entry point for the visual workflow: the profile is
    /// fetched, the form seeded, and the user can edit fields, crop a new
    /// image and submit.
    pub fn run_interactive(&self) -> Result<()> {
        ui::run_edit_ui(self.backend.clone())
    }

    /// Fetches the profile without launching the UI.
    ///
    /// Useful for headless operation or for inspecting the profile
    /// programmatically.
    pub async fn fetch_profile(&self) -> Result<Specialist> {
        self.backend.fetch_profile().await
    }

    /// Returns the backend this editor operates on.
    pub fn backend(&self) -> Arc<dyn ProfileBackend> {
        self.backend.clone()
    }
}

/// Initializes the library by loading environment variables.
///
/// Call this once at application startup before using any other functions.
/// This loads `.env` files if present and sets up the environment.
pub fn init() {
    let _ = dotenvy::dotenv();
}
