//! The crop pipeline: geometry, rasterization and the interactive session.
//!
//! Split into focused submodules:
//! - [`geometry`]: display-space crop rectangles and initial placement
//! - [`raster`]: natural-resolution rasterization and blob export
//! - [`session`]: the state machine driven by the crop dialog

pub mod geometry;
pub mod raster;
pub mod session;

pub use geometry::{CropRect, Unit, centered_aspect_crop};
pub use raster::{DisplaySize, ExportOutcome, ExportedBlob, RasterOutcome, TrimSettings};
pub use session::{CROP_ASPECT, ConfirmOutcome, CropSession, SessionState};
