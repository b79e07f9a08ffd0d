//! UI state types and event definitions.
//!
//! This module contains the screen state and the events used by the UI.

use crate::profile::Specialist;

/// Current state of the edit screen.
///
/// The screen follows a simple state machine:
/// `Loading` -> `Editing` (fetch succeeded)
///           \-> `Error` (fetch failed)
#[derive(Clone, Debug)]
pub enum UiState {
    /// The profile fetch is still in flight.
    Loading,
    /// The form is populated and editable.
    Editing,
    /// The profile fetch failed.
    Error(String),
}

/// Events received from background worker threads.
///
/// These events are sent through a channel from the fetch, resize and submit
/// workers to the UI thread for state updates.
pub(crate) enum FlowEvent {
    /// The profile fetch finished.
    ProfileLoaded(Box<Specialist>),
    /// The profile fetch failed.
    ProfileFailed(String),
    /// A selected file finished resizing.
    Resized {
        token: u64,
        data_uri: String,
        mime: String,
    },
    /// A selected file could not be resized.
    ResizeFailed { token: u64, reason: String },
    /// The submit group settled successfully.
    Submitted(String),
    /// The submit group settled with a failure.
    SubmitFailed(String),
}
