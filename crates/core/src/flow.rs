//! Profile edit orchestration.
//!
//! [`ProfileEditFlow`] sits between the form, the crop session and the
//! profile backend. It owns the previously saved image reference, stages the
//! resized selection for the crop dialog, receives the exported blob, tracks
//! the upload size ceiling, and turns the state at submit time into the set
//! of requests to issue.

use crate::api::ProfileBackend;
use crate::crop::raster::ExportedBlob;
use crate::error::{AppError, Result};
use crate::profile::{ProfileUpdateRequest, Specialist};
use std::path::Path;
use std::sync::Arc;

/// Upload ceiling for the cropped image, in bytes (5 MB).
pub const MAX_FILE_SIZE: usize = 5_000_000;

/// MIME types the file-selection surface accepts.
pub const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif"];

/// A file picked by the user: raw bytes plus the declared media type.
///
/// Ephemeral; owned by the flow only for the duration of one selection event.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub bytes: Vec<u8>,
    pub mime: String,
}

/// Reads a picked file and derives its media type from the path.
///
/// # Errors
///
/// Returns [`AppError::UnsupportedImageType`] unless the extension maps to
/// one of [`ACCEPTED_IMAGE_TYPES`], and an I/O error if the read fails.
pub fn load_source_file(path: &Path) -> Result<SourceFile> {
    let mime = mime_guess::from_path(path).first_raw().unwrap_or_default();
    if !ACCEPTED_IMAGE_TYPES.contains(&mime) {
        return Err(AppError::UnsupportedImageType(
            path.display().to_string(),
        ));
    }

    let bytes = std::fs::read(path)?;
    Ok(SourceFile {
        bytes,
        mime: mime.to_string(),
    })
}

/// What the user currently sees as their profile image.
///
/// Equality with the server-provided original path is the sole signal of
/// "image unchanged"; a `Local` value always counts as changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewReference {
    /// No image; an original that existed is pending deletion.
    None,
    /// The server-side path of the saved image.
    Remote(String),
    /// A locally staged export, tagged with its staging sequence number.
    Local(u64),
}

impl PreviewReference {
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// A resized selection waiting for the crop dialog, tagged with the
/// selection token that produced it.
#[derive(Debug, Clone)]
pub struct StagedSelection {
    pub token: u64,
    pub data_uri: String,
    pub mime: String,
}

/// The image half of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageAction {
    None,
    Upload(ExportedBlob),
    Delete,
}

/// Everything one submit will send.
#[derive(Debug, Clone)]
pub struct SubmitPlan {
    pub update: ProfileUpdateRequest,
    pub image: ImageAction,
}

/// Orchestrates one profile-editing screen against a [`ProfileBackend`].
pub struct ProfileEditFlow<B: ProfileBackend + ?Sized> {
    backend: Arc<B>,
    original_image_path: Option<String>,
    preview: PreviewReference,
    trimmed: Option<ExportedBlob>,
    oversize: bool,
    loading: bool,
    selection_seq: u64,
    staging_seq: u64,
    staged: Option<StagedSelection>,
}

impl<B: ProfileBackend + ?Sized> ProfileEditFlow<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            original_image_path: None,
            preview: PreviewReference::None,
            trimmed: None,
            oversize: false,
            loading: false,
            selection_seq: 0,
            staging_seq: 0,
            staged: None,
        }
    }

    pub fn backend(&self) -> Arc<B> {
        self.backend.clone()
    }

    /// Seeds the flow from a fetched profile: the server image path becomes
    /// both the original reference and the visible preview.
    pub fn apply_profile(&mut self, profile: &Specialist) {
        if profile.image_path.is_empty() {
            self.original_image_path = None;
            self.preview = PreviewReference::None;
        } else {
            self.original_image_path = Some(profile.image_path.clone());
            self.preview = PreviewReference::Remote(profile.image_path.clone());
        }
        self.trimmed = None;
        self.oversize = false;
    }

    pub fn preview(&self) -> &PreviewReference {
        &self.preview
    }

    pub fn trimmed(&self) -> Option<&ExportedBlob> {
        self.trimmed.as_ref()
    }

    /// Whether the staged blob exceeds [`MAX_FILE_SIZE`]. While set, the
    /// image field is in error and submit is blocked.
    pub fn oversize(&self) -> bool {
        self.oversize
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn can_submit(&self) -> bool {
        !self.oversize && !self.loading
    }

    /// Starts a new file selection and returns its token.
    ///
    /// Results from an earlier selection that is still resizing are
    /// discarded when they arrive with a stale token, so overlapping picks
    /// cannot overwrite a newer one.
    pub fn begin_selection(&mut self) -> u64 {
        self.selection_seq += 1;
        self.selection_seq
    }

    /// Hands the resize result to the flow. Returns `false` (and stages
    /// nothing) if `token` is not the latest selection.
    pub fn apply_resized(&mut self, token: u64, data_uri: String, mime: String) -> bool {
        if token != self.selection_seq {
            tracing::debug!(token, latest = self.selection_seq, "discarding stale resize result");
            return false;
        }
        self.staged = Some(StagedSelection {
            token,
            data_uri,
            mime,
        });
        true
    }

    /// Takes the staged selection for the crop dialog to consume.
    pub fn take_staged(&mut self) -> Option<StagedSelection> {
        self.staged.take()
    }

    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Receives the exported blob from a confirmed crop: it becomes the
    /// preview and the oversize flag is re-derived from its size.
    pub fn stage_export(&mut self, blob: ExportedBlob) {
        self.oversize = blob.len() > MAX_FILE_SIZE;
        self.staging_seq += 1;
        self.preview = PreviewReference::Local(self.staging_seq);
        self.trimmed = Some(blob);
    }

    /// The delete button: clears the preview and the oversize error.
    pub fn delete_image(&mut self) {
        self.preview = PreviewReference::None;
        self.oversize = false;
    }

    /// True when the preview still points at the server-provided original.
    pub fn image_unchanged(&self) -> bool {
        match (&self.preview, &self.original_image_path) {
            (PreviewReference::None, None) => true,
            (PreviewReference::Remote(path), Some(original)) => path == original,
            _ => false,
        }
    }

    /// Derives the set of requests a submit will issue. The profile update
    /// always fires; upload and delete are mutually exclusive and only fire
    /// when the preview differs from the original.
    pub fn submit_plan(&self, update: ProfileUpdateRequest) -> SubmitPlan {
        let image = if self.image_unchanged() {
            ImageAction::None
        } else if self.preview.is_set() {
            match self.trimmed.clone() {
                Some(blob) => ImageAction::Upload(blob),
                None => ImageAction::None,
            }
        } else {
            ImageAction::Delete
        };

        SubmitPlan { update, image }
    }

    /// Issues a plan's requests concurrently. Both requests of a two-call
    /// plan run to completion before the outcome is reported; the first
    /// error wins, with no per-request rollback.
    pub async fn execute(backend: &B, plan: SubmitPlan) -> Result<String> {
        let update = backend.update_profile(&plan.update);

        match plan.image {
            ImageAction::None => Ok(update.await?.message),
            ImageAction::Upload(blob) => {
                let (update_result, image_result) =
                    futures::future::join(update, backend.upload_image(blob)).await;
                let response = update_result?;
                image_result?;
                Ok(response.message)
            }
            ImageAction::Delete => {
                let (update_result, image_result) =
                    futures::future::join(update, backend.delete_image()).await;
                let response = update_result?;
                image_result?;
                Ok(response.message)
            }
        }
    }

    /// Submits the form. The loading flag clears once every request of the
    /// group has settled, whatever the outcome.
    pub async fn submit(&mut self, update: ProfileUpdateRequest) -> Result<String> {
        let plan = self.begin_submit(update);
        let result = Self::execute(self.backend.as_ref(), plan).await;
        self.finish_submit();
        result
    }

    /// Derives the plan and raises the loading flag. Used by callers that
    /// run [`execute`](Self::execute) off the UI thread; every settled
    /// outcome must be answered with [`finish_submit`](Self::finish_submit).
    pub fn begin_submit(&mut self, update: ProfileUpdateRequest) -> SubmitPlan {
        self.loading = true;
        self.submit_plan(update)
    }

    /// Clears the loading flag once the submit group has settled.
    pub fn finish_submit(&mut self) {
        self.loading = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackendCall, DemoBackend};
    use crate::profile::ProfileUpdateResponse;
    use async_trait::async_trait;

    fn update_request() -> ProfileUpdateRequest {
        ProfileUpdateRequest {
            introduction: "intro".to_string(),
            counselling_time: "daytime".to_string(),
            visitable_area: "Chiba".to_string(),
            strong_area_codes: vec!["02".to_string()],
        }
    }

    fn blob(bytes: usize) -> ExportedBlob {
        ExportedBlob {
            bytes: vec![0; bytes],
            mime: "image/jpeg".to_string(),
        }
    }

    fn flow_with_remote_image() -> (Arc<DemoBackend>, ProfileEditFlow<DemoBackend>) {
        let backend = Arc::new(DemoBackend::sample());
        let mut flow = ProfileEditFlow::new(backend.clone());
        let mut profile =
            futures::executor::block_on(backend.fetch_profile()).expect("demo fetch");
        profile.image_path = "/images/original.jpg".to_string();
        flow.apply_profile(&profile);
        (backend, flow)
    }

    #[tokio::test]
    async fn unchanged_preview_issues_only_the_update() {
        let (backend, mut flow) = flow_with_remote_image();

        flow.submit(update_request()).await.unwrap();

        let calls: Vec<_> = backend
            .calls()
            .into_iter()
            .filter(|c| *c != BackendCall::FetchProfile)
            .collect();
        assert_eq!(calls, vec![BackendCall::UpdateProfile]);
    }

    #[tokio::test]
    async fn staged_export_issues_exactly_one_upload() {
        let (backend, mut flow) = flow_with_remote_image();
        flow.stage_export(blob(1_000));

        flow.submit(update_request()).await.unwrap();

        let calls = backend.calls();
        assert_eq!(
            calls
                .iter()
                .filter(|c| matches!(c, BackendCall::UploadImage { .. }))
                .count(),
            1
        );
        assert_eq!(
            calls
                .iter()
                .filter(|c| **c == BackendCall::UpdateProfile)
                .count(),
            1
        );
        assert!(!calls.contains(&BackendCall::DeleteImage));
    }

    #[tokio::test]
    async fn cleared_preview_issues_exactly_one_delete() {
        let (backend, mut flow) = flow_with_remote_image();
        flow.delete_image();

        flow.submit(update_request()).await.unwrap();

        let calls = backend.calls();
        assert_eq!(
            calls
                .iter()
                .filter(|c| **c == BackendCall::DeleteImage)
                .count(),
            1
        );
        assert!(
            !calls
                .iter()
                .any(|c| matches!(c, BackendCall::UploadImage { .. }))
        );
    }

    #[test]
    fn empty_original_and_empty_preview_count_as_unchanged() {
        let backend = Arc::new(DemoBackend::sample());
        let mut flow = ProfileEditFlow::new(backend.clone());
        let profile = futures::executor::block_on(backend.fetch_profile()).expect("demo fetch");
        assert!(profile.image_path.is_empty());
        flow.apply_profile(&profile);

        assert!(flow.image_unchanged());
        let plan = flow.submit_plan(update_request());
        assert_eq!(plan.image, ImageAction::None);
    }

    #[test]
    fn oversize_flag_sets_and_clears_with_blob_size() {
        let (_, mut flow) = flow_with_remote_image();

        flow.stage_export(blob(6_000_000));
        assert!(flow.oversize());
        assert!(!flow.can_submit());

        flow.stage_export(blob(4_000_000));
        assert!(!flow.oversize());
        assert!(flow.can_submit());
    }

    #[test]
    fn deleting_the_image_clears_the_oversize_error() {
        let (_, mut flow) = flow_with_remote_image();
        flow.stage_export(blob(6_000_000));

        flow.delete_image();

        assert!(!flow.oversize());
        assert_eq!(*flow.preview(), PreviewReference::None);
    }

    #[test]
    fn stale_selection_results_are_discarded() {
        let (_, mut flow) = flow_with_remote_image();

        let first = flow.begin_selection();
        let second = flow.begin_selection();

        assert!(!flow.apply_resized(first, "data:...".to_string(), "image/png".to_string()));
        assert!(!flow.has_staged());

        assert!(flow.apply_resized(second, "data:...".to_string(), "image/png".to_string()));
        assert!(flow.has_staged());
    }

    struct FailingBackend;

    #[async_trait]
    impl ProfileBackend for FailingBackend {
        async fn fetch_profile(&self) -> crate::error::Result<Specialist> {
            Err(AppError::api("down"))
        }

        async fn update_profile(
            &self,
            _request: &ProfileUpdateRequest,
        ) -> crate::error::Result<ProfileUpdateResponse> {
            Err(AppError::api("down"))
        }

        async fn upload_image(&self, _image: ExportedBlob) -> crate::error::Result<()> {
            Err(AppError::api("down"))
        }

        async fn delete_image(&self) -> crate::error::Result<()> {
            Err(AppError::api("down"))
        }
    }

    #[tokio::test]
    async fn loading_clears_even_when_the_group_fails() {
        let mut flow = ProfileEditFlow::new(Arc::new(FailingBackend));
        flow.stage_export(blob(100));

        let result = flow.submit(update_request()).await;

        assert!(result.is_err());
        assert!(!flow.loading());
    }

    #[test]
    fn source_file_loading_checks_the_accept_list() {
        let dir = tempfile::tempdir().unwrap();

        let image_path = dir.path().join("avatar.png");
        let image = image::DynamicImage::ImageRgba8(image::RgbaImage::new(4, 4));
        image.save(&image_path).unwrap();
        let source = load_source_file(&image_path).unwrap();
        assert_eq!(source.mime, "image/png");
        assert!(!source.bytes.is_empty());

        let text_path = dir.path().join("notes.txt");
        std::fs::write(&text_path, b"hello").unwrap();
        assert!(matches!(
            load_source_file(&text_path),
            Err(AppError::UnsupportedImageType(_))
        ));
    }
}
