//! Profile API client.
//!
//! All network access goes through the [`ProfileBackend`] trait so the edit
//! screen is identical whether it talks to the real service or to the
//! in-memory [`DemoBackend`]. The real client is an explicitly constructed
//! value configured once from [`Config`] and passed by reference; there is
//! no process-wide shared client.

use crate::config::Config;
use crate::crop::raster::ExportedBlob;
use crate::error::{AppError, Result};
use crate::profile::{
    ProfileDetailResponse, ProfileUpdateRequest, ProfileUpdateResponse, Specialist, Specialty,
    StrongArea,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Mutex;
use url::Url;

/// Header carrying the application key on every request.
pub const APPLICATION_KEY_HEADER: &str = "x-application-key";

/// The four operations the edit screen needs from the profile service.
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    /// `GET /api/profile`
    async fn fetch_profile(&self) -> Result<Specialist>;

    /// `PUT /api/profile`
    async fn update_profile(&self, request: &ProfileUpdateRequest) -> Result<ProfileUpdateResponse>;

    /// `POST /api/image`, multipart field `image`. The response shape is
    /// implementation-defined, so the body is not interpreted.
    async fn upload_image(&self, image: ExportedBlob) -> Result<()>;

    /// `DELETE /api/image`
    async fn delete_image(&self) -> Result<()>;
}

/// HTTP implementation of [`ProfileBackend`].
pub struct ProfileApi {
    client: reqwest::Client,
    base_url: Url,
}

impl ProfileApi {
    /// Builds the client: base URL and `x-application-key` header from the
    /// configuration. The key travels as a default header so every request
    /// carries it without repeating it at the call sites.
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::config(format!("Invalid base URL: {}", e)))?;

        let key = HeaderValue::from_str(&config.application_key)
            .map_err(|e| AppError::config(format!("Invalid application key: {}", e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(APPLICATION_KEY_HEADER, key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AppError::config(format!("Invalid endpoint {}: {}", path, e)))
    }
}

#[async_trait]
impl ProfileBackend for ProfileApi {
    async fn fetch_profile(&self) -> Result<Specialist> {
        let url = self.endpoint("/api/profile")?;
        tracing::debug!(%url, "fetching profile");

        let response: ProfileDetailResponse = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.specialist)
    }

    async fn update_profile(&self, request: &ProfileUpdateRequest) -> Result<ProfileUpdateResponse> {
        let url = self.endpoint("/api/profile")?;
        tracing::debug!(%url, "updating profile fields");

        let response = self
            .client
            .put(url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response)
    }

    async fn upload_image(&self, image: ExportedBlob) -> Result<()> {
        let url = self.endpoint("/api/image")?;
        tracing::debug!(%url, bytes = image.len(), mime = %image.mime, "uploading profile image");

        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name("image")
            .mime_str(&image.mime)
            .map_err(|e| AppError::api(format!("Invalid image MIME type: {}", e)))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        self.client
            .post(url)
            .multipart(form)
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }

    async fn delete_image(&self) -> Result<()> {
        let url = self.endpoint("/api/image")?;
        tracing::debug!(%url, "deleting profile image");

        self.client.delete(url).send().await?.error_for_status()?;

        Ok(())
    }
}

/// A call observed by [`DemoBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchProfile,
    UpdateProfile,
    UploadImage { bytes: usize },
    DeleteImage,
}

/// In-memory backend for demo mode and tests.
///
/// Applies updates to a stored profile and records every call so tests can
/// assert on exactly which requests a submit produced.
pub struct DemoBackend {
    profile: Mutex<Specialist>,
    calls: Mutex<Vec<BackendCall>>,
}

impl DemoBackend {
    pub fn new(profile: Specialist) -> Self {
        Self {
            profile: Mutex::new(profile),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A populated profile for running the screen without a backend.
    pub fn sample() -> Self {
        Self::new(Specialist {
            id: "demo-1".to_string(),
            name: "Aoi Tanaka".to_string(),
            introduction: "Certified counsellor with ten years of practice.".to_string(),
            counselling_time: "Weekdays 10:00-18:00".to_string(),
            visitable_area: "Tokyo and Kanagawa".to_string(),
            image_path: String::new(),
            strong_areas: vec![StrongArea {
                code: "01".to_string(),
                name: "Family".to_string(),
            }],
            specialty: Specialty {
                code: "S1".to_string(),
                name: "Counselling".to_string(),
            },
        })
    }

    /// The calls received so far, in order.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().expect("call log poisoned").push(call);
    }
}

#[async_trait]
impl ProfileBackend for DemoBackend {
    async fn fetch_profile(&self) -> Result<Specialist> {
        self.record(BackendCall::FetchProfile);
        Ok(self.profile.lock().expect("profile poisoned").clone())
    }

    async fn update_profile(&self, request: &ProfileUpdateRequest) -> Result<ProfileUpdateResponse> {
        self.record(BackendCall::UpdateProfile);

        let mut profile = self.profile.lock().expect("profile poisoned");
        profile.introduction = request.introduction.clone();
        profile.counselling_time = request.counselling_time.clone();
        profile.visitable_area = request.visitable_area.clone();

        Ok(ProfileUpdateResponse {
            message: "profile updated".to_string(),
        })
    }

    async fn upload_image(&self, image: ExportedBlob) -> Result<()> {
        self.record(BackendCall::UploadImage {
            bytes: image.len(),
        });
        self.profile.lock().expect("profile poisoned").image_path =
            "/images/demo-profile".to_string();
        Ok(())
    }

    async fn delete_image(&self) -> Result<()> {
        self.record(BackendCall::DeleteImage);
        self.profile
            .lock()
            .expect("profile poisoned")
            .image_path
            .clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_rejects_malformed_base_url() {
        let config = Config {
            base_url: "not a url".to_string(),
            application_key: "key".to_string(),
        };
        assert!(matches!(ProfileApi::new(&config), Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn demo_backend_applies_updates_and_records_calls() {
        let backend = DemoBackend::sample();

        let request = ProfileUpdateRequest {
            introduction: "new intro".to_string(),
            counselling_time: "anytime".to_string(),
            visitable_area: "Osaka".to_string(),
            strong_area_codes: vec![],
        };
        backend.update_profile(&request).await.unwrap();

        let profile = backend.fetch_profile().await.unwrap();
        assert_eq!(profile.introduction, "new intro");
        assert_eq!(
            backend.calls(),
            vec![BackendCall::UpdateProfile, BackendCall::FetchProfile]
        );
    }
}
