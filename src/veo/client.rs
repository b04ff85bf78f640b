//! VeoClient - handles communication with the Veo video generation API.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::GenerationError;
use super::fetch;
use super::request::GenerationRequest;
use crate::config::Config;

/// Primary environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fallback environment variable holding the API key.
pub const API_KEY_FALLBACK_ENV: &str = "API_KEY";

/// Default base URL for the Generative Language API.
pub const VEO_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model for video generation.
pub const DEFAULT_MODEL: &str = "veo-2.0-generate-001";

/// Number of videos requested per generation.
const SAMPLE_COUNT: u32 = 1;

/// Timeout for submit and poll calls.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection timeout for every request.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the video download, which carries the whole file.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// The ambient credential authorizing API calls and asset downloads.
///
/// Loaded once at start-up. `Debug` and `Display` never reveal the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, GenerationError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(GenerationError::MissingApiKey);
        }
        Ok(Self(key))
    }

    /// Read the key from `GEMINI_API_KEY`, falling back to `API_KEY`.
    pub fn from_env() -> Result<Self, GenerationError> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_FALLBACK_ENV).ok())
            .ok_or(GenerationError::MissingApiKey)
            .and_then(Self::new)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// The remote service the generation lifecycle talks to.
pub trait VideoService {
    /// Submit a generation job and return its operation handle.
    fn submit(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<Operation, GenerationError>> + Send;

    /// Re-query the status of an operation.
    fn poll(
        &self,
        operation: &Operation,
    ) -> impl Future<Output = Result<Operation, GenerationError>> + Send;

    /// Download a finished video into `dest_dir`, returning the local path.
    fn download(
        &self,
        uri: &str,
        dest_dir: &Path,
    ) -> impl Future<Output = Result<PathBuf, GenerationError>> + Send;
}

/// Request body for `predictLongRunning`.
#[derive(Debug, Serialize)]
struct PredictRequest {
    instances: Vec<PredictInstance>,
    parameters: PredictParameters,
}

#[derive(Debug, Serialize)]
struct PredictInstance {
    prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImagePayload>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload {
    bytes_base64_encoded: String,
    mime_type: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PredictParameters {
    aspect_ratio: String,
    sample_count: u32,
}

impl PredictRequest {
    fn from_request(request: &GenerationRequest) -> Self {
        Self {
            instances: vec![PredictInstance {
                prompt: request.full_prompt(),
                image: request.reference_image().map(|image| ImagePayload {
                    bytes_base64_encoded: image.data.clone(),
                    mime_type: image.mime_type.clone(),
                }),
            }],
            parameters: PredictParameters {
                aspect_ratio: request.aspect_ratio().as_str().to_string(),
                sample_count: SAMPLE_COUNT,
            },
        }
    }
}

/// A long-running generation job as reported by the service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Operation {
    /// Resource name used to poll, e.g. `models/<model>/operations/<id>`.
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResponse>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Option<Vec<GeneratedSample>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoRef {
    #[serde(default)]
    pub uri: Option<String>,
}

/// Error object carried by a finished operation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Client for the Veo video generation API.
pub struct VeoClient {
    api_key: ApiKey,
    base_url: String,
    model: String,
    http_client: reqwest::Client,
}

impl VeoClient {
    /// Create a client reading the API key from the environment.
    pub fn new() -> Result<Self, GenerationError> {
        Self::build(ApiKey::from_env()?, VEO_API_BASE_URL, DEFAULT_MODEL)
    }

    pub fn with_api_key(api_key: String) -> Result<Self, GenerationError> {
        Self::build(ApiKey::new(api_key)?, VEO_API_BASE_URL, DEFAULT_MODEL)
    }

    /// Create a client against a custom base URL (used for mock servers).
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, GenerationError> {
        Self::build(ApiKey::new(api_key)?, &base_url, DEFAULT_MODEL)
    }

    pub fn with_model(api_key: String, model: String) -> Result<Self, GenerationError> {
        Self::build(ApiKey::new(api_key)?, VEO_API_BASE_URL, &model)
    }

    /// Create a client from the `[api]` section of the configuration.
    pub fn from_config(config: &Config, api_key: ApiKey) -> Result<Self, GenerationError> {
        Self::build(api_key, &config.api.base_url, &config.api.model)
    }

    fn build(api_key: ApiKey, base_url: &str, model: &str) -> Result<Self, GenerationError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            http_client,
        })
    }

    pub fn api_key(&self) -> &ApiKey {
        &self.api_key
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn submit_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:predictLongRunning",
            self.base_url, self.model
        )
    }

    fn operation_url(&self, operation: &Operation) -> String {
        format!(
            "{}/v1beta/{}",
            self.base_url,
            operation.name.trim_start_matches('/')
        )
    }

    /// Submit a generation request.
    ///
    /// Sends one `predictLongRunning` call requesting a single video with the
    /// given aspect ratio. The reference image is included only when present.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Request` when the service rejects the call
    /// and `GenerationError::Http` when the request cannot be sent.
    pub async fn submit_generation(
        &self,
        request: &GenerationRequest,
    ) -> Result<Operation, GenerationError> {
        let body = PredictRequest::from_request(request);

        log::info!(
            "Submitting generation request (model: {}, aspect ratio: {}, image: {})",
            self.model,
            request.aspect_ratio(),
            request.reference_image().is_some()
        );

        let response = self
            .http_client
            .post(self.submit_url())
            .header("x-goog-api-key", self.api_key.expose())
            .timeout(DEFAULT_TIMEOUT)
            .json(&body)
            .send()
            .await?;

        let operation = Self::read_operation(response).await?;
        log::info!("Generation submitted, operation: {}", operation.name);
        Ok(operation)
    }

    /// Re-query the status of an operation.
    pub async fn poll_operation(&self, operation: &Operation) -> Result<Operation, GenerationError> {
        let response = self
            .http_client
            .get(self.operation_url(operation))
            .header("x-goog-api-key", self.api_key.expose())
            .timeout(DEFAULT_TIMEOUT)
            .send()
            .await?;

        let updated = Self::read_operation(response).await?;
        log::debug!("Operation {} done: {}", updated.name, updated.done);
        Ok(updated)
    }

    async fn read_operation(response: reqwest::Response) -> Result<Operation, GenerationError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Request {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

impl VideoService for VeoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<Operation, GenerationError> {
        self.submit_generation(request).await
    }

    async fn poll(&self, operation: &Operation) -> Result<Operation, GenerationError> {
        self.poll_operation(operation).await
    }

    async fn download(&self, uri: &str, dest_dir: &Path) -> Result<PathBuf, GenerationError> {
        let request = self
            .http_client
            .get(fetch::authorized_url(uri, &self.api_key)?)
            .timeout(DOWNLOAD_TIMEOUT);
        fetch::download_to_dir(request, uri, dest_dir).await
    }
}
