//! Backend gateway.
//!
//! Encapsulates the outbound calls to the verification backend and
//! translates transport failures into domain errors.
//!
//! ## Endpoints
//!
//! - `POST /v1/process` — submit a face capture for quality/ICAO analysis.
//! - `POST /v1/verifyWithPicID` — match a face capture against a reference
//!   document image.
//! - `GET /v1/pub_key`, `GET /v1/models` — reserved; consumed only by the
//!   vendor SDK pre-initialization, exposed here as URL helpers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, instrument, warn};

use crate::error::WizardError;
use crate::types::{now_millis, CaptureMetadata, CaptureResponse, MatchOutcome};

/// Outbound verification-backend operations.
///
/// The HTTP gateway is the production implementation; tests inject an
/// in-memory double.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Submit a face capture for processing.
    async fn submit_capture(
        &self,
        image: &[u8],
        meta: &CaptureMetadata,
    ) -> Result<CaptureResponse, WizardError>;

    /// Match a face capture against a base64 reference document image.
    ///
    /// Not idempotent: the backend may keep server-side state. The response
    /// is authoritative and must not be cached.
    async fn match_against_reference(
        &self,
        image: &[u8],
        reference_b64: &str,
    ) -> Result<MatchOutcome, WizardError>;
}

/// HTTP client for the verification backend.
pub struct BackendGateway {
    client: Client,
    base_url: String,
}

impl BackendGateway {
    /// Create a gateway for the given base URL.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, WizardError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(format!("kycflow/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WizardError::Config {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Reserved: URL of the backend public key used by SDK warm-up.
    pub fn pub_key_url(&self) -> String {
        format!("{}/v1/pub_key", self.base_url)
    }

    /// Reserved: URL of the face-model bundle used by SDK warm-up.
    pub fn models_url(&self) -> String {
        format!("{}/v1/models", self.base_url)
    }

    fn transport_error(url: &str, e: &reqwest::Error) -> WizardError {
        warn!(url = %url, error = %e, "backend request failed");
        WizardError::Backend {
            message: format!("request to {url} failed: {e}"),
        }
    }

    /// Extract a user-displayable message from a failed response: the
    /// body's `message` field when parseable, else the HTTP status line.
    async fn error_from_response(url: &str, response: reqwest::Response) -> WizardError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message")?.as_str().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {status} from {url}"));

        warn!(url = %url, status = %status, "backend returned non-success status");
        WizardError::Backend { message }
    }

    fn image_part(image: &[u8]) -> Result<Part, WizardError> {
        Part::bytes(image.to_vec())
            .file_name("face-capture.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| WizardError::Backend {
                message: format!("failed to build multipart body: {e}"),
            })
    }
}

#[async_trait]
impl Backend for BackendGateway {
    #[instrument(skip_all, fields(bytes = image.len()))]
    async fn submit_capture(
        &self,
        image: &[u8],
        meta: &CaptureMetadata,
    ) -> Result<CaptureResponse, WizardError> {
        let url = format!("{}/v1/process", self.base_url);
        let capture_meta = serde_json::to_string(meta).map_err(|e| WizardError::Backend {
            message: format!("failed to encode capture metadata: {e}"),
        })?;

        let form = Form::new()
            .part("file", Self::image_part(image)?)
            .text("capture_meta", capture_meta);

        info!(url = %url, "submitting capture");
        let response = self
            .client
            .post(&url)
            .query(&[("ts", now_millis().to_string())])
            .header("X-DEBUG", "1")
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport_error(&url, &e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(&url, response).await);
        }

        let body = response
            .json::<CaptureResponse>()
            .await
            .map_err(|e| WizardError::Backend {
                message: format!("failed to parse response from {url}: {e}"),
            })?;

        debug!(
            has_quality = body.data.is_some(),
            icao_fields = body.icao_data.len(),
            "capture processed"
        );
        Ok(body)
    }

    #[instrument(skip_all, fields(bytes = image.len()))]
    async fn match_against_reference(
        &self,
        image: &[u8],
        reference_b64: &str,
    ) -> Result<MatchOutcome, WizardError> {
        let url = format!("{}/v1/verifyWithPicID", self.base_url);

        let form = Form::new()
            .part("file", Self::image_part(image)?)
            .text("picId", reference_b64.to_string());

        info!(url = %url, "matching capture against reference document");
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Self::transport_error(&url, &e))?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(&url, response).await);
        }

        let outcome = response
            .json::<MatchOutcome>()
            .await
            .map_err(|e| WizardError::Backend {
                message: format!("failed to parse response from {url}: {e}"),
            })?;

        info!(matched = outcome.is_match, "match result received");
        Ok(outcome)
    }
}
