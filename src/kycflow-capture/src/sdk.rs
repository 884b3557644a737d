//! The capture-SDK capability interface.
//!
//! A vendor SDK is modeled as a host-controlled black box: construct an
//! instance with fixed options, initialize it, run one capture, abort it.
//! Nothing else about the vendor is assumed.

use async_trait::async_trait;

use crate::error::SdkError;
use crate::options::SessionOptions;

/// Configuration for the one-time vendor warm-up.
///
/// Performed once at application startup, before any capture session: the
/// OCR vendor wants its license key validated and the face vendor preloads
/// models and the backend public key.
#[derive(Debug, Clone)]
pub struct PreInitConfig {
    /// OCR vendor license key.
    pub license_key: String,
    /// URL serving the face-model bundle (`{base}/v1/models`).
    pub models_url: String,
    /// URL serving the backend public key (`{base}/v1/pub_key`).
    pub pub_key_url: String,
    /// Extra headers forwarded to the vendor's preload requests.
    pub headers: Vec<(String, String)>,
}

/// One live vendor capture lifecycle.
///
/// Implementations wrap a single vendor SDK instance. A handle is single-use:
/// after `capture` resolves or `abort` is called, the instance is dead and a
/// new one must be created through the [`SdkProvider`].
///
/// ## Contract
///
/// - `initialize` completes before `capture` starts; callers enforce this.
/// - `abort` must be safe to call at any point of the lifecycle, including
///   before `initialize` and after a completed `capture`.
#[async_trait]
pub trait CaptureSdk: Send + Sync {
    /// Bring up the vendor instance (camera acquisition, model load).
    async fn initialize(&self) -> Result<(), SdkError>;

    /// Run the capture and return the encoded image bytes.
    async fn capture(&self) -> Result<Vec<u8>, SdkError>;

    /// Tear the instance down, releasing the camera and any injected UI.
    async fn abort(&self) -> Result<(), SdkError>;
}

/// Factory for vendor capture instances.
#[async_trait]
pub trait SdkProvider: Send + Sync {
    /// Construct a fresh vendor instance for one capture session.
    fn create(&self, options: &SessionOptions) -> Result<Box<dyn CaptureSdk>, SdkError>;

    /// One-time vendor warm-up.
    ///
    /// Failures here are expected to be logged and tolerated by the caller;
    /// the wizard can still run, the first capture just pays the preload
    /// cost.
    async fn pre_initialize(&self, _config: &PreInitConfig) -> Result<(), SdkError> {
        Ok(())
    }
}
