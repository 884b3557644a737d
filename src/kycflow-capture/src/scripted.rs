//! Scripted in-memory SDK implementation.
//!
//! Used by tests and the CLI demo: each created instance pops the next
//! planned behavior from a script, and every lifecycle call is appended to a
//! shared event log so tests can assert ordering properties (for example
//! that a prior session is aborted before the next one initializes).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::error::SdkError;
use crate::options::SessionOptions;
use crate::sdk::{CaptureSdk, PreInitConfig, SdkProvider};

/// Planned behavior for one scripted capture session.
#[derive(Debug, Clone)]
pub enum ScriptedCapture {
    /// `capture` resolves with these image bytes.
    Image(Vec<u8>),
    /// `initialize` fails with this vendor message.
    FailInit {
        /// Vendor message returned from `initialize`.
        message: String,
    },
    /// `capture` fails with this vendor message.
    FailCapture {
        /// Vendor message returned from `capture`.
        message: String,
    },
    /// `capture` never resolves (exercises the caller's timeout).
    Hang,
}

/// Deterministic [`SdkProvider`] driven by a script of planned behaviors.
///
/// When the script runs dry, further sessions behave like
/// [`ScriptedCapture::Image`] with a small placeholder payload.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<ScriptedCapture>>,
    events: Arc<Mutex<Vec<String>>>,
    next_id: AtomicUsize,
}

impl ScriptedProvider {
    /// Create a provider whose sessions all succeed with placeholder bytes.
    pub fn new() -> Self {
        Self::with_script(Vec::new())
    }

    /// Create a provider with planned per-session behaviors, in order.
    pub fn with_script(script: Vec<ScriptedCapture>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            events: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Append a planned behavior for the next created session.
    pub fn push(&self, behavior: ScriptedCapture) {
        self.script.lock().expect("script lock").push_back(behavior);
    }

    /// Snapshot of the lifecycle event log
    /// (`create#N` / `init#N` / `capture#N` / `abort#N` / `pre-initialize`).
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("events lock").clone()
    }

    fn record(&self, event: String) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SdkProvider for ScriptedProvider {
    fn create(&self, options: &SessionOptions) -> Result<Box<dyn CaptureSdk>, SdkError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let behavior = self
            .script
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| ScriptedCapture::Image(placeholder_jpeg()));

        debug!(
            id = id,
            kind = options.kind_label(),
            "scripted provider: creating session"
        );
        self.record(format!("create#{id}"));

        Ok(Box::new(ScriptedSdk {
            id,
            behavior,
            events: Arc::clone(&self.events),
        }))
    }

    async fn pre_initialize(&self, config: &PreInitConfig) -> Result<(), SdkError> {
        debug!(
            models_url = %config.models_url,
            pub_key_url = %config.pub_key_url,
            "scripted provider: pre-initialize"
        );
        self.record("pre-initialize".to_string());
        Ok(())
    }
}

struct ScriptedSdk {
    id: usize,
    behavior: ScriptedCapture,
    events: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSdk {
    fn record(&self, verb: &str) {
        self.events
            .lock()
            .expect("events lock")
            .push(format!("{verb}#{}", self.id));
    }
}

#[async_trait]
impl CaptureSdk for ScriptedSdk {
    async fn initialize(&self) -> Result<(), SdkError> {
        self.record("init");
        match &self.behavior {
            ScriptedCapture::FailInit { message } => Err(SdkError::InitFailed {
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }

    async fn capture(&self) -> Result<Vec<u8>, SdkError> {
        self.record("capture");
        match &self.behavior {
            ScriptedCapture::Image(bytes) => Ok(bytes.clone()),
            ScriptedCapture::FailCapture { message } => Err(SdkError::CaptureFailed {
                message: message.clone(),
            }),
            ScriptedCapture::Hang => futures::future::pending().await,
            ScriptedCapture::FailInit { message } => Err(SdkError::CaptureFailed {
                message: message.clone(),
            }),
        }
    }

    async fn abort(&self) -> Result<(), SdkError> {
        self.record("abort");
        Ok(())
    }
}

/// Two-byte JPEG SOI marker plus padding; enough to stand in for an image.
fn placeholder_jpeg() -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend_from_slice(&[0u8; 14]);
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::FaceCaptureOptions;

    fn face_options() -> SessionOptions {
        SessionOptions::Face(FaceCaptureOptions::default())
    }

    #[tokio::test]
    async fn test_scripted_success_and_event_order() {
        let provider = ScriptedProvider::with_script(vec![ScriptedCapture::Image(vec![1, 2, 3])]);

        let sdk = provider.create(&face_options()).unwrap();
        sdk.initialize().await.unwrap();
        let bytes = sdk.capture().await.unwrap();
        sdk.abort().await.unwrap();

        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(
            provider.events(),
            vec!["create#0", "init#0", "capture#0", "abort#0"]
        );
    }

    #[tokio::test]
    async fn test_scripted_init_failure() {
        let provider = ScriptedProvider::with_script(vec![ScriptedCapture::FailInit {
            message: "no model bundle".to_string(),
        }]);

        let sdk = provider.create(&face_options()).unwrap();
        let err = sdk.initialize().await.unwrap_err();
        assert_eq!(err.vendor_message(), "no model bundle");
    }

    #[tokio::test]
    async fn test_script_runs_dry_to_placeholder() {
        let provider = ScriptedProvider::new();
        let sdk = provider.create(&face_options()).unwrap();
        sdk.initialize().await.unwrap();
        let bytes = sdk.capture().await.unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
