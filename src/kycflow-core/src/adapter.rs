//! SDK session adapter.
//!
//! Wraps the vendor capture lifecycle behind a uniform async contract and
//! owns the single-slot active handle: at most one vendor session is live
//! process-wide, and starting a new one always aborts the prior one first.
//!
//! ## Protocol per capture
//!
//! 1. Abort any existing handle (best-effort; failures logged, never
//!    surfaced).
//! 2. Build the fixed per-kind option table.
//! 3. Construct the vendor instance; spawn the surface-relocation poll tied
//!    to this session's cancel channel.
//! 4. Initialize; failures map to [`WizardError::SdkInit`].
//! 5. Capture under a wall-clock budget; failures map to
//!    [`WizardError::SdkCapture`] with the vendor message classified onto
//!    the closed failure set.

use std::sync::Arc;

use kycflow_capture::{
    CaptureSdk, DocumentCaptureOptions, FaceCaptureOptions, SdkProvider, SessionOptions,
};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::WizardConfig;
use crate::error::{CaptureFailureKind, WizardError};
use crate::surface::{
    relocate_when_ready, CaptureSurface, DialogMarkers, RelocationOutcome,
    DOCUMENT_DIALOG_MARKERS, FACE_DIALOG_MARKERS,
};
use crate::types::{CapturedArtifact, StepKind};

struct ActiveSession {
    sdk: Arc<dyn CaptureSdk>,
    cancel: watch::Sender<bool>,
    relocation: JoinHandle<RelocationOutcome>,
}

/// Adapter owning the single live vendor-SDK session.
pub struct SdkSessionAdapter {
    provider: Arc<dyn SdkProvider>,
    surface: Arc<dyn CaptureSurface>,
    config: WizardConfig,
    active: Mutex<Option<ActiveSession>>,
}

impl SdkSessionAdapter {
    /// Create an adapter over the given vendor provider and host surface.
    pub fn new(
        provider: Arc<dyn SdkProvider>,
        surface: Arc<dyn CaptureSurface>,
        config: &WizardConfig,
    ) -> Self {
        Self {
            provider,
            surface,
            config: config.clone(),
            active: Mutex::new(None),
        }
    }

    /// The fixed option table for a capture kind.
    ///
    /// These are static per-kind tables; only the anti-spoof level and the
    /// timeouts come from configuration.
    pub fn options_for(&self, kind: StepKind) -> SessionOptions {
        match kind {
            StepKind::DocumentFront | StepKind::DocumentBack => {
                SessionOptions::Document(DocumentCaptureOptions {
                    exit_timeout: self.config.document_capture_timeout,
                    ..DocumentCaptureOptions::default()
                })
            },
            StepKind::Biometric => SessionOptions::Face(FaceCaptureOptions {
                anti_spoof_threshold: self.config.face_security_level.anti_spoof_threshold(),
                capture_timeout: self.config.face_capture_timeout,
                ..FaceCaptureOptions::default()
            }),
        }
    }

    fn markers_for(kind: StepKind) -> DialogMarkers {
        match kind {
            StepKind::Biometric => FACE_DIALOG_MARKERS,
            StepKind::DocumentFront | StepKind::DocumentBack => DOCUMENT_DIALOG_MARKERS,
        }
    }

    /// Run one capture session for the given step kind.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn start_capture(&self, kind: StepKind) -> Result<CapturedArtifact, WizardError> {
        // A fresh session always tears down the previous one first.
        self.abort().await;

        let options = self.options_for(kind);
        let sdk: Arc<dyn CaptureSdk> =
            Arc::from(self.provider.create(&options).map_err(|e| WizardError::SdkInit {
                message: e.vendor_message().to_string(),
            })?);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let relocation = tokio::spawn(relocate_when_ready(
            Arc::clone(&self.surface),
            Self::markers_for(kind),
            self.config.surface_poll_interval,
            self.config.surface_poll_budget,
            cancel_rx,
        ));

        {
            let mut active = self.active.lock().await;
            *active = Some(ActiveSession {
                sdk: Arc::clone(&sdk),
                cancel: cancel_tx,
                relocation,
            });
        }

        info!("initializing vendor SDK");
        if let Err(e) = sdk.initialize().await {
            self.abort().await;
            return Err(WizardError::SdkInit {
                message: e.vendor_message().to_string(),
            });
        }

        let budget = match kind {
            StepKind::Biometric => self.config.face_capture_timeout,
            StepKind::DocumentFront | StepKind::DocumentBack => {
                self.config.document_capture_timeout
            },
        };

        info!(budget = ?budget, "capturing");
        match tokio::time::timeout(budget, sdk.capture()).await {
            Ok(Ok(image)) => {
                info!(bytes = image.len(), "capture complete");
                Ok(CapturedArtifact::new(kind, image))
            },
            Ok(Err(e)) => {
                let message = e.vendor_message().to_string();
                self.abort().await;
                Err(WizardError::SdkCapture {
                    kind: CaptureFailureKind::classify(&message),
                    message,
                })
            },
            Err(_elapsed) => {
                self.abort().await;
                Err(WizardError::SdkCapture {
                    kind: CaptureFailureKind::Timeout,
                    message: format!("capture did not complete within {budget:?}"),
                })
            },
        }
    }

    /// Tear down the active session, if any.
    ///
    /// Idempotent. The relocation poll is stopped before this returns, and
    /// vendor abort failures are logged and swallowed: an abort failure must
    /// never block starting a fresh session.
    pub async fn abort(&self) {
        let active = self.active.lock().await.take();
        let Some(active) = active else { return };

        let _ = active.cancel.send(true);
        if let Err(e) = active.sdk.abort().await {
            warn!(error = %e, "vendor SDK abort failed (ignored)");
        }
        match active.relocation.await {
            Ok(outcome) => debug!(outcome = ?outcome, "relocation poll stopped"),
            Err(e) => warn!(error = %e, "relocation poll task failed"),
        }
    }

    /// Whether a vendor session handle is currently live.
    pub async fn has_active_session(&self) -> bool {
        self.active.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kycflow_capture::{ScriptedCapture, ScriptedProvider};

    use super::*;
    use crate::surface::NullSurface;

    fn make_adapter(provider: Arc<ScriptedProvider>) -> SdkSessionAdapter {
        let config = WizardConfig {
            surface_poll_budget: Duration::from_millis(500),
            ..WizardConfig::default()
        };
        SdkSessionAdapter::new(provider, Arc::new(NullSurface), &config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_produces_artifact_and_keeps_handle() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![ScriptedCapture::Image(
            vec![1, 2, 3],
        )]));
        let adapter = make_adapter(Arc::clone(&provider));

        let artifact = adapter.start_capture(StepKind::DocumentFront).await.unwrap();
        assert_eq!(artifact.image, vec![1, 2, 3]);
        assert_eq!(artifact.step_kind, StepKind::DocumentFront);
        assert!(adapter.has_active_session().await);

        adapter.abort().await;
        assert!(!adapter.has_active_session().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_aborts_prior_first() {
        let provider = Arc::new(ScriptedProvider::new());
        let adapter = make_adapter(Arc::clone(&provider));

        adapter.start_capture(StepKind::DocumentFront).await.unwrap();
        adapter.start_capture(StepKind::DocumentBack).await.unwrap();

        let events = provider.events();
        let abort_first = events.iter().position(|e| e == "abort#0").unwrap();
        let init_second = events.iter().position(|e| e == "init#1").unwrap();
        assert!(abort_first < init_second, "events: {events:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_timeout_maps_to_timeout_kind() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![ScriptedCapture::Hang]));
        let adapter = make_adapter(provider);

        let err = adapter.start_capture(StepKind::Biometric).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::SdkCapture {
                kind: CaptureFailureKind::Timeout,
                ..
            }
        ));
        // The failed session does not leak a handle.
        assert!(!adapter.has_active_session().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_failure_classified() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![
            ScriptedCapture::FailCapture {
                message: "FEEDBACK_CAMERA_ACQUIRING_FAILED".to_string(),
            },
        ]));
        let adapter = make_adapter(provider);

        let err = adapter.start_capture(StepKind::Biometric).await.unwrap_err();
        assert!(matches!(
            err,
            WizardError::SdkCapture {
                kind: CaptureFailureKind::CameraAcquisition,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_init_failure_maps_to_sdk_init() {
        let provider = Arc::new(ScriptedProvider::with_script(vec![
            ScriptedCapture::FailInit {
                message: "license rejected".to_string(),
            },
        ]));
        let adapter = make_adapter(provider);

        let err = adapter.start_capture(StepKind::DocumentFront).await.unwrap_err();
        match err {
            WizardError::SdkInit { message } => assert_eq!(message, "license rejected"),
            other => panic!("expected SdkInit, got {other:?}"),
        }
        assert!(!adapter.has_active_session().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_is_idempotent() {
        let provider = Arc::new(ScriptedProvider::new());
        let adapter = make_adapter(provider);

        // Safe with no active session.
        adapter.abort().await;
        adapter.start_capture(StepKind::DocumentFront).await.unwrap();
        adapter.abort().await;
        adapter.abort().await;
        assert!(!adapter.has_active_session().await);
    }

    #[test]
    fn test_option_tables_per_kind() {
        let provider = Arc::new(ScriptedProvider::new());
        let adapter = SdkSessionAdapter::new(
            provider,
            Arc::new(NullSurface),
            &WizardConfig::default(),
        );

        match adapter.options_for(StepKind::DocumentBack) {
            SessionOptions::Document(opts) => {
                assert_eq!(opts.exit_timeout, Duration::from_secs(45));
                assert!(!opts.allow_close);
            },
            SessionOptions::Face(_) => panic!("expected document options"),
        }
        match adapter.options_for(StepKind::Biometric) {
            SessionOptions::Face(opts) => {
                assert_eq!(opts.capture_timeout, Duration::from_secs(50));
                assert!(opts.icao_checks);
            },
            SessionOptions::Document(_) => panic!("expected face options"),
        }
    }
}
