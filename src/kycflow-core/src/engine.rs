//! The wizard engine.
//!
//! Composition root and async orchestrator: drives the SDK session adapter
//! for the current step, routes biometric captures through the backend and
//! the validator, and feeds the outcomes into the state machine.
//!
//! ## Failure policy
//!
//! SDK and backend failures are caught at this boundary and converted into
//! the step-local error banner with a retry affordance; they never crash the
//! wizard. Validation failures are ordinary verdicts routed through the
//! state machine. Only programming errors ([`WizardError::InvalidTransition`])
//! propagate to the caller.

use std::sync::Arc;

use kycflow_capture::{PreInitConfig, SdkProvider};
use tracing::{info, instrument, warn};

use crate::adapter::SdkSessionAdapter;
use crate::config::WizardConfig;
use crate::error::WizardError;
use crate::gateway::{Backend, BackendGateway};
use crate::machine::{StepOutcome, WizardStateMachine};
use crate::session::CaptureSession;
use crate::surface::CaptureSurface;
use crate::types::{encode_image_base64, CaptureMetadata, StepKind, WizardStep};
use crate::validator;

/// The wizard engine.
///
/// This is the primary entry point for driving a verification flow.
pub struct WizardEngine {
    config: WizardConfig,
    machine: WizardStateMachine,
    adapter: SdkSessionAdapter,
    backend: Arc<dyn Backend>,
    provider: Arc<dyn SdkProvider>,
}

impl WizardEngine {
    /// Create an engine with an HTTP gateway built from the configuration.
    pub fn new(
        config: WizardConfig,
        provider: Arc<dyn SdkProvider>,
        surface: Arc<dyn CaptureSurface>,
    ) -> Result<Self, WizardError> {
        let backend = Arc::new(BackendGateway::new(
            &config.api_base_url,
            config.request_timeout,
        )?);
        Ok(Self::with_backend(config, provider, surface, backend))
    }

    /// Create an engine with an injected backend.
    ///
    /// Useful for testing with in-memory doubles.
    pub fn with_backend(
        config: WizardConfig,
        provider: Arc<dyn SdkProvider>,
        surface: Arc<dyn CaptureSurface>,
        backend: Arc<dyn Backend>,
    ) -> Self {
        info!(
            api_base_url = %config.api_base_url,
            security_level = ?config.face_security_level,
            "wizard engine: initializing"
        );
        let adapter = SdkSessionAdapter::new(Arc::clone(&provider), surface, &config);
        let machine = WizardStateMachine::new(config.max_retries);
        Self {
            config,
            machine,
            adapter,
            backend,
            provider,
        }
    }

    /// The step currently presented.
    pub fn current_step(&self) -> WizardStep {
        self.machine.current_step()
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &CaptureSession {
        self.machine.session()
    }

    /// Whether a vendor session handle is currently live.
    pub async fn has_active_capture(&self) -> bool {
        self.adapter.has_active_session().await
    }

    /// One-time vendor SDK warm-up.
    ///
    /// Failures are logged and tolerated; the wizard can still run.
    pub async fn pre_initialize_sdks(&self) {
        let base = self.config.api_base_url.trim_end_matches('/');
        let pre_init = PreInitConfig {
            license_key: self.config.ocr_license_key.clone(),
            models_url: format!("{base}/v1/models"),
            pub_key_url: format!("{base}/v1/pub_key"),
            headers: vec![("LogAPITrigger".to_string(), "true".to_string())],
        };
        if let Err(e) = self.provider.pre_initialize(&pre_init).await {
            warn!(error = %e, "SDK pre-initialization failed (continuing)");
        }
    }

    /// Explicit user start action: `onboarding → document-front`.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> Result<WizardStep, WizardError> {
        self.machine.advance(StepOutcome::Started)
    }

    /// Run the capture flow for the step currently presented.
    ///
    /// Retryable failures become the step-local banner and leave the step
    /// unchanged; the returned step is whatever is presented afterwards.
    ///
    /// # Errors
    ///
    /// [`WizardError::InvalidTransition`] when the current step has no
    /// capture to run.
    #[instrument(skip(self), fields(step = %self.current_step()))]
    pub async fn run_current_step(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.current_step();
        let Some(kind) = step.capture_kind() else {
            return Err(WizardError::InvalidTransition {
                step,
                outcome: "run-capture",
            });
        };

        match self.capture_and_advance(kind).await {
            Ok(next) => Ok(next),
            Err(e) if e.is_retryable() => {
                self.machine.report_failure(&e);
                Ok(self.current_step())
            },
            Err(e) => Err(e),
        }
    }

    async fn capture_and_advance(&mut self, kind: StepKind) -> Result<WizardStep, WizardError> {
        let artifact = self.adapter.start_capture(kind).await?;
        // Brief hold so the capture-success state is visible before moving on.
        tokio::time::sleep(self.config.success_hold).await;

        match kind.document_side() {
            Some(side) => self.machine.advance(StepOutcome::DocumentCaptured { side, artifact }),
            None => {
                let meta = CaptureMetadata {
                    metadata_by_user_key: self.config.user_key.clone(),
                    metadata_by_mobile_device_key: self.config.device_key.clone(),
                    timestamp: artifact.captured_at_ms,
                };
                let response = self.backend.submit_capture(&artifact.image, &meta).await?;

                let reference = self
                    .machine
                    .session()
                    .artifact(StepKind::DocumentFront)
                    .map(|a| encode_image_base64(&a.image));
                let verdict = validator::validate(
                    &response,
                    &artifact.image,
                    reference.as_deref(),
                    self.backend.as_ref(),
                )
                .await?;

                if verdict.is_valid {
                    tokio::time::sleep(self.config.complete_hold).await;
                }
                let next = self
                    .machine
                    .advance(StepOutcome::BiometricValidated { artifact, verdict })?;
                if next == WizardStep::Success {
                    // No capture UI on the success step; release the handle.
                    self.adapter.abort().await;
                }
                Ok(next)
            },
        }
    }

    /// Retry the current capture step.
    ///
    /// Aborts the active handle, bumps the retry counter, waits the
    /// configured pacing delay, and re-invokes the capture. If the retry
    /// bound is exceeded the wizard lands on the terminal `error` step.
    #[instrument(skip(self))]
    pub async fn retry(&mut self) -> Result<WizardStep, WizardError> {
        self.adapter.abort().await;
        let step = self.machine.retry()?;
        if step == WizardStep::Error {
            return Ok(step);
        }
        tokio::time::sleep(self.config.retry_delay).await;
        self.run_current_step().await
    }

    /// Explicit back navigation.
    ///
    /// The active SDK handle is aborted before the step changes.
    #[instrument(skip(self))]
    pub async fn go_back(&mut self) -> Result<WizardStep, WizardError> {
        self.adapter.abort().await;
        self.machine.go_back()
    }

    /// Explicit user-triggered restart. Discards the whole session.
    #[instrument(skip(self))]
    pub async fn restart(&mut self) -> WizardStep {
        self.adapter.abort().await;
        self.machine.restart()
    }
}
