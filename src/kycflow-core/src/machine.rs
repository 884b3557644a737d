//! The wizard state machine.
//!
//! Pure, synchronous transition logic over the [`CaptureSession`] aggregate.
//! No I/O happens here: the engine performs captures and validation, then
//! feeds the outcomes in through [`WizardStateMachine::advance`].
//!
//! ## Transitions
//!
//! - `onboarding → document-front`: explicit start action.
//! - `document-front → document-back`, `document-back → biometric`: the
//!   side's capture yielded an artifact. Document sides carry no validation;
//!   the final face-match against the stored front artifact gates the flow.
//! - `biometric → success`: only on a valid verdict.
//! - invalid biometric verdict: stay on the step with the reason code as the
//!   step-local banner.
//! - `retry`: clears the banner, bumps the step's retry counter, discards
//!   the step's artifact. Exceeding a configured retry bound enters the
//!   terminal `error` step.
//! - `go-back`: `document-back → document-front`, `biometric →
//!   document-back`.
//!
//! Feeding an outcome that is not valid for the current step is a
//! programming error and fails loudly with
//! [`WizardError::InvalidTransition`].

use tracing::{info, warn};

use crate::error::WizardError;
use crate::session::CaptureSession;
use crate::types::{CapturedArtifact, DocumentSide, ValidationVerdict, WizardStep};

/// Outcome of running the current step, fed into the state machine.
#[derive(Debug)]
pub enum StepOutcome {
    /// The user started the wizard from onboarding.
    Started,
    /// A document side was captured.
    DocumentCaptured {
        /// Which side was captured.
        side: DocumentSide,
        /// The captured artifact.
        artifact: CapturedArtifact,
    },
    /// The biometric capture was submitted and validated.
    BiometricValidated {
        /// The captured artifact.
        artifact: CapturedArtifact,
        /// The validator's verdict.
        verdict: ValidationVerdict,
    },
}

impl StepOutcome {
    fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::DocumentCaptured {
                side: DocumentSide::Front,
                ..
            } => "document-front-captured",
            Self::DocumentCaptured {
                side: DocumentSide::Back,
                ..
            } => "document-back-captured",
            Self::BiometricValidated { .. } => "biometric-validated",
        }
    }
}

/// Holds the session and drives step transitions from capture/validation
/// outcomes.
#[derive(Debug)]
pub struct WizardStateMachine {
    session: CaptureSession,
    max_retries: Option<u32>,
}

impl WizardStateMachine {
    /// Create a machine on a fresh session.
    ///
    /// `max_retries` bounds per-step retries; `None` leaves them unbounded.
    pub fn new(max_retries: Option<u32>) -> Self {
        Self {
            session: CaptureSession::new(),
            max_retries,
        }
    }

    /// Read-only view of the session.
    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    /// The step currently presented.
    pub fn current_step(&self) -> WizardStep {
        self.session.current_step()
    }

    /// Apply a step outcome, returning the step now presented.
    ///
    /// # Errors
    ///
    /// [`WizardError::InvalidTransition`] when the outcome is not valid for
    /// the current step.
    pub fn advance(&mut self, outcome: StepOutcome) -> Result<WizardStep, WizardError> {
        let step = self.current_step();
        match (step, outcome) {
            (WizardStep::Onboarding, StepOutcome::Started) => Ok(self.enter(WizardStep::DocumentFront)),

            (
                WizardStep::DocumentFront,
                StepOutcome::DocumentCaptured {
                    side: DocumentSide::Front,
                    artifact,
                },
            ) => {
                self.session.store_artifact(artifact);
                Ok(self.enter(WizardStep::DocumentBack))
            },

            (
                WizardStep::DocumentBack,
                StepOutcome::DocumentCaptured {
                    side: DocumentSide::Back,
                    artifact,
                },
            ) => {
                self.session.store_artifact(artifact);
                Ok(self.enter(WizardStep::Biometric))
            },

            (WizardStep::Biometric, StepOutcome::BiometricValidated { artifact, verdict }) => {
                // The artifact is retained either way; a retry supersedes it.
                self.session.store_artifact(artifact);
                if verdict.is_valid {
                    Ok(self.enter(WizardStep::Success))
                } else {
                    warn!(
                        reason = %verdict.reason_code,
                        "biometric validation failed, staying on step"
                    );
                    self.session.set_banner(verdict.reason_code);
                    Ok(WizardStep::Biometric)
                }
            },

            (step, outcome) => Err(WizardError::InvalidTransition {
                step,
                outcome: outcome.name(),
            }),
        }
    }

    /// Record a retryable failure as the step-local banner.
    ///
    /// The step does not change; the user is offered a retry affordance.
    pub fn report_failure(&mut self, error: &WizardError) {
        warn!(step = %self.current_step(), error = %error, "step failed");
        self.session.set_banner(error.to_string());
    }

    /// Retry the current capture step.
    ///
    /// Clears the banner, increments the step's retry counter exactly once,
    /// and discards the step's previous artifact. If a retry bound is
    /// configured and now exceeded, enters the terminal `error` step.
    ///
    /// # Errors
    ///
    /// [`WizardError::InvalidTransition`] when the current step has no
    /// capture to retry.
    pub fn retry(&mut self) -> Result<WizardStep, WizardError> {
        let step = self.current_step();
        let kind = step
            .capture_kind()
            .ok_or(WizardError::InvalidTransition { step, outcome: "retry" })?;

        self.session.clear_banner();
        self.session.discard_artifact(kind);
        let count = self.session.bump_retry(kind);
        info!(step = %step, retry = count, "retrying capture step");

        if let Some(max) = self.max_retries {
            if count > max {
                warn!(step = %step, retries = count, max = max, "retry bound exceeded");
                return Ok(self.enter(WizardStep::Error));
            }
        }
        Ok(step)
    }

    /// Explicit back navigation.
    ///
    /// The caller must have aborted any active SDK session first.
    ///
    /// # Errors
    ///
    /// [`WizardError::InvalidTransition`] when the current step has no
    /// previous capture step.
    pub fn go_back(&mut self) -> Result<WizardStep, WizardError> {
        let target = match self.current_step() {
            WizardStep::DocumentBack => WizardStep::DocumentFront,
            WizardStep::Biometric => WizardStep::DocumentBack,
            step => {
                return Err(WizardError::InvalidTransition {
                    step,
                    outcome: "go-back",
                })
            },
        };
        Ok(self.enter(target))
    }

    /// Explicit user-triggered restart: the only transition out of the
    /// terminal steps. Discards the whole session.
    pub fn restart(&mut self) -> WizardStep {
        info!(from = %self.current_step(), "restarting wizard");
        self.session.reset();
        WizardStep::Onboarding
    }

    fn enter(&mut self, step: WizardStep) -> WizardStep {
        let from = self.current_step();
        self.session.clear_banner();
        self.session.set_current(step);

        match step.capture_kind() {
            Some(kind) => self.session.mark_mounted(kind),
            None => {
                // Onboarding, success, and error present no capture UI; any
                // previously mounted capture surfaces are released.
                self.session.clear_mounted();
            },
        }

        info!(from = %from, to = %step, "step transition");
        step
    }
}
