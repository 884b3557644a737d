//! Error types for wizard operations.

use thiserror::Error;

use crate::types::WizardStep;

/// Known capture failure categories.
///
/// Vendor failure messages are mapped onto this closed set; anything
/// unrecognized lands in [`CaptureFailureKind::Unknown`] with the message
/// preserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFailureKind {
    /// The camera could not be acquired (permissions, device in use).
    CameraAcquisition,
    /// The capture did not complete within its wall-clock budget.
    Timeout,
    /// Any other vendor-side failure.
    Unknown,
}

impl CaptureFailureKind {
    /// Classify a vendor failure message.
    pub fn classify(message: &str) -> Self {
        if message == "FEEDBACK_CAMERA_ACQUIRING_FAILED" {
            Self::CameraAcquisition
        } else {
            Self::Unknown
        }
    }
}

impl std::fmt::Display for CaptureFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CameraAcquisition => "camera-acquisition",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while driving the wizard.
///
/// Validation failures are NOT errors; they travel as
/// [`crate::types::ValidationVerdict`] values through the state machine.
#[derive(Debug, Error)]
pub enum WizardError {
    /// Vendor SDK could not be constructed or initialized.
    #[error("SDK initialization failed: {message}")]
    SdkInit {
        /// Underlying vendor message.
        message: String,
    },

    /// Vendor SDK capture failed.
    #[error("SDK capture failed ({kind}): {message}")]
    SdkCapture {
        /// Failure category.
        kind: CaptureFailureKind,
        /// Underlying vendor message.
        message: String,
    },

    /// Backend request failed (transport error or non-2xx).
    #[error("backend error: {message}")]
    Backend {
        /// User-displayable message extracted from the response if present,
        /// else the transport error text.
        message: String,
    },

    /// An outcome was applied to a step it is not valid for.
    ///
    /// This is a programming error in the caller, not a runtime condition;
    /// it is never converted into a step banner.
    #[error("outcome '{outcome}' is not valid for step '{step}'")]
    InvalidTransition {
        /// Step the wizard was on.
        step: WizardStep,
        /// Name of the rejected outcome.
        outcome: &'static str,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl WizardError {
    /// Whether this failure should become a step-local banner with a retry
    /// affordance (true) or propagate to the caller (false).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::SdkInit { .. } | Self::SdkCapture { .. } | Self::Backend { .. }
        )
    }
}
