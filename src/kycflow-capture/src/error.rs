//! Error types for vendor SDK operations.

use thiserror::Error;

/// Errors surfaced by a vendor capture SDK.
///
/// The message strings come from the vendor and are preserved verbatim; the
/// consuming crate maps well-known messages (e.g. camera acquisition
/// failures) onto its own closed error set.
#[derive(Debug, Error)]
pub enum SdkError {
    /// The SDK instance could not be constructed or initialized.
    #[error("SDK initialization failed: {message}")]
    InitFailed {
        /// Underlying vendor message.
        message: String,
    },

    /// The capture call failed.
    #[error("capture failed: {message}")]
    CaptureFailed {
        /// Underlying vendor message (often a symbolic code such as
        /// `FEEDBACK_CAMERA_ACQUIRING_FAILED`).
        message: String,
    },

    /// Tearing down an active session failed.
    ///
    /// Callers are expected to log and swallow this; an abort failure must
    /// never block starting a fresh session.
    #[error("abort failed: {message}")]
    AbortFailed {
        /// Underlying vendor message.
        message: String,
    },

    /// Vendor warm-up (license / model preloading) failed.
    #[error("pre-initialization failed: {message}")]
    PreInitFailed {
        /// Underlying vendor message.
        message: String,
    },
}

impl SdkError {
    /// The vendor-provided message, without the error-kind prefix.
    pub fn vendor_message(&self) -> &str {
        match self {
            Self::InitFailed { message }
            | Self::CaptureFailed { message }
            | Self::AbortFailed { message }
            | Self::PreInitFailed { message } => message,
        }
    }
}
