//! Per-kind capture session options.
//!
//! These are static configuration tables, not runtime-computed values: each
//! capture kind (document side, biometric) has a fixed option set that the
//! adapter hands to the provider when a session starts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Which document face(s) a capture session should detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMode {
    /// Front of the card.
    Front,
    /// Back of the card.
    Back,
}

/// Output artifact format requested from the SDK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputTemplate {
    /// JPEG-encoded image.
    Jpeg,
    /// PNG-encoded image.
    Png,
}

/// Document template the OCR SDK should match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentProfile {
    /// National identity card.
    NationalIdCard,
    /// Passport data page.
    Passport,
}

/// Anti-spoof sensitivity for biometric capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntiSpoofThreshold {
    /// Lowest rejection rate.
    Low,
    /// Balanced.
    Medium,
    /// Strictest liveness requirement.
    High,
}

/// Options for a document (OCR) capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCaptureOptions {
    /// Document face(s) to detect.
    pub detection_modes: Vec<DetectionMode>,
    /// Document template.
    pub profile: DocumentProfile,
    /// Requested output formats.
    pub required_templates: Vec<OutputTemplate>,
    /// Reject captures that look like A4 reproductions.
    pub a4_integrity_check: bool,
    /// Require a readable barcode.
    pub barcode_check: bool,
    /// Allow the user to dismiss the capture dialog.
    pub allow_close: bool,
    /// Use the device flash.
    pub use_flash: bool,
    /// Show the card silhouette guide overlay.
    pub show_silhouette: bool,
    /// Show the capture training screens.
    pub show_training: bool,
    /// Wall-clock budget before the SDK gives up on its own.
    pub exit_timeout: Duration,
    /// UI locale tag.
    pub locale: String,
}

impl Default for DocumentCaptureOptions {
    fn default() -> Self {
        Self {
            detection_modes: vec![DetectionMode::Front, DetectionMode::Back],
            profile: DocumentProfile::NationalIdCard,
            required_templates: vec![OutputTemplate::Jpeg],
            a4_integrity_check: true,
            barcode_check: false,
            allow_close: false,
            use_flash: false,
            show_silhouette: true,
            show_training: false,
            exit_timeout: Duration::from_secs(45),
            locale: "es".to_string(),
        }
    }
}

/// Options for a biometric (face) capture session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceCaptureOptions {
    /// Allow the user to pick a camera device.
    pub allow_camera_select: bool,
    /// Allow the user to dismiss the capture dialog.
    pub allow_close: bool,
    /// Enable the open/closed eyes detector.
    pub eyes_status_detector: bool,
    /// Run ICAO compliance checks on the capture.
    pub icao_checks: bool,
    /// Remove the background from the output image.
    pub background_removal: bool,
    /// Enable anti-spoof (liveness) analysis.
    pub anti_spoof: bool,
    /// Anti-spoof sensitivity.
    pub anti_spoof_threshold: AntiSpoofThreshold,
    /// Assisted capture mode (an operator frames the subject).
    pub assisted: bool,
    /// Skip the browser/device support probe.
    pub skip_support_check: bool,
    /// Requested output formats.
    pub required_templates: Vec<OutputTemplate>,
    /// Wall-clock budget before the SDK gives up on its own.
    pub capture_timeout: Duration,
    /// UI locale tag.
    pub locale: String,
}

impl Default for FaceCaptureOptions {
    fn default() -> Self {
        Self {
            allow_camera_select: false,
            allow_close: true,
            eyes_status_detector: true,
            icao_checks: true,
            background_removal: true,
            anti_spoof: true,
            anti_spoof_threshold: AntiSpoofThreshold::Low,
            assisted: false,
            skip_support_check: true,
            required_templates: vec![OutputTemplate::Jpeg],
            capture_timeout: Duration::from_secs(50),
            locale: "es".to_string(),
        }
    }
}

/// Options for one capture session, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionOptions {
    /// Document (OCR) capture.
    Document(DocumentCaptureOptions),
    /// Biometric (face) capture.
    Face(FaceCaptureOptions),
}

impl SessionOptions {
    /// Short label for logging.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Document(_) => "document",
            Self::Face(_) => "face",
        }
    }

    /// The SDK-side wall-clock budget for this session.
    pub fn sdk_timeout(&self) -> Duration {
        match self {
            Self::Document(opts) => opts.exit_timeout,
            Self::Face(opts) => opts.capture_timeout,
        }
    }
}
