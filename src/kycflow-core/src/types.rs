//! Core domain and wire types for the wizard.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Verdict reason: all checks passed.
pub const REASON_OK: &str = "OK";
/// Verdict reason: a quality rule was violated.
pub const REASON_RETRY_QUALITY: &str = "FEEDBACK_RETRY_QUALITY";
/// Verdict reason: an ICAO compliance rule was violated.
pub const REASON_RETRY_ICAO: &str = "FEEDBACK_RETRY_ICAO";
/// Verdict reason: no reference document image is available for matching.
pub const REASON_MATCHING_ERROR: &str = "FEEDBACK_MATCHING_ERROR";

/// The wizard step currently presented to the user.
///
/// Exactly one step is active at a time, and transitions happen only through
/// the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WizardStep {
    /// Initial explainer; no capture UI mounted.
    Onboarding,
    /// Front side of the identity document.
    DocumentFront,
    /// Back side of the identity document.
    DocumentBack,
    /// Selfie capture and validation.
    Biometric,
    /// Terminal: the full flow completed with a valid match.
    Success,
    /// Terminal: retries exhausted; recoverable only via explicit restart.
    Error,
}

impl WizardStep {
    /// The capture kind driven on this step, if it is a capture step.
    pub fn capture_kind(self) -> Option<StepKind> {
        match self {
            Self::DocumentFront => Some(StepKind::DocumentFront),
            Self::DocumentBack => Some(StepKind::DocumentBack),
            Self::Biometric => Some(StepKind::Biometric),
            Self::Onboarding | Self::Success | Self::Error => None,
        }
    }

    /// Whether the wizard can make no further progress from this step.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Onboarding => "onboarding",
            Self::DocumentFront => "document-front",
            Self::DocumentBack => "document-back",
            Self::Biometric => "biometric",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Which side of the identity document a capture targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentSide {
    /// Photo side.
    Front,
    /// MRZ/barcode side.
    Back,
}

/// The capture-capable subset of wizard steps.
///
/// Keys the session's artifact map, retry counters, and mounted flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepKind {
    /// Front side of the identity document.
    DocumentFront,
    /// Back side of the identity document.
    DocumentBack,
    /// Selfie.
    Biometric,
}

impl StepKind {
    /// The wizard step this kind belongs to.
    pub fn step(self) -> WizardStep {
        match self {
            Self::DocumentFront => WizardStep::DocumentFront,
            Self::DocumentBack => WizardStep::DocumentBack,
            Self::Biometric => WizardStep::Biometric,
        }
    }

    /// The document side, for document kinds.
    pub fn document_side(self) -> Option<DocumentSide> {
        match self {
            Self::DocumentFront => Some(DocumentSide::Front),
            Self::DocumentBack => Some(DocumentSide::Back),
            Self::Biometric => None,
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.step().fmt(f)
    }
}

/// One captured image and its metadata.
///
/// Immutable once created; a retry supersedes the previous artifact for the
/// same step rather than mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedArtifact {
    /// Which capture produced this artifact.
    pub step_kind: StepKind,
    /// Encoded image bytes as returned by the SDK.
    pub image: Vec<u8>,
    /// Capture timestamp, milliseconds since the Unix epoch.
    pub captured_at_ms: u64,
}

impl CapturedArtifact {
    /// Create an artifact stamped with the current time.
    pub fn new(step_kind: StepKind, image: Vec<u8>) -> Self {
        Self {
            step_kind,
            image,
            captured_at_ms: now_millis(),
        }
    }
}

/// The validator's pass/fail decision with a symbolic reason code.
///
/// Produced fresh per validation attempt; never persisted beyond the current
/// step's decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationVerdict {
    /// Whether the capture passed all checks.
    pub is_valid: bool,
    /// [`REASON_OK`] on success, else a symbolic failure code.
    pub reason_code: String,
}

impl ValidationVerdict {
    /// All checks passed.
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            reason_code: REASON_OK.to_string(),
        }
    }

    /// A quality rule was violated.
    pub fn retry_quality() -> Self {
        Self::rejected(REASON_RETRY_QUALITY)
    }

    /// An ICAO rule was violated.
    pub fn retry_icao() -> Self {
        Self::rejected(REASON_RETRY_ICAO)
    }

    /// Matching cannot proceed without a reference image.
    pub fn matching_error() -> Self {
        Self::rejected(REASON_MATCHING_ERROR)
    }

    /// Failed with the given reason code.
    pub fn rejected(reason_code: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            reason_code: reason_code.into(),
        }
    }
}

/// Metadata attached to a capture submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureMetadata {
    /// Caller-assigned user key.
    pub metadata_by_user_key: String,
    /// Caller-assigned device key.
    pub metadata_by_mobile_device_key: String,
    /// Capture timestamp, milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// The quality/template payload of a capture response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureData {
    /// Quality metrics; opaque vendor fields compared against the rule
    /// tables by exact value.
    #[serde(default)]
    pub quality: Map<String, Value>,
    /// Everything else (templates and other vendor fields), passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backend response to a capture submission (`/v1/process`).
///
/// The shape is vendor-defined and treated as opaque except for the two
/// sub-records the validator reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureResponse {
    /// Quality sub-record.
    #[serde(default)]
    pub data: Option<CaptureData>,
    /// ICAO compliance sub-record.
    #[serde(default)]
    pub icao_data: Map<String, Value>,
    /// Unmodeled fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Backend response to a face-vs-document match request
/// (`/v1/verifyWithPicID`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Whether the captured face matches the reference document photo.
    #[serde(rename = "match")]
    pub is_match: bool,
    /// Backend explanation accompanying a negative result.
    #[serde(rename = "messageValidator", default)]
    pub message_validator: Option<String>,
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Encode image bytes as plain (unwrapped) base64.
pub fn encode_image_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64 image, tolerating a `data:image/...;base64,` prefix.
pub fn decode_image_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match input.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => input,
    };
    base64::engine::general_purpose::STANDARD.decode(payload.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_capture_kinds() {
        assert_eq!(
            WizardStep::DocumentFront.capture_kind(),
            Some(StepKind::DocumentFront)
        );
        assert_eq!(WizardStep::Onboarding.capture_kind(), None);
        assert!(WizardStep::Success.is_terminal());
        assert!(!WizardStep::Biometric.is_terminal());
    }

    #[test]
    fn test_capture_response_tolerates_missing_sections() {
        let response: CaptureResponse = serde_json::from_str("{}").unwrap();
        assert!(response.data.is_none());
        assert!(response.icao_data.is_empty());

        let response: CaptureResponse = serde_json::from_str(
            r#"{"data":{"quality":{"eyes_status":"OPEN"},"templates":{"JPEG":"..."}},
                "icao_data":{"nose_visibility":50}}"#,
        )
        .unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.quality["eyes_status"], "OPEN");
        assert!(data.extra.contains_key("templates"));
        assert_eq!(response.icao_data["nose_visibility"], 50);
    }

    #[test]
    fn test_match_outcome_field_names() {
        let outcome: MatchOutcome =
            serde_json::from_str(r#"{"match":false,"messageValidator":"LOW_SIMILARITY"}"#).unwrap();
        assert!(!outcome.is_match);
        assert_eq!(outcome.message_validator.as_deref(), Some("LOW_SIMILARITY"));

        let outcome: MatchOutcome = serde_json::from_str(r#"{"match":true}"#).unwrap();
        assert!(outcome.is_match);
        assert!(outcome.message_validator.is_none());
    }

    #[test]
    fn test_base64_round_trip_with_data_url() {
        let bytes = vec![0xFF, 0xD8, 0x01, 0x02];
        let plain = encode_image_base64(&bytes);
        assert_eq!(decode_image_base64(&plain).unwrap(), bytes);

        let data_url = format!("data:image/jpeg;base64,{plain}");
        assert_eq!(decode_image_base64(&data_url).unwrap(), bytes);
    }
}
