//! Capture-result validation.
//!
//! Evaluates the backend's quality and ICAO metrics against fixed rule
//! tables, then delegates the final decision to the remote face-match call.
//!
//! ## Rules
//!
//! - Quality rules compare by exact value; a missing field counts as a
//!   mismatch. First mismatch short-circuits with `FEEDBACK_RETRY_QUALITY`.
//! - Boolean ICAO rules compare by exact value (missing counts as a
//!   mismatch); numeric ICAO rules are visibility thresholds violated only
//!   when the field is present as a number below the expected minimum.
//!   First violation short-circuits with `FEEDBACK_RETRY_ICAO`.
//! - Matching requires a reference document image; without one the verdict
//!   is `FEEDBACK_MATCHING_ERROR`.
//! - The remote match boolean is authoritative; its accompanying message
//!   passes through as the reason code on failure.
//!
//! Rule evaluation is pure and deterministic; only the final match call
//! touches the network.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::WizardError;
use crate::gateway::Backend;
use crate::types::{CaptureResponse, ValidationVerdict, REASON_MATCHING_ERROR};

/// Expected value of a quality metric.
#[derive(Debug, Clone, Copy)]
pub enum QualityExpectation {
    /// Exact string match.
    Text(&'static str),
    /// Exact boolean match.
    Flag(bool),
}

/// One entry of the quality rule table.
#[derive(Debug, Clone, Copy)]
pub struct QualityRule {
    /// Metric key in the quality sub-record.
    pub key: &'static str,
    /// Expected value.
    pub expected: QualityExpectation,
}

/// Expected value of an ICAO compliance metric.
#[derive(Debug, Clone, Copy)]
pub enum IcaoExpectation {
    /// Exact boolean match.
    Flag(bool),
    /// Minimum visibility/coverage threshold (actual ≥ expected passes).
    Min(f64),
}

/// One entry of the ICAO rule table.
#[derive(Debug, Clone, Copy)]
pub struct IcaoRule {
    /// Metric key in the ICAO sub-record.
    pub key: &'static str,
    /// Expected value.
    pub expected: IcaoExpectation,
}

/// Fixed quality rule table for biometric captures.
pub const QUALITY_RULES: &[QualityRule] = &[
    QualityRule {
        key: "eyes_status",
        expected: QualityExpectation::Text("OPEN"),
    },
    QualityRule {
        key: "qc_passed",
        expected: QualityExpectation::Flag(true),
    },
];

/// Fixed ICAO compliance rule table for biometric captures.
pub const ICAO_RULES: &[IcaoRule] = &[
    IcaoRule {
        key: "eyes_full_visibility",
        expected: IcaoExpectation::Flag(true),
    },
    IcaoRule {
        key: "nose_visibility",
        expected: IcaoExpectation::Min(45.0),
    },
    IcaoRule {
        key: "mouth_visibility",
        expected: IcaoExpectation::Min(45.0),
    },
    IcaoRule {
        key: "sideL_visibility",
        expected: IcaoExpectation::Min(20.0),
    },
    IcaoRule {
        key: "sideR_visibility",
        expected: IcaoExpectation::Min(20.0),
    },
    IcaoRule {
        key: "top_visibility",
        expected: IcaoExpectation::Min(20.0),
    },
    IcaoRule {
        key: "bottom_visibility",
        expected: IcaoExpectation::Min(20.0),
    },
    IcaoRule {
        key: "multiple_faces",
        expected: IcaoExpectation::Flag(false),
    },
];

fn quality_rule_holds(actual: Option<&Value>, expected: QualityExpectation) -> bool {
    match expected {
        QualityExpectation::Text(text) => actual.and_then(Value::as_str) == Some(text),
        QualityExpectation::Flag(flag) => actual.and_then(Value::as_bool) == Some(flag),
    }
}

fn icao_rule_holds(actual: Option<&Value>, expected: IcaoExpectation) -> bool {
    match expected {
        IcaoExpectation::Flag(flag) => actual.and_then(Value::as_bool) == Some(flag),
        // Violated only when present as a number below the threshold.
        IcaoExpectation::Min(min) => match actual.and_then(Value::as_f64) {
            Some(value) => value >= min,
            None => true,
        },
    }
}

/// Evaluate the fixed quality and ICAO rule tables against a capture
/// response.
///
/// Pure: same input, same output, independent of call count. Returns the
/// failure verdict on the first violated rule, `None` when every rule holds.
pub fn evaluate_rules(response: &CaptureResponse) -> Option<ValidationVerdict> {
    let quality = response.data.as_ref().map(|d| &d.quality);

    for rule in QUALITY_RULES {
        let actual = quality.and_then(|q| q.get(rule.key));
        if !quality_rule_holds(actual, rule.expected) {
            debug!(key = rule.key, "quality rule violated");
            return Some(ValidationVerdict::retry_quality());
        }
    }

    for rule in ICAO_RULES {
        if !icao_rule_holds(response.icao_data.get(rule.key), rule.expected) {
            debug!(key = rule.key, "ICAO rule violated");
            return Some(ValidationVerdict::retry_icao());
        }
    }

    None
}

/// Validate a biometric capture end to end.
///
/// Runs the pure rule evaluation, then — with a reference document image
/// present — asks the backend to match the capture against it. The remote
/// boolean decides the verdict.
#[instrument(skip_all, fields(has_reference = reference_b64.is_some()))]
pub async fn validate(
    response: &CaptureResponse,
    image: &[u8],
    reference_b64: Option<&str>,
    backend: &dyn Backend,
) -> Result<ValidationVerdict, WizardError> {
    if let Some(failure) = evaluate_rules(response) {
        return Ok(failure);
    }

    let Some(reference) = reference_b64 else {
        // Matching cannot proceed without the stored front-side document.
        return Ok(ValidationVerdict::matching_error());
    };

    let outcome = backend.match_against_reference(image, reference).await?;
    if outcome.is_match {
        Ok(ValidationVerdict::ok())
    } else {
        Ok(ValidationVerdict::rejected(
            outcome
                .message_validator
                .unwrap_or_else(|| REASON_MATCHING_ERROR.to_string()),
        ))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::{REASON_RETRY_ICAO, REASON_RETRY_QUALITY};

    fn passing_response() -> CaptureResponse {
        serde_json::from_value(json!({
            "data": { "quality": { "eyes_status": "OPEN", "qc_passed": true } },
            "icao_data": {
                "eyes_full_visibility": true,
                "nose_visibility": 60,
                "mouth_visibility": 55,
                "sideL_visibility": 30,
                "sideR_visibility": 30,
                "top_visibility": 25,
                "bottom_visibility": 25,
                "multiple_faces": false
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_passing_response_has_no_violation() {
        assert!(evaluate_rules(&passing_response()).is_none());
    }

    #[test]
    fn test_closed_eyes_fails_quality() {
        let mut response = passing_response();
        response
            .data
            .as_mut()
            .unwrap()
            .quality
            .insert("eyes_status".to_string(), json!("CLOSED"));

        let verdict = evaluate_rules(&response).unwrap();
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reason_code, REASON_RETRY_QUALITY);
    }

    #[test]
    fn test_missing_quality_section_fails_quality() {
        let response: CaptureResponse = serde_json::from_value(json!({
            "icao_data": { "eyes_full_visibility": true }
        }))
        .unwrap();

        let verdict = evaluate_rules(&response).unwrap();
        assert_eq!(verdict.reason_code, REASON_RETRY_QUALITY);
    }

    #[test]
    fn test_icao_threshold_boundary() {
        let mut response = passing_response();
        response
            .icao_data
            .insert("nose_visibility".to_string(), json!(45));
        assert!(evaluate_rules(&response).is_none());

        response
            .icao_data
            .insert("nose_visibility".to_string(), json!(44));
        let verdict = evaluate_rules(&response).unwrap();
        assert_eq!(verdict.reason_code, REASON_RETRY_ICAO);
    }

    #[test]
    fn test_missing_numeric_icao_field_passes() {
        let mut response = passing_response();
        response.icao_data.remove("nose_visibility");
        assert!(evaluate_rules(&response).is_none());
    }

    #[test]
    fn test_missing_boolean_icao_field_fails() {
        let mut response = passing_response();
        response.icao_data.remove("eyes_full_visibility");
        let verdict = evaluate_rules(&response).unwrap();
        assert_eq!(verdict.reason_code, REASON_RETRY_ICAO);
    }

    #[test]
    fn test_multiple_faces_fails_icao() {
        let mut response = passing_response();
        response
            .icao_data
            .insert("multiple_faces".to_string(), json!(true));
        let verdict = evaluate_rules(&response).unwrap();
        assert_eq!(verdict.reason_code, REASON_RETRY_ICAO);
    }

    #[test]
    fn test_quality_checked_before_icao() {
        // Both sections violated: quality short-circuits first.
        let response: CaptureResponse = serde_json::from_value(json!({
            "data": { "quality": { "eyes_status": "CLOSED", "qc_passed": true } },
            "icao_data": { "multiple_faces": true }
        }))
        .unwrap();

        let verdict = evaluate_rules(&response).unwrap();
        assert_eq!(verdict.reason_code, REASON_RETRY_QUALITY);
    }
}
