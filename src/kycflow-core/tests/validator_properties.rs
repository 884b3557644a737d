//! Property-based tests for capture-result validation.
//!
//! These verify that rule evaluation is a pure function of its input and
//! that the threshold semantics hold across the input space.

use proptest::prelude::*;
use serde_json::{json, Map, Value};

use kycflow_core::types::{CaptureResponse, REASON_RETRY_ICAO, REASON_RETRY_QUALITY};
use kycflow_core::validator::evaluate_rules;

/// Strategy for opaque metric values of the kinds the backend emits.
fn metric_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::from),
        (0i64..=100).prop_map(Value::from),
        "[A-Z_]{1,12}".prop_map(Value::from),
    ]
}

/// Strategy for an arbitrary metric map.
fn metric_map() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z_]{1,16}", metric_value(), 0..8)
        .prop_map(|m| m.into_iter().collect())
}

/// A response that passes every fixed rule.
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

fn response_from(quality: Map<String, Value>, icao: Map<String, Value>) -> CaptureResponse {
    serde_json::from_value(json!({
        "data": { "quality": quality },
        "icao_data": icao
    }))
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 1000,
        ..ProptestConfig::default()
    })]

    /// Same input, same verdict, independent of call count.
    #[test]
    fn rule_evaluation_is_deterministic(
        quality in metric_map(),
        icao in metric_map()
    ) {
        let response = response_from(quality, icao);
        let first = evaluate_rules(&response);
        let second = evaluate_rules(&response);
        prop_assert_eq!(first, second);
    }

    /// Rule evaluation only ever produces the two retry reason codes.
    #[test]
    fn rule_failures_use_known_reason_codes(
        quality in metric_map(),
        icao in metric_map()
    ) {
        let response = response_from(quality, icao);
        if let Some(verdict) = evaluate_rules(&response) {
            prop_assert!(!verdict.is_valid);
            prop_assert!(
                verdict.reason_code == REASON_RETRY_QUALITY
                    || verdict.reason_code == REASON_RETRY_ICAO
            );
        }
    }

    /// Visibility at or above the threshold passes; below it fails.
    #[test]
    fn nose_visibility_threshold_is_inclusive(value in 0i64..=100) {
        let mut response = passing_response();
        response.icao_data.insert("nose_visibility".to_string(), json!(value));

        let verdict = evaluate_rules(&response);
        if value >= 45 {
            prop_assert_eq!(verdict, None);
        } else {
            let verdict = verdict.expect("below-threshold visibility must fail");
            prop_assert_eq!(verdict.reason_code, REASON_RETRY_ICAO);
        }
    }

    /// A non-numeric value in a numeric ICAO field does not violate the
    /// threshold rule.
    #[test]
    fn non_numeric_visibility_passes(text in "[A-Z_]{1,12}") {
        let mut response = passing_response();
        response.icao_data.insert("nose_visibility".to_string(), json!(text));
        prop_assert_eq!(evaluate_rules(&response), None);
    }

    /// Whatever the ICAO section holds, wrong eyes status always fails the
    /// quality table first.
    #[test]
    fn closed_eyes_always_fail_quality(icao in metric_map()) {
        let mut quality = Map::new();
        quality.insert("eyes_status".to_string(), json!("CLOSED"));
        quality.insert("qc_passed".to_string(), json!(true));

        let response = response_from(quality, icao);
        let verdict = evaluate_rules(&response).expect("closed eyes must fail");
        prop_assert_eq!(verdict.reason_code, REASON_RETRY_QUALITY);
    }

    /// An empty quality section can never pass: the rules require the
    /// fields to be present.
    #[test]
    fn empty_quality_always_fails(icao in metric_map()) {
        let response = response_from(Map::new(), icao);
        let verdict = evaluate_rules(&response).expect("empty quality must fail");
        prop_assert_eq!(verdict.reason_code, REASON_RETRY_QUALITY);
    }
}
