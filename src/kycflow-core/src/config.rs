//! Configuration for the wizard engine.

use std::time::Duration;

use kycflow_capture::AntiSpoofThreshold;

use crate::error::WizardError;

/// Security level for the face SDK's anti-spoof analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceSecurityLevel {
    /// Lowest rejection rate.
    Low,
    /// Balanced.
    Medium,
    /// Strictest liveness requirement.
    High,
}

impl FaceSecurityLevel {
    /// Parse from the environment value; unknown values fall back to `Low`,
    /// matching the original deployment behavior.
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "MEDIUM" => Self::Medium,
            "HIGH" => Self::High,
            _ => Self::Low,
        }
    }

    /// The corresponding SDK anti-spoof threshold.
    pub fn anti_spoof_threshold(self) -> AntiSpoofThreshold {
        match self {
            Self::Low => AntiSpoofThreshold::Low,
            Self::Medium => AntiSpoofThreshold::Medium,
            Self::High => AntiSpoofThreshold::High,
        }
    }
}

/// Configuration for the wizard.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// Backend API base URL.
    pub api_base_url: String,
    /// OCR vendor license key.
    pub ocr_license_key: String,
    /// Face SDK anti-spoof level.
    pub face_security_level: FaceSecurityLevel,
    /// User key sent in capture metadata.
    pub user_key: String,
    /// Device key sent in capture metadata.
    pub device_key: String,
    /// Backend request timeout.
    pub request_timeout: Duration,
    /// Wall-clock budget for a document capture.
    pub document_capture_timeout: Duration,
    /// Wall-clock budget for a biometric capture.
    pub face_capture_timeout: Duration,
    /// Interval of the surface-relocation poll.
    pub surface_poll_interval: Duration,
    /// Total budget of the surface-relocation poll.
    pub surface_poll_budget: Duration,
    /// Pause after a capture before advancing (success animation).
    pub success_hold: Duration,
    /// Pause after a valid biometric before entering the success step.
    pub complete_hold: Duration,
    /// Pause before re-invoking capture on retry.
    pub retry_delay: Duration,
    /// Per-step retry bound; `None` leaves retries unbounded.
    pub max_retries: Option<u32>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".into(),
            ocr_license_key: String::new(),
            face_security_level: FaceSecurityLevel::Low,
            user_key: "test_123".into(),
            device_key: "120293".into(),
            request_timeout: Duration::from_secs(30),
            document_capture_timeout: Duration::from_secs(45),
            face_capture_timeout: Duration::from_secs(50),
            surface_poll_interval: Duration::from_millis(150),
            surface_poll_budget: Duration::from_secs(10),
            success_hold: Duration::from_secs(1),
            complete_hold: Duration::from_secs(3),
            retry_delay: Duration::from_secs(3),
            max_retries: None,
        }
    }
}

impl WizardConfig {
    /// Build a configuration from environment variables.
    ///
    /// `KYCFLOW_API_BASE_URL` is required; `KYCFLOW_OCR_LICENSE` and
    /// `KYCFLOW_FACE_SECURITY_LEVEL` are optional.
    pub fn from_env() -> Result<Self, WizardError> {
        let api_base_url =
            std::env::var("KYCFLOW_API_BASE_URL").map_err(|_| WizardError::Config {
                message: "KYCFLOW_API_BASE_URL is not set".into(),
            })?;

        let mut config = Self {
            api_base_url,
            ..Self::default()
        };
        if let Ok(license) = std::env::var("KYCFLOW_OCR_LICENSE") {
            config.ocr_license_key = license;
        }
        if let Ok(level) = std::env::var("KYCFLOW_FACE_SECURITY_LEVEL") {
            config.face_security_level = FaceSecurityLevel::parse_lenient(&level);
        }
        Ok(config)
    }

    /// Zero out the UX pacing delays. Used by tests and headless runs.
    pub fn without_pacing(mut self) -> Self {
        self.success_hold = Duration::ZERO;
        self.complete_hold = Duration::ZERO;
        self.retry_delay = Duration::ZERO;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_level_lenient_parse() {
        assert_eq!(
            FaceSecurityLevel::parse_lenient("high"),
            FaceSecurityLevel::High
        );
        assert_eq!(
            FaceSecurityLevel::parse_lenient("MEDIUM"),
            FaceSecurityLevel::Medium
        );
        // Unknown values degrade to Low rather than failing startup.
        assert_eq!(
            FaceSecurityLevel::parse_lenient("paranoid"),
            FaceSecurityLevel::Low
        );
    }

    #[test]
    fn test_default_timeouts() {
        let config = WizardConfig::default();
        assert_eq!(config.document_capture_timeout, Duration::from_secs(45));
        assert_eq!(config.face_capture_timeout, Duration::from_secs(50));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn test_without_pacing() {
        let config = WizardConfig::default().without_pacing();
        assert_eq!(config.success_hold, Duration::ZERO);
        assert_eq!(config.complete_hold, Duration::ZERO);
        assert_eq!(config.retry_delay, Duration::ZERO);
    }
}
