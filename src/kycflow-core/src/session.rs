//! The capture session aggregate.
//!
//! One [`CaptureSession`] lives for the duration of a wizard run: it holds
//! the current step, the artifacts captured so far, per-step retry counters,
//! the mounted-lifecycle flags for capture surfaces, and the step-local
//! error banner. It is mutated exclusively by the state machine; mutators
//! are crate-private.

use std::collections::{HashMap, HashSet};

use crate::types::{CapturedArtifact, StepKind, WizardStep};

/// Aggregate state for one wizard run.
#[derive(Debug)]
pub struct CaptureSession {
    current: WizardStep,
    artifacts: HashMap<StepKind, CapturedArtifact>,
    retries: HashMap<StepKind, u32>,
    mounted: HashSet<StepKind>,
    banner: Option<String>,
}

impl CaptureSession {
    /// Fresh session positioned on the onboarding step.
    pub fn new() -> Self {
        Self {
            current: WizardStep::Onboarding,
            artifacts: HashMap::new(),
            retries: HashMap::new(),
            mounted: HashSet::new(),
            banner: None,
        }
    }

    /// The step currently presented.
    pub fn current_step(&self) -> WizardStep {
        self.current
    }

    /// The artifact captured for a step, if any.
    pub fn artifact(&self, kind: StepKind) -> Option<&CapturedArtifact> {
        self.artifacts.get(&kind)
    }

    /// Retry count for a step. Monotone within a session.
    pub fn retry_count(&self, kind: StepKind) -> u32 {
        self.retries.get(&kind).copied().unwrap_or(0)
    }

    /// Whether a capture surface has been mounted for this step.
    pub fn is_mounted(&self, kind: StepKind) -> bool {
        self.mounted.contains(&kind)
    }

    /// The step-local error banner, if one is showing.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub(crate) fn set_current(&mut self, step: WizardStep) {
        self.current = step;
    }

    /// Store an artifact, superseding any previous one for the same step.
    pub(crate) fn store_artifact(&mut self, artifact: CapturedArtifact) {
        self.artifacts.insert(artifact.step_kind, artifact);
    }

    pub(crate) fn discard_artifact(&mut self, kind: StepKind) {
        self.artifacts.remove(&kind);
    }

    /// Increment a retry counter, returning the new value.
    pub(crate) fn bump_retry(&mut self, kind: StepKind) -> u32 {
        let count = self.retries.entry(kind).or_insert(0);
        *count += 1;
        *count
    }

    pub(crate) fn mark_mounted(&mut self, kind: StepKind) {
        self.mounted.insert(kind);
    }

    pub(crate) fn clear_mounted(&mut self) {
        self.mounted.clear();
    }

    pub(crate) fn set_banner(&mut self, message: String) {
        self.banner = Some(message);
    }

    pub(crate) fn clear_banner(&mut self) {
        self.banner = None;
    }

    /// Full reset back to onboarding. Artifacts, counters, mounted flags and
    /// banner are all discarded.
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_artifact(kind: StepKind, byte: u8) -> CapturedArtifact {
        CapturedArtifact::new(kind, vec![byte; 4])
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = CaptureSession::new();
        assert_eq!(session.current_step(), WizardStep::Onboarding);
        assert!(session.artifact(StepKind::DocumentFront).is_none());
        assert_eq!(session.retry_count(StepKind::Biometric), 0);
        assert!(session.banner().is_none());
    }

    #[test]
    fn test_artifact_superseded_not_mutated() {
        let mut session = CaptureSession::new();
        session.store_artifact(make_artifact(StepKind::DocumentFront, 1));
        session.store_artifact(make_artifact(StepKind::DocumentFront, 2));

        let stored = session.artifact(StepKind::DocumentFront).unwrap();
        assert_eq!(stored.image, vec![2; 4]);
    }

    #[test]
    fn test_retry_counter_monotone() {
        let mut session = CaptureSession::new();
        assert_eq!(session.bump_retry(StepKind::Biometric), 1);
        assert_eq!(session.bump_retry(StepKind::Biometric), 2);
        assert_eq!(session.retry_count(StepKind::Biometric), 2);
        // Other steps unaffected.
        assert_eq!(session.retry_count(StepKind::DocumentFront), 0);
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut session = CaptureSession::new();
        session.set_current(WizardStep::Biometric);
        session.store_artifact(make_artifact(StepKind::DocumentFront, 1));
        session.bump_retry(StepKind::Biometric);
        session.mark_mounted(StepKind::Biometric);
        session.set_banner("FEEDBACK_RETRY_ICAO".to_string());

        session.reset();

        assert_eq!(session.current_step(), WizardStep::Onboarding);
        assert!(session.artifact(StepKind::DocumentFront).is_none());
        assert_eq!(session.retry_count(StepKind::Biometric), 0);
        assert!(!session.is_mounted(StepKind::Biometric));
        assert!(session.banner().is_none());
    }
}
