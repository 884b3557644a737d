//! # kycflow-core
//!
//! Step orchestration and capture-result validation for the kycflow
//! identity-verification wizard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     WizardEngine                            │
//! │                                                             │
//! │  ┌───────────────┐  ┌───────────────┐  ┌────────────────┐   │
//! │  │ SdkSession    │  │ BackendGateway│  │ CaptureResult  │   │
//! │  │ Adapter       │  │ (/v1/process, │  │ Validator      │   │
//! │  │ (single slot) │  │  /v1/verify..)│  │ (rule tables)  │   │
//! │  └───────┬───────┘  └───────┬───────┘  └───────┬────────┘   │
//! │          │                  │                  │            │
//! │          ▼                  ▼                  ▼            │
//! │  ┌──────────────────────────────────────────────────┐       │
//! │  │              WizardStateMachine                  │       │
//! │  │   onboarding → document-front → document-back    │       │
//! │  │        → biometric → success | error             │       │
//! │  └──────────────────────────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The flow: the engine invokes the SDK session adapter for the current
//! step; the adapter returns a raw capture artifact; for the biometric step
//! the validator submits the artifact through the backend gateway and
//! evaluates the response; the verdict feeds back into the state machine,
//! which advances, stays for a retry, or halts.
//!
//! ## Invariants
//!
//! - At most one vendor SDK handle is live process-wide; starting a new
//!   session always aborts the prior one first.
//! - The `CaptureSession` aggregate is mutated only by the state machine.
//! - Validation failures are verdict values, never errors; SDK and backend
//!   failures become step-local banners, never wizard crashes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod machine;
pub mod session;
pub mod surface;
pub mod types;
pub mod validator;

pub use adapter::SdkSessionAdapter;
pub use config::{FaceSecurityLevel, WizardConfig};
pub use engine::WizardEngine;
pub use error::{CaptureFailureKind, WizardError};
pub use gateway::{Backend, BackendGateway};
pub use machine::{StepOutcome, WizardStateMachine};
pub use session::CaptureSession;
pub use surface::{CaptureSurface, DialogMarkers, NullSurface, RelocationOutcome};
pub use types::{
    CaptureMetadata, CaptureResponse, CapturedArtifact, DocumentSide, MatchOutcome, StepKind,
    ValidationVerdict, WizardStep,
};
