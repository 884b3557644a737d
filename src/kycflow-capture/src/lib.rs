//! # kycflow-capture
//!
//! Vendor capture-SDK abstraction for the kycflow identity wizard.
//!
//! The actual biometric capture, OCR, and liveness analysis happen inside
//! proprietary vendor SDKs. This crate models those SDKs as a narrow
//! capability interface so the rest of the wizard never touches vendor
//! internals:
//!
//! - [`CaptureSdk`] — one live capture lifecycle: `initialize` → `capture`
//!   → `abort`.
//! - [`SdkProvider`] — constructs one [`CaptureSdk`] instance per session
//!   from per-kind [`SessionOptions`], and performs the one-time vendor
//!   warm-up ([`SdkProvider::pre_initialize`]).
//! - [`ScriptedProvider`] — a deterministic in-memory implementation used
//!   by tests and the CLI demo.
//!
//! All SDK outputs are treated as opaque data validated at the boundary by
//! the consuming crate.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

mod error;
mod options;
mod scripted;
mod sdk;

pub use error::SdkError;
pub use options::{
    AntiSpoofThreshold, DetectionMode, DocumentCaptureOptions, DocumentProfile,
    FaceCaptureOptions, OutputTemplate, SessionOptions,
};
pub use scripted::{ScriptedCapture, ScriptedProvider};
pub use sdk::{CaptureSdk, PreInitConfig, SdkProvider};
