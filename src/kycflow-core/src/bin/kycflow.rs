//! kycflow CLI - drive the identity-verification wizard from a terminal.
//!
//! Provides a scripted end-to-end demo of the wizard flow, plus inspection
//! commands for the validation rule tables and capture option tables.

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use kycflow_capture::{ScriptedProvider, SessionOptions};
use kycflow_core::validator::{IcaoExpectation, QualityExpectation, ICAO_RULES, QUALITY_RULES};
use kycflow_core::{
    Backend, BackendGateway, CaptureMetadata, CaptureResponse, MatchOutcome, NullSurface,
    SdkSessionAdapter, StepKind, WizardConfig, WizardEngine, WizardError,
};
use serde_json::json;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// kycflow - step orchestration for an identity-verification wizard.
///
/// The wizard sequences onboarding → document-front → document-back →
/// biometric → success, delegating capture to vendor SDKs and validation to
/// a verification backend.
#[derive(Parser)]
#[command(name = "kycflow")]
#[command(version = VERSION)]
#[command(about = "Identity-verification wizard orchestration")]
#[command(long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full wizard flow against a scripted capture SDK
    Demo {
        /// Use a real backend at this base URL instead of the built-in stub
        #[arg(long)]
        base_url: Option<String>,

        /// Make the stub backend reject the first match, exercising retry
        #[arg(long)]
        fail_first_match: bool,
    },

    /// Print the capture validation rule tables
    Rules,

    /// Show wizard steps and per-kind capture option tables
    Info,
}

fn print_banner() {
    println!(
        r#"
  _              __ _
 | | ___  _  __ / _| | _____      __
 | |/ / || |/ _| |_| |/ _ \ \ /\ / /
 |   <| || | (_|  _| | (_) \ V  V /
 |_|\_\\_, |\__|_| |_|\___/ \_/\_/
       |__/
  Identity-Verification Wizard Orchestration
  Version: {VERSION}
"#
    );
}

/// Built-in backend stub: approves quality/ICAO and the face match.
struct StubBackend {
    reject_next_match: Mutex<bool>,
}

impl StubBackend {
    fn new(fail_first_match: bool) -> Self {
        Self {
            reject_next_match: Mutex::new(fail_first_match),
        }
    }
}

#[async_trait]
impl Backend for StubBackend {
    async fn submit_capture(
        &self,
        _image: &[u8],
        _meta: &CaptureMetadata,
    ) -> Result<CaptureResponse, WizardError> {
        let response = json!({
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
        });
        serde_json::from_value(response).map_err(|e| WizardError::Backend {
            message: format!("stub response error: {e}"),
        })
    }

    async fn match_against_reference(
        &self,
        _image: &[u8],
        _reference_b64: &str,
    ) -> Result<MatchOutcome, WizardError> {
        let mut reject = self.reject_next_match.lock().expect("stub lock");
        if *reject {
            *reject = false;
            return Ok(MatchOutcome {
                is_match: false,
                message_validator: Some("LOW_SIMILARITY".to_string()),
            });
        }
        Ok(MatchOutcome {
            is_match: true,
            message_validator: None,
        })
    }
}

async fn run_demo(base_url: Option<String>, fail_first_match: bool, json_output: bool) {
    let mut config = WizardConfig::default().without_pacing();
    if let Some(url) = base_url.clone() {
        config.api_base_url = url;
    }

    let provider = Arc::new(ScriptedProvider::new());
    let surface = Arc::new(NullSurface);

    let backend: Arc<dyn Backend> = match base_url {
        Some(ref url) => match BackendGateway::new(url, Duration::from_secs(30)) {
            Ok(gateway) => Arc::new(gateway),
            Err(e) => {
                eprintln!("cannot create backend gateway: {e}");
                return;
            },
        },
        None => Arc::new(StubBackend::new(fail_first_match)),
    };

    let mut engine = WizardEngine::with_backend(config, provider, surface, backend);
    engine.pre_initialize_sdks().await;

    let mut transitions: Vec<String> = vec![engine.current_step().to_string()];
    let mut banners: Vec<String> = Vec::new();

    let result = async {
        let mut step = engine.start()?;
        transitions.push(step.to_string());

        let mut retries_left = 3u32;
        while !step.is_terminal() {
            step = engine.run_current_step().await?;
            transitions.push(step.to_string());

            let banner = engine.session().banner().map(str::to_string);
            if let Some(banner) = banner {
                banners.push(banner);
                if retries_left == 0 {
                    break;
                }
                retries_left -= 1;
                step = engine.retry().await?;
                transitions.push(step.to_string());
            }
        }
        Ok::<_, WizardError>(step)
    }
    .await;

    if json_output {
        let output = json!({
            "final_step": result.as_ref().map(ToString::to_string).unwrap_or_else(|e| format!("error: {e}")),
            "transitions": transitions,
            "banners": banners,
            "retries": {
                "document_front": engine.session().retry_count(StepKind::DocumentFront),
                "document_back": engine.session().retry_count(StepKind::DocumentBack),
                "biometric": engine.session().retry_count(StepKind::Biometric),
            },
        });
        println!("{}", serde_json::to_string_pretty(&output).expect("json output"));
        return;
    }

    println!("WIZARD DEMO");
    println!("===========\n");
    println!("Transitions:");
    for (i, step) in transitions.iter().enumerate() {
        println!("  {i}. {step}");
    }
    if !banners.is_empty() {
        println!("\nBanners shown:");
        for banner in &banners {
            println!("  - {banner}");
        }
    }
    match result {
        Ok(step) => println!("\nFinal step: {step}"),
        Err(e) => println!("\nWizard error: {e}"),
    }
}

fn quality_expectation_json(expected: QualityExpectation) -> serde_json::Value {
    match expected {
        QualityExpectation::Text(text) => json!(text),
        QualityExpectation::Flag(flag) => json!(flag),
    }
}

fn icao_expectation_json(expected: IcaoExpectation) -> serde_json::Value {
    match expected {
        IcaoExpectation::Flag(flag) => json!({ "equals": flag }),
        IcaoExpectation::Min(min) => json!({ "min": min }),
    }
}

fn show_rules(json_output: bool) {
    if json_output {
        let output = json!({
            "quality": QUALITY_RULES.iter()
                .map(|r| (r.key.to_string(), quality_expectation_json(r.expected)))
                .collect::<serde_json::Map<String, serde_json::Value>>(),
            "icao": ICAO_RULES.iter()
                .map(|r| (r.key.to_string(), icao_expectation_json(r.expected)))
                .collect::<serde_json::Map<String, serde_json::Value>>(),
        });
        println!("{}", serde_json::to_string_pretty(&output).expect("json output"));
        return;
    }

    println!("CAPTURE VALIDATION RULES");
    println!("========================\n");
    println!("Quality (exact match, first mismatch -> FEEDBACK_RETRY_QUALITY):");
    for rule in QUALITY_RULES {
        match rule.expected {
            QualityExpectation::Text(text) => println!("  {:24} = {:?}", rule.key, text),
            QualityExpectation::Flag(flag) => println!("  {:24} = {}", rule.key, flag),
        }
    }
    println!("\nICAO (first violation -> FEEDBACK_RETRY_ICAO):");
    for rule in ICAO_RULES {
        match rule.expected {
            IcaoExpectation::Flag(flag) => println!("  {:24} = {}", rule.key, flag),
            IcaoExpectation::Min(min) => println!("  {:24} >= {}", rule.key, min),
        }
    }
    println!("\nMatching:");
    println!("  missing reference document -> FEEDBACK_MATCHING_ERROR");
    println!("  remote match=false         -> messageValidator passes through");
}

fn show_info() {
    println!("\nWIZARD STEPS");
    println!("============\n");
    println!("  onboarding -> document-front -> document-back -> biometric -> success");
    println!("  (terminal: success, error; back navigation between capture steps)\n");

    let config = WizardConfig::default();
    let adapter = SdkSessionAdapter::new(
        Arc::new(ScriptedProvider::new()),
        Arc::new(NullSurface),
        &config,
    );

    println!("CAPTURE OPTION TABLES");
    println!("=====================\n");
    for kind in [
        StepKind::DocumentFront,
        StepKind::DocumentBack,
        StepKind::Biometric,
    ] {
        match adapter.options_for(kind) {
            SessionOptions::Document(opts) => {
                println!("{kind}: document capture");
                println!("  detection modes: {:?}", opts.detection_modes);
                println!("  exit timeout:    {:?}", opts.exit_timeout);
            },
            SessionOptions::Face(opts) => {
                println!("{kind}: face capture");
                println!("  ICAO checks:     {}", opts.icao_checks);
                println!("  anti-spoof:      {:?}", opts.anti_spoof_threshold);
                println!("  capture timeout: {:?}", opts.capture_timeout);
            },
        }
        println!();
    }

    println!("Environment:");
    println!("  KYCFLOW_API_BASE_URL        backend base URL (required for from_env)");
    println!("  KYCFLOW_OCR_LICENSE         OCR vendor license key");
    println!("  KYCFLOW_FACE_SECURITY_LEVEL LOW | MEDIUM | HIGH");
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    let json_output = cli.format == "json";

    // Initialize logging (suppress for JSON output)
    if json_output {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::ERROR)
            .with_target(false)
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_target(false)
            .init();
    }

    match cli.command {
        Some(Commands::Demo {
            base_url,
            fail_first_match,
        }) => {
            if !json_output {
                print_banner();
            }
            run_demo(base_url, fail_first_match, json_output).await;
        },
        Some(Commands::Rules) => {
            if !json_output {
                print_banner();
            }
            show_rules(json_output);
        },
        Some(Commands::Info) => {
            print_banner();
            show_info();
        },
        None => {
            print_banner();
            println!("Run `kycflow demo` to drive the wizard with a scripted SDK,");
            println!("`kycflow rules` to inspect the validation rule tables, or");
            println!("`kycflow info` for steps and capture option tables.");
        },
    }
}
