//! Surface-relocation shim.
//!
//! The vendor SDKs inject their capture dialog into the host surface with
//! their own chrome (title bar, button box). The wizard relocates that
//! dialog into the application's own container: a bounded, cancellable poll
//! watches for the dialog marker, strips the chrome, and moves the subtree
//! exactly once.
//!
//! The poll performs presentation-layer side effects only; it never touches
//! the capture session, so it cannot race with state transitions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Marker strings identifying a vendor dialog and its chrome on the surface.
#[derive(Debug, Clone, Copy)]
pub struct DialogMarkers {
    /// Marker of the injected dialog root.
    pub dialog: &'static str,
    /// Marker of the chrome elements stripped before relocation.
    pub chrome: &'static str,
}

/// Markers injected by the face SDK.
pub const FACE_DIALOG_MARKERS: DialogMarkers = DialogMarkers {
    dialog: "ui-dialog identy-face-dialog identy-capture-dialog ui-widget ui-widget-content ui-front",
    chrome: "ui-dialog-titlebar ui-corner-all ui-widget-header ui-helper-clearfix",
};

/// Markers injected by the document OCR SDK.
pub const DOCUMENT_DIALOG_MARKERS: DialogMarkers = DialogMarkers {
    dialog: "ui-dialog identy-ocr-dialog identy-capture-dialog noclose ui-widget ui-widget-content ui-front",
    chrome: "button_box",
};

/// The rendered surface the vendor SDK injects its dialog into.
///
/// Implemented by the host shell; the wizard core only needs these three
/// presentation-layer operations.
pub trait CaptureSurface: Send + Sync {
    /// Whether a dialog matching the marker is currently present.
    fn dialog_present(&self, dialog_marker: &str) -> bool;

    /// Remove the vendor chrome elements under the dialog.
    fn strip_chrome(&self, dialog_marker: &str, chrome_marker: &str);

    /// Move the dialog subtree into the host container.
    fn adopt_dialog(&self, dialog_marker: &str);
}

/// Headless host: no dialog ever appears. Used by tests and the CLI demo.
pub struct NullSurface;

impl CaptureSurface for NullSurface {
    fn dialog_present(&self, _dialog_marker: &str) -> bool {
        false
    }

    fn strip_chrome(&self, _dialog_marker: &str, _chrome_marker: &str) {}

    fn adopt_dialog(&self, _dialog_marker: &str) {}
}

/// How a relocation poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// The dialog was found, stripped, and relocated.
    Relocated,
    /// The poll budget elapsed without the dialog appearing.
    TimedOut,
    /// Session teardown cancelled the poll.
    Cancelled,
}

/// Poll the surface until the vendor dialog appears, then relocate it once.
///
/// Self-terminating: returns on success, on budget exhaustion, or when the
/// cancel channel fires (or its sender is dropped, which teardown implies).
pub async fn relocate_when_ready(
    surface: Arc<dyn CaptureSurface>,
    markers: DialogMarkers,
    interval: Duration,
    budget: Duration,
    mut cancel: watch::Receiver<bool>,
) -> RelocationOutcome {
    let deadline = tokio::time::Instant::now() + budget;
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    debug!("surface relocation cancelled");
                    return RelocationOutcome::Cancelled;
                }
            },
            _ = ticker.tick() => {
                if surface.dialog_present(markers.dialog) {
                    surface.strip_chrome(markers.dialog, markers.chrome);
                    surface.adopt_dialog(markers.dialog);
                    debug!("vendor dialog relocated into host container");
                    return RelocationOutcome::Relocated;
                }
                if tokio::time::Instant::now() >= deadline {
                    warn!(budget = ?budget, "vendor dialog never appeared");
                    return RelocationOutcome::TimedOut;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Surface whose dialog appears after a fixed number of polls.
    struct AppearingSurface {
        polls_until_present: usize,
        polls: AtomicUsize,
        strips: AtomicUsize,
        adoptions: AtomicUsize,
    }

    impl AppearingSurface {
        fn new(polls_until_present: usize) -> Self {
            Self {
                polls_until_present,
                polls: AtomicUsize::new(0),
                strips: AtomicUsize::new(0),
                adoptions: AtomicUsize::new(0),
            }
        }
    }

    impl CaptureSurface for AppearingSurface {
        fn dialog_present(&self, _dialog_marker: &str) -> bool {
            self.polls.fetch_add(1, Ordering::SeqCst) >= self.polls_until_present
        }

        fn strip_chrome(&self, _dialog_marker: &str, _chrome_marker: &str) {
            self.strips.fetch_add(1, Ordering::SeqCst);
        }

        fn adopt_dialog(&self, _dialog_marker: &str) {
            self.adoptions.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_relocates_exactly_once_when_dialog_appears() {
        let surface = Arc::new(AppearingSurface::new(3));
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let outcome = relocate_when_ready(
            Arc::clone(&surface) as Arc<dyn CaptureSurface>,
            FACE_DIALOG_MARKERS,
            Duration::from_millis(150),
            Duration::from_secs(10),
            cancel_rx,
        )
        .await;

        assert_eq!(outcome, RelocationOutcome::Relocated);
        assert_eq!(surface.strips.load(Ordering::SeqCst), 1);
        assert_eq!(surface.adoptions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_budget_caps_duration() {
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        let outcome = relocate_when_ready(
            Arc::new(NullSurface),
            DOCUMENT_DIALOG_MARKERS,
            Duration::from_millis(150),
            Duration::from_secs(10),
            cancel_rx,
        )
        .await;

        assert_eq!(outcome, RelocationOutcome::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_poll() {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let poll = tokio::spawn(relocate_when_ready(
            Arc::new(NullSurface) as Arc<dyn CaptureSurface>,
            FACE_DIALOG_MARKERS,
            Duration::from_millis(150),
            Duration::from_secs(10),
            cancel_rx,
        ));

        tokio::time::sleep(Duration::from_millis(400)).await;
        cancel_tx.send(true).unwrap();

        assert_eq!(poll.await.unwrap(), RelocationOutcome::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_sender_counts_as_cancel() {
        let (cancel_tx, cancel_rx) = watch::channel(false);

        let poll = tokio::spawn(relocate_when_ready(
            Arc::new(NullSurface) as Arc<dyn CaptureSurface>,
            FACE_DIALOG_MARKERS,
            Duration::from_millis(150),
            Duration::from_secs(10),
            cancel_rx,
        ));

        drop(cancel_tx);
        assert_eq!(poll.await.unwrap(), RelocationOutcome::Cancelled);
    }
}
