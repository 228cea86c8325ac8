//! Interactive search session
//!
//! The orchestrator behind every surface: owns the query text, the current
//! response, the transient feedback banner, and the processing flag; wires
//! capture transcripts into submissions and speaks results back.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::capture::{CaptureEvent, SessionOptions, SpeechCapture, SttCapability};
use crate::feedback::{SpeechFeedback, TtsCapability};
use crate::i18n;
use crate::inference::InferenceClient;
use crate::response::AiResponse;
use crate::settings::{Settings, SettingsStore};

/// How long a feedback banner stays up
pub const BANNER_TTL: Duration = Duration::from_secs(3);

/// Delay before auto-listen kicks in after the session becomes active
const AUTO_LISTEN_DELAY: Duration = Duration::from_millis(500);

/// Capacity of the capture event channel
const CAPTURE_EVENTS: usize = 32;

/// Severity of a feedback banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Info,
    Success,
    Error,
}

/// A transient status notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub kind: BannerKind,
}

/// Mutable session state behind one lock
#[derive(Debug, Default)]
struct SessionState {
    query: String,
    response: Option<AiResponse>,
    banner: Option<Banner>,
}

/// The interactive query session
pub struct SearchSession {
    settings: Arc<SettingsStore>,
    inference: Arc<InferenceClient>,
    capture: Arc<SpeechCapture>,
    feedback: SpeechFeedback,
    state: Arc<Mutex<SessionState>>,
    /// Generation counter so an expired banner timer can't clear a newer one
    banner_seq: Arc<AtomicU64>,
    processing: AtomicBool,
    auto_listen_armed: AtomicBool,
}

impl SearchSession {
    /// Build a session; the returned receiver carries capture events that
    /// must be fed back through [`Self::handle_capture_event`]
    #[must_use]
    pub fn new(
        settings: Arc<SettingsStore>,
        inference: Arc<InferenceClient>,
        stt: SttCapability,
        tts: TtsCapability,
    ) -> (Arc<Self>, mpsc::Receiver<CaptureEvent>) {
        let (capture_tx, capture_rx) = mpsc::channel(CAPTURE_EVENTS);
        let capture = Arc::new(SpeechCapture::new(stt, capture_tx));
        let feedback = SpeechFeedback::new(tts, Arc::clone(&settings));

        let session = Arc::new(Self {
            settings,
            inference,
            capture,
            feedback,
            state: Arc::new(Mutex::new(SessionState::default())),
            banner_seq: Arc::new(AtomicU64::new(0)),
            processing: AtomicBool::new(false),
            auto_listen_armed: AtomicBool::new(false),
        });

        (session, capture_rx)
    }

    // -- Snapshots --

    /// Current query text
    #[must_use]
    pub fn query(&self) -> String {
        self.state.lock().unwrap().query.clone()
    }

    /// Current response, if any
    #[must_use]
    pub fn response(&self) -> Option<AiResponse> {
        self.state.lock().unwrap().response.clone()
    }

    /// Currently displayed banner, if any
    #[must_use]
    pub fn banner(&self) -> Option<Banner> {
        self.state.lock().unwrap().banner.clone()
    }

    /// Whether a submission is in flight
    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Whether the microphone session is active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.capture.is_listening()
    }

    /// Persistent warning when speech recognition is unavailable
    ///
    /// Unlike banners this never expires; text input stays fully usable.
    #[must_use]
    pub fn support_warning(&self) -> Option<&'static str> {
        if self.capture.is_supported() {
            None
        } else {
            Some(i18n::messages(self.settings.get().language).not_supported)
        }
    }

    // -- Operations --

    /// Submit a query
    ///
    /// Whitespace-only text is ignored with no state change. A submission
    /// arriving while another is in flight is rejected (serialized per
    /// session). The processing flag is always cleared in the final step.
    pub async fn submit(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if self.processing.swap(true, Ordering::SeqCst) {
            tracing::debug!("submission rejected: another query is in flight");
            return;
        }

        let settings = self.settings.get();
        let t = i18n::messages(settings.language);

        self.state.lock().unwrap().query = text.to_string();
        self.show_banner(t.processing, BannerKind::Info);

        tracing::info!(query = %text, language = %settings.language, "processing query");

        let outcome = self
            .inference
            .infer(text, &settings.custom_commands, settings.language)
            .await;

        match outcome {
            Ok(response) => {
                self.show_banner(t.results_ready, BannerKind::Success);

                if !response.interpretation.is_empty() {
                    self.feedback.speak(&response.interpretation);
                }

                if response.is_custom_command() {
                    if let Some(url) = &response.command_url {
                        open_url(url);
                    }
                }

                self.state.lock().unwrap().response = Some(response);
            }
            Err(e) => {
                tracing::error!(error = %e, "query processing failed");
                self.show_banner(t.processing_error, BannerKind::Error);
                self.feedback.speak(t.processing_error);
            }
        }

        self.processing.store(false, Ordering::SeqCst);
    }

    /// Clear the query and the current response
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.query.clear();
        state.response = None;
    }

    /// Toggle the listening session without touching other state
    pub async fn toggle_listening(&self) {
        if self.capture.is_listening() {
            self.capture.stop_listening().await;
            let t = i18n::messages(self.settings.get().language);
            self.show_banner(t.stopped_listening, BannerKind::Info);
        } else {
            self.start_listening().await;
        }
    }

    /// Start listening with the current settings
    pub async fn start_listening(&self) {
        self.capture
            .start_listening(session_options(&self.settings.get()))
            .await;
    }

    /// Arm the one-shot auto-listen behavior
    ///
    /// When enabled in settings and recognition is supported, listening
    /// starts once, shortly after the session becomes active. Debounced:
    /// repeated calls have no effect.
    pub fn arm_auto_listen(&self) {
        let settings_snapshot = self.settings.get();
        if !settings_snapshot.auto_listen || !self.capture.is_supported() || self.is_listening() {
            return;
        }
        if self.auto_listen_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let capture = Arc::clone(&self.capture);
        let settings = Arc::clone(&self.settings);
        tokio::spawn(async move {
            tokio::time::sleep(AUTO_LISTEN_DELAY).await;
            if !capture.is_listening() {
                capture.start_listening(session_options(&settings.get())).await;
            }
        });
    }

    /// Feed one capture event through the session
    pub async fn handle_capture_event(&self, event: CaptureEvent) {
        match event {
            CaptureEvent::ListeningChanged(true) => {
                let t = i18n::messages(self.settings.get().language);
                self.show_banner(t.listening_speak, BannerKind::Info);
                self.feedback.speak(t.listening_speak);
            }
            CaptureEvent::ListeningChanged(false) => {}
            CaptureEvent::Transcript(transcript) => {
                // Voice input has no separate confirm step
                self.state.lock().unwrap().query.clone_from(&transcript);
                self.submit(&transcript).await;
            }
            CaptureEvent::Error { kind, message } => {
                tracing::warn!(?kind, "speech capture error");
                self.show_banner(&message, BannerKind::Error);
                self.feedback.speak(&message);
            }
        }
    }

    /// Abort any in-flight capture session (shutdown path)
    pub async fn shutdown(&self) {
        self.capture.abort().await;
    }

    /// Display a banner and schedule its expiry
    ///
    /// A newer banner simply replaces the old one; the old timer becomes a
    /// no-op through the generation counter.
    fn show_banner(&self, message: &str, kind: BannerKind) {
        let seq = self.banner_seq.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().unwrap();
            state.banner = Some(Banner {
                message: message.to_string(),
                kind,
            });
        }

        let state = Arc::clone(&self.state);
        let banner_seq = Arc::clone(&self.banner_seq);
        tokio::spawn(async move {
            tokio::time::sleep(BANNER_TTL).await;
            if banner_seq.load(Ordering::SeqCst) == seq {
                state.lock().unwrap().banner = None;
            }
        });
    }
}

/// Capture options for the current settings
fn session_options(settings: &Settings) -> SessionOptions {
    SessionOptions {
        language: settings.language,
        continuous: settings.continuous_listening,
        interim_results: true,
    }
}

/// Open a URL in the system browser, detached
///
/// Best-effort: a missing opener is logged, never surfaced.
fn open_url(url: &str) {
    #[cfg(target_os = "macos")]
    let result = std::process::Command::new("open").arg(url).spawn();

    #[cfg(target_os = "windows")]
    let result = std::process::Command::new("cmd")
        .args(["/C", "start", "", url])
        .spawn();

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let result = std::process::Command::new("xdg-open").arg(url).spawn();

    match result {
        Ok(_) => tracing::debug!(url, "opened command URL"),
        Err(e) => tracing::warn!(url, error = %e, "failed to open command URL"),
    }
}
