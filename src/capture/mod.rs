//! Speech capture controller
//!
//! Owns the lifecycle of a recognition session: Idle → Listening → Idle (or
//! error), with a buffer-replace policy over engine results. Transcripts are
//! emitted exactly once, at session end, never mid-session.

mod endpoint;
mod engine;
mod microphone;

pub use endpoint::{DetectorOutcome, UtteranceDetector};
pub use engine::{
    CaptureErrorKind, EngineEvent, RecognitionEngine, SessionOptions, SttCapability,
};
pub use microphone::MicrophoneEngine;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Events from the controller to the session orchestrator
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// Listening state flipped
    ListeningChanged(bool),
    /// A finalized transcript (trimmed, non-empty); at most one per session
    Transcript(String),
    /// Classified, localized session failure
    Error {
        kind: CaptureErrorKind,
        message: String,
    },
}

/// Speech capture session controller
pub struct SpeechCapture {
    capability: SttCapability,
    events: mpsc::Sender<CaptureEvent>,
    active: Arc<AtomicBool>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SpeechCapture {
    /// Create a controller emitting [`CaptureEvent`]s on `events`
    #[must_use]
    pub fn new(capability: SttCapability, events: mpsc::Sender<CaptureEvent>) -> Self {
        Self {
            capability,
            events,
            active: Arc::new(AtomicBool::new(false)),
            pump: Mutex::new(None),
        }
    }

    /// Whether a recognition engine is present at all
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.capability.is_available()
    }

    /// Whether a session is currently active
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Start a listening session
    ///
    /// Safe no-op when unsupported, and when already listening (guarded by
    /// a boolean check, not queued).
    pub async fn start_listening(&self, options: SessionOptions) {
        let Some(engine) = self.capability.engine() else {
            tracing::debug!("start_listening ignored: no recognition capability");
            return;
        };

        if self.active.swap(true, Ordering::SeqCst) {
            tracing::debug!("start_listening ignored: already listening");
            return;
        }

        let (engine_tx, engine_rx) = mpsc::channel::<EngineEvent>(32);
        engine.start(options, engine_tx).await;

        let events = self.events.clone();
        let active = Arc::clone(&self.active);
        let pump = tokio::spawn(Self::run_pump(engine_rx, events, active, options));

        let mut slot = self.pump.lock().unwrap();
        if let Some(previous) = slot.replace(pump) {
            // A finished session's pump; aborting a completed task is a no-op
            previous.abort();
        }
    }

    /// Process engine events for one session until it terminates
    async fn run_pump(
        mut engine_rx: mpsc::Receiver<EngineEvent>,
        events: mpsc::Sender<CaptureEvent>,
        active: Arc<AtomicBool>,
        options: SessionOptions,
    ) {
        // The transcript buffer: interim results overwrite it, a final
        // result overwrites it too — only the most recent segment survives
        let mut buffer = String::new();

        while let Some(event) = engine_rx.recv().await {
            match event {
                EngineEvent::Started => {
                    buffer.clear();
                    let _ = events.send(CaptureEvent::ListeningChanged(true)).await;
                }
                EngineEvent::Result { text, is_final } => {
                    if is_final || !text.is_empty() {
                        buffer = text;
                    }
                }
                EngineEvent::Ended => {
                    active.store(false, Ordering::SeqCst);
                    let _ = events.send(CaptureEvent::ListeningChanged(false)).await;

                    let transcript = buffer.trim();
                    if !transcript.is_empty() {
                        let _ = events
                            .send(CaptureEvent::Transcript(transcript.to_string()))
                            .await;
                    }
                    return;
                }
                EngineEvent::Error(kind) => {
                    // Buffer is discarded: errors never emit a transcript
                    active.store(false, Ordering::SeqCst);
                    let _ = events.send(CaptureEvent::ListeningChanged(false)).await;

                    let message = kind.message(options.language);
                    let _ = events.send(CaptureEvent::Error { kind, message }).await;
                    return;
                }
            }
        }

        // Engine dropped its sender without a terminal event
        active.store(false, Ordering::SeqCst);
        let _ = events.send(CaptureEvent::ListeningChanged(false)).await;
    }

    /// Request a graceful stop; the session ends through the normal
    /// end-of-session path (buffered speech may still be transcribed)
    pub async fn stop_listening(&self) {
        if !self.is_listening() {
            return;
        }
        if let Some(engine) = self.capability.engine() {
            engine.stop().await;
        }
    }

    /// Abort any in-progress session immediately, discarding its buffer
    pub async fn abort(&self) {
        if let Some(engine) = self.capability.engine() {
            engine.abort().await;
        }
        let handle = self.pump.lock().unwrap().take();
        if let Some(handle) = handle {
            handle.abort();
        }
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for SpeechCapture {
    fn drop(&mut self) {
        // Resource-cleanup guarantee: never leave an orphaned microphone
        // session behind the controller's lifetime
        if let Some(handle) = self.pump.lock().unwrap().take() {
            handle.abort();
        }
        if let Some(engine) = self.capability.engine() {
            if let Ok(runtime) = tokio::runtime::Handle::try_current() {
                runtime.spawn(async move { engine.abort().await });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use async_trait::async_trait;

    /// Engine that replays a scripted event sequence
    struct ScriptedEngine {
        script: Vec<EngineEvent>,
    }

    #[async_trait]
    impl RecognitionEngine for ScriptedEngine {
        async fn start(&self, _options: SessionOptions, events: mpsc::Sender<EngineEvent>) {
            let script = self.script.clone();
            tokio::spawn(async move {
                for event in script {
                    if events.send(event).await.is_err() {
                        return;
                    }
                }
            });
        }

        async fn stop(&self) {}
        async fn abort(&self) {}
    }

    fn options() -> SessionOptions {
        SessionOptions {
            language: Language::EsEs,
            continuous: false,
            interim_results: true,
        }
    }

    fn controller(
        script: Vec<EngineEvent>,
    ) -> (SpeechCapture, mpsc::Receiver<CaptureEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let capability = SttCapability::Available(Arc::new(ScriptedEngine { script }));
        (SpeechCapture::new(capability, tx), rx)
    }

    async fn drain(rx: &mut mpsc::Receiver<CaptureEvent>, n: usize) -> Vec<CaptureEvent> {
        let mut out = Vec::new();
        for _ in 0..n {
            out.push(rx.recv().await.expect("event"));
        }
        out
    }

    #[tokio::test]
    async fn final_transcript_is_emitted_once_at_session_end() {
        let (capture, mut rx) = controller(vec![
            EngineEvent::Started,
            EngineEvent::Result {
                text: "hola".to_string(),
                is_final: false,
            },
            EngineEvent::Result {
                text: "hola mundo".to_string(),
                is_final: true,
            },
            EngineEvent::Ended,
        ]);

        capture.start_listening(options()).await;
        let events = drain(&mut rx, 3).await;

        assert!(matches!(events[0], CaptureEvent::ListeningChanged(true)));
        assert!(matches!(events[1], CaptureEvent::ListeningChanged(false)));
        match &events[2] {
            CaptureEvent::Transcript(text) => assert_eq!(text, "hola mundo"),
            other => panic!("expected transcript, got {other:?}"),
        }
        assert!(!capture.is_listening());
    }

    #[tokio::test]
    async fn interim_results_overwrite_the_buffer() {
        let (capture, mut rx) = controller(vec![
            EngineEvent::Started,
            EngineEvent::Result {
                text: "qué".to_string(),
                is_final: false,
            },
            EngineEvent::Result {
                text: "qué tiempo hace".to_string(),
                is_final: false,
            },
            EngineEvent::Ended,
        ]);

        capture.start_listening(options()).await;
        let events = drain(&mut rx, 3).await;

        match &events[2] {
            CaptureEvent::Transcript(text) => assert_eq!(text, "qué tiempo hace"),
            other => panic!("expected transcript, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_buffer_emits_no_transcript() {
        let (capture, mut rx) = controller(vec![EngineEvent::Started, EngineEvent::Ended]);

        capture.start_listening(options()).await;
        let events = drain(&mut rx, 2).await;

        assert!(matches!(events[0], CaptureEvent::ListeningChanged(true)));
        assert!(matches!(events[1], CaptureEvent::ListeningChanged(false)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn errors_discard_the_buffer_and_localize_the_message() {
        let (capture, mut rx) = controller(vec![
            EngineEvent::Started,
            EngineEvent::Result {
                text: "hola".to_string(),
                is_final: true,
            },
            EngineEvent::Error(CaptureErrorKind::NoSpeech),
        ]);

        capture.start_listening(options()).await;
        let events = drain(&mut rx, 3).await;

        assert!(matches!(events[1], CaptureEvent::ListeningChanged(false)));
        match &events[2] {
            CaptureEvent::Error { kind, message } => {
                assert_eq!(*kind, CaptureErrorKind::NoSpeech);
                assert_eq!(message, "No se detectó voz. Intenta de nuevo.");
            }
            other => panic!("expected error, got {other:?}"),
        }
        // No transcript follows an error
        assert!(rx.try_recv().is_err());
        assert!(!capture.is_listening());
    }

    #[tokio::test]
    async fn start_while_listening_is_a_no_op() {
        // An engine that never terminates keeps the session active
        let (capture, mut rx) = controller(vec![EngineEvent::Started]);

        capture.start_listening(options()).await;
        assert!(matches!(
            rx.recv().await.unwrap(),
            CaptureEvent::ListeningChanged(true)
        ));
        assert!(capture.is_listening());

        capture.start_listening(options()).await;
        // No second ListeningChanged(true)
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn unsupported_capability_makes_start_a_safe_no_op() {
        let (tx, mut rx) = mpsc::channel(4);
        let capture = SpeechCapture::new(SttCapability::Unavailable, tx);

        assert!(!capture.is_supported());
        capture.start_listening(options()).await;

        assert!(!capture.is_listening());
        assert!(rx.try_recv().is_err());
    }
}
