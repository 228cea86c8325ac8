//! Microphone-backed recognition engine
//!
//! A dedicated capture thread owns the cpal stream (it is not `Send`) and
//! ships sample chunks to an async task that endpoints utterances and
//! transcribes them remotely. Interim results are never produced — the
//! transcriber is utterance-based — so every `Result` event is final.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::endpoint::{DetectorOutcome, UtteranceDetector};
use super::engine::{CaptureErrorKind, EngineEvent, RecognitionEngine, SessionOptions};
use crate::voice::{AudioCapture, SAMPLE_RATE, SpeechToText, samples_to_wav};

/// How often the capture thread drains the microphone buffer
const DRAIN_INTERVAL: Duration = Duration::from_millis(100);

/// Recognition engine backed by the default microphone and a remote STT API
pub struct MicrophoneEngine {
    stt: Arc<SpeechToText>,
    stop: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl MicrophoneEngine {
    #[must_use]
    pub fn new(stt: SpeechToText) -> Self {
        Self {
            stt: Arc::new(stt),
            stop: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    /// Spawn the capture thread; resolves the init handshake once the
    /// microphone is streaming (or failed to open)
    fn spawn_capture_thread(
        stop: Arc<AtomicBool>,
        sample_tx: mpsc::Sender<Vec<f32>>,
        init_tx: oneshot::Sender<crate::Result<()>>,
    ) {
        std::thread::spawn(move || {
            let mut capture = match AudioCapture::new() {
                Ok(capture) => capture,
                Err(e) => {
                    let _ = init_tx.send(Err(e));
                    return;
                }
            };
            if let Err(e) = capture.start() {
                let _ = init_tx.send(Err(e));
                return;
            }
            let _ = init_tx.send(Ok(()));

            while !stop.load(Ordering::Relaxed) {
                std::thread::sleep(DRAIN_INTERVAL);
                let samples = capture.take_buffer();
                if !samples.is_empty() && sample_tx.blocking_send(samples).is_err() {
                    break;
                }
            }

            capture.stop();
        });
    }

    /// Transcribe one utterance, mapping failures to capture error kinds
    async fn transcribe(
        stt: &SpeechToText,
        samples: Vec<f32>,
        options: SessionOptions,
    ) -> Result<String, CaptureErrorKind> {
        let wav = samples_to_wav(&samples, SAMPLE_RATE)
            .map_err(|e| CaptureErrorKind::Unknown(e.to_string()))?;

        stt.transcribe(wav, options.language)
            .await
            .map_err(|_| CaptureErrorKind::Network)
    }
}

#[async_trait]
impl RecognitionEngine for MicrophoneEngine {
    async fn start(&self, options: SessionOptions, events: mpsc::Sender<EngineEvent>) {
        self.stop.store(false, Ordering::Relaxed);

        let (sample_tx, mut sample_rx) = mpsc::channel::<Vec<f32>>(64);
        let (init_tx, init_rx) = oneshot::channel();
        Self::spawn_capture_thread(Arc::clone(&self.stop), sample_tx, init_tx);

        match init_rx.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "microphone unavailable");
                let _ = events.send(EngineEvent::Error(CaptureErrorKind::NoMicrophone)).await;
                return;
            }
            Err(_) => {
                let _ = events
                    .send(EngineEvent::Error(CaptureErrorKind::Unknown(
                        "capture thread died".to_string(),
                    )))
                    .await;
                return;
            }
        }

        let stt = Arc::clone(&self.stt);
        let stop = Arc::clone(&self.stop);

        let task = tokio::spawn(async move {
            let _ = events.send(EngineEvent::Started).await;
            let mut detector = UtteranceDetector::new();

            loop {
                let Some(samples) = sample_rx.recv().await else {
                    // Capture thread gone: a stop was requested. Flush any
                    // partial utterance before ending the session.
                    if let Some(partial) = detector.take_partial() {
                        if let Ok(text) = Self::transcribe(&stt, partial, options).await {
                            if !text.trim().is_empty() {
                                let _ = events
                                    .send(EngineEvent::Result {
                                        text,
                                        is_final: true,
                                    })
                                    .await;
                            }
                        }
                    }
                    let _ = events.send(EngineEvent::Ended).await;
                    return;
                };

                match detector.feed(&samples) {
                    DetectorOutcome::Pending => {}
                    DetectorOutcome::Utterance(utterance) => {
                        match Self::transcribe(&stt, utterance, options).await {
                            Ok(text) => {
                                if !text.trim().is_empty() {
                                    let _ = events
                                        .send(EngineEvent::Result {
                                            text,
                                            is_final: true,
                                        })
                                        .await;
                                }
                                if !options.continuous {
                                    stop.store(true, Ordering::Relaxed);
                                    let _ = events.send(EngineEvent::Ended).await;
                                    return;
                                }
                            }
                            Err(kind) => {
                                stop.store(true, Ordering::Relaxed);
                                let _ = events.send(EngineEvent::Error(kind)).await;
                                return;
                            }
                        }
                    }
                    DetectorOutcome::NoSpeech => {
                        if !options.continuous {
                            stop.store(true, Ordering::Relaxed);
                            let _ = events
                                .send(EngineEvent::Error(CaptureErrorKind::NoSpeech))
                                .await;
                            return;
                        }
                        // Continuous sessions keep waiting
                    }
                }
            }
        });

        *self.task.lock().await = Some(task);
    }

    async fn stop(&self) {
        // The capture thread exits, the sample channel closes, and the
        // processing task flushes and emits Ended
        self.stop.store(true, Ordering::Relaxed);
    }

    async fn abort(&self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
        tracing::debug!("recognition session aborted");
    }
}
