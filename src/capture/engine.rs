//! Recognition engine capability interface
//!
//! Engines are injected rather than discovered ambiently so the controller
//! can be driven by a test double, and so a missing platform capability is
//! a value (`Unavailable`), not a runtime failure.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::i18n::{self, Language};

/// Options for one recognition session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Locale tag forwarded to the recognizer
    pub language: Language,
    /// Keep the session open across utterances
    pub continuous: bool,
    /// Ask for interim (non-final) results when the engine supports them
    pub interim_results: bool,
}

/// Classified recognition failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureErrorKind {
    /// Nothing was said within the listening window
    NoSpeech,
    /// No usable input device
    NoMicrophone,
    /// The platform denied microphone access
    PermissionDenied,
    /// Transcription transport failure
    Network,
    /// The session was cancelled
    Aborted,
    /// Anything the engine could not classify
    Unknown(String),
}

impl CaptureErrorKind {
    /// Localized user-facing message for this error
    #[must_use]
    pub fn message(&self, language: Language) -> String {
        let t = i18n::messages(language);
        match self {
            Self::NoSpeech => t.no_speech_detected.to_string(),
            Self::NoMicrophone => t.no_microphone.to_string(),
            Self::PermissionDenied => t.microphone_denied.to_string(),
            Self::Network => t.network_error.to_string(),
            Self::Aborted => t.recognition_aborted.to_string(),
            Self::Unknown(detail) => format!("{}: {detail}", t.recognition_error),
        }
    }
}

/// Raw event stream from a recognition engine to the controller
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The session is live and audio is flowing
    Started,
    /// A recognition result; `is_final` marks a committed utterance
    Result { text: String, is_final: bool },
    /// The session ended (end of speech or an explicit stop)
    Ended,
    /// The session failed; no further events follow
    Error(CaptureErrorKind),
}

/// A speech recognition session provider
///
/// `start` must emit `Started` once the session is live, or `Error` if it
/// never becomes live; exactly one `Ended` or `Error` terminates it.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Begin a session, emitting events on `events`
    async fn start(&self, options: SessionOptions, events: mpsc::Sender<EngineEvent>);

    /// Request a graceful stop (pending audio may still produce a result)
    async fn stop(&self);

    /// Tear the session down immediately, discarding pending audio
    async fn abort(&self);
}

/// Speech-to-text capability, detected at initialization
#[derive(Clone)]
pub enum SttCapability {
    /// A working engine
    Available(Arc<dyn RecognitionEngine>),
    /// No recognizer on this platform/configuration
    Unavailable,
}

impl SttCapability {
    /// Whether an engine is present
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// The engine handle, if any
    #[must_use]
    pub fn engine(&self) -> Option<Arc<dyn RecognitionEngine>> {
        match self {
            Self::Available(engine) => Some(Arc::clone(engine)),
            Self::Unavailable => None,
        }
    }
}
