//! Speech feedback emitter
//!
//! Speaks interpretations and status messages back to the user. At most one
//! utterance is audible at a time: a new `speak` cancels whatever is still
//! playing (last writer wins, no queue).

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::i18n::Language;
use crate::settings::SettingsStore;
use crate::voice::{TextToSpeech, play_mp3};
use crate::Result;

/// One utterance as handed to a synthesizer
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub language: Language,
    /// Rate multiplier relative to the platform default
    pub rate: f32,
    /// Fixed neutral pitch
    pub pitch: f32,
}

/// A speech synthesis device
///
/// `speak` plays one utterance to completion (or cancellation); `cancel`
/// cuts the current utterance short.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn speak(&self, utterance: Utterance) -> Result<()>;
    fn cancel(&self);
}

/// Text-to-speech capability, detected at initialization
#[derive(Clone)]
pub enum TtsCapability {
    Available(Arc<dyn SpeechSynthesizer>),
    Unavailable,
}

impl TtsCapability {
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

/// Emits spoken feedback according to the user's settings
pub struct SpeechFeedback {
    capability: TtsCapability,
    settings: Arc<SettingsStore>,
}

impl SpeechFeedback {
    #[must_use]
    pub fn new(capability: TtsCapability, settings: Arc<SettingsStore>) -> Self {
        Self {
            capability,
            settings,
        }
    }

    /// Whether synthesis is available at all
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        self.capability.is_available()
    }

    /// Speak `text` in the configured language and rate
    ///
    /// No-op when voice feedback is disabled or synthesis is unavailable.
    /// Cancels any in-flight utterance first; playback happens in the
    /// background so callers never wait on audio.
    pub fn speak(&self, text: &str) {
        let TtsCapability::Available(synthesizer) = &self.capability else {
            return;
        };

        let settings = self.settings.get();
        if !settings.voice_feedback {
            return;
        }

        synthesizer.cancel();

        let utterance = Utterance {
            text: text.to_string(),
            language: settings.language,
            rate: settings.voice_speed.rate(),
            pitch: 1.0,
        };

        let synthesizer = Arc::clone(synthesizer);
        tokio::spawn(async move {
            if let Err(e) = synthesizer.speak(utterance).await {
                tracing::warn!(error = %e, "speech feedback failed");
            }
        });
    }
}

/// Synthesizer backed by a remote TTS API and local speaker playback
pub struct RemoteSynthesizer {
    tts: Arc<TextToSpeech>,
    /// Cancel flag of the utterance currently being spoken
    current: Mutex<Arc<AtomicBool>>,
}

impl RemoteSynthesizer {
    #[must_use]
    pub fn new(tts: TextToSpeech) -> Self {
        Self {
            tts: Arc::new(tts),
            current: Mutex::new(Arc::new(AtomicBool::new(false))),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for RemoteSynthesizer {
    async fn speak(&self, utterance: Utterance) -> Result<()> {
        // Install a fresh cancel flag for this utterance
        let cancel = Arc::new(AtomicBool::new(false));
        {
            let mut current = self.current.lock().unwrap();
            current.store(true, Ordering::Relaxed);
            *current = Arc::clone(&cancel);
        }

        let audio = self.tts.synthesize(&utterance.text, utterance.rate).await?;

        if cancel.load(Ordering::Relaxed) {
            // Superseded while synthesizing
            return Ok(());
        }

        tokio::task::spawn_blocking(move || play_mp3(&audio, &cancel))
            .await
            .map_err(|e| crate::Error::Tts(format!("playback task failed: {e}")))??;

        Ok(())
    }

    fn cancel(&self) {
        self.current.lock().unwrap().store(true, Ordering::Relaxed);
    }
}
