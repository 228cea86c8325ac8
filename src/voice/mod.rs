//! Platform audio and speech services
//!
//! Microphone capture and speaker playback go through cpal; transcription
//! and synthesis are remote HTTP services. Higher layers never touch these
//! directly — they are wrapped by the capture engine and feedback emitter.

mod audio;
mod playback;
mod stt;
mod tts;

pub use audio::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use playback::play_mp3;
pub use stt::{DEFAULT_STT_URL, SpeechToText};
pub use tts::{DEFAULT_TTS_URL, TextToSpeech};
