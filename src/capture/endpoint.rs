//! Energy-based utterance endpointing
//!
//! Splits the microphone sample stream into utterances: speech begins when
//! RMS energy crosses a threshold, and ends after a trailing silence gap.
//! Purely local; transcription happens elsewhere.

use crate::voice::SAMPLE_RATE;

/// Minimum RMS energy to consider a chunk speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum utterance length to bother transcribing (0.3s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5s)
const SILENCE_SAMPLES: usize = 8000;

/// Silence before any speech that counts as "nothing was said" (8s)
const NO_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 8;

/// What a call to [`UtteranceDetector::feed`] produced
#[derive(Debug, PartialEq)]
pub enum DetectorOutcome {
    /// Still accumulating
    Pending,
    /// A complete utterance, ready for transcription
    Utterance(Vec<f32>),
    /// No speech was detected within the listening window
    NoSpeech,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DetectorState {
    /// Waiting for energy
    Idle,
    /// Accumulating an utterance
    Speech,
}

/// Segments a sample stream into utterances
pub struct UtteranceDetector {
    state: DetectorState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
    idle_counter: usize,
}

impl UtteranceDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: DetectorState::Idle,
            speech_buffer: Vec::new(),
            silence_counter: 0,
            idle_counter: 0,
        }
    }

    /// Feed a chunk of samples
    pub fn feed(&mut self, samples: &[f32]) -> DetectorOutcome {
        let is_speech = rms_energy(samples) > ENERGY_THRESHOLD;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Speech;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!("speech onset");
                } else {
                    self.idle_counter += samples.len();
                    if self.idle_counter >= NO_SPEECH_SAMPLES {
                        self.idle_counter = 0;
                        return DetectorOutcome::NoSpeech;
                    }
                }
            }
            DetectorState::Speech => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES {
                    // Judge length on the voiced part, not the trailing silence
                    let voiced = self.speech_buffer.len().saturating_sub(self.silence_counter);
                    let long_enough = voiced > MIN_SPEECH_SAMPLES;
                    let utterance = std::mem::take(&mut self.speech_buffer);
                    self.reset_counters();
                    self.state = DetectorState::Idle;

                    if long_enough {
                        tracing::debug!(samples = utterance.len(), "utterance complete");
                        return DetectorOutcome::Utterance(utterance);
                    }
                    // Too short to be speech, treat as noise
                }
            }
        }

        DetectorOutcome::Pending
    }

    /// Take whatever partial speech is buffered (used on explicit stop)
    ///
    /// Returns `None` when the buffer is too short to transcribe.
    pub fn take_partial(&mut self) -> Option<Vec<f32>> {
        let buffer = std::mem::take(&mut self.speech_buffer);
        self.reset_counters();
        self.state = DetectorState::Idle;

        (buffer.len() > MIN_SPEECH_SAMPLES).then_some(buffer)
    }

    const fn reset_counters(&mut self) {
        self.silence_counter = 0;
        self.idle_counter = 0;
    }
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// RMS energy of a sample chunk
#[allow(clippy::cast_precision_loss)]
fn rms_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loud(len: usize) -> Vec<f32> {
        vec![0.5; len]
    }

    fn silence(len: usize) -> Vec<f32> {
        vec![0.0; len]
    }

    #[test]
    fn energy_of_silence_is_near_zero() {
        assert!(rms_energy(&silence(100)) < 0.001);
        assert!(rms_energy(&loud(100)) > 0.4);
    }

    #[test]
    fn speech_followed_by_silence_yields_utterance() {
        let mut detector = UtteranceDetector::new();

        assert_eq!(detector.feed(&loud(8000)), DetectorOutcome::Pending);
        match detector.feed(&silence(SILENCE_SAMPLES + 1)) {
            DetectorOutcome::Utterance(samples) => {
                assert!(samples.len() > MIN_SPEECH_SAMPLES);
            }
            other => panic!("expected utterance, got {other:?}"),
        }
    }

    #[test]
    fn short_blips_are_discarded_as_noise() {
        let mut detector = UtteranceDetector::new();

        assert_eq!(detector.feed(&loud(1000)), DetectorOutcome::Pending);
        assert_eq!(
            detector.feed(&silence(SILENCE_SAMPLES + 1)),
            DetectorOutcome::Pending
        );
    }

    #[test]
    fn prolonged_initial_silence_reports_no_speech() {
        let mut detector = UtteranceDetector::new();

        let mut outcome = DetectorOutcome::Pending;
        for _ in 0..=(NO_SPEECH_SAMPLES / 16000) {
            outcome = detector.feed(&silence(16000));
            if outcome != DetectorOutcome::Pending {
                break;
            }
        }
        assert_eq!(outcome, DetectorOutcome::NoSpeech);
    }

    #[test]
    fn partial_speech_is_recoverable_on_stop() {
        let mut detector = UtteranceDetector::new();

        detector.feed(&loud(8000));
        let partial = detector.take_partial().unwrap();
        assert_eq!(partial.len(), 8000);
        assert!(detector.take_partial().is_none());
    }
}
