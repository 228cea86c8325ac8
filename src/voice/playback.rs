//! Speaker playback for synthesized speech

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, mpsc};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleRate;

use crate::{Error, Result};

/// Playback sample rate (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Decode MP3 bytes and play them on the default output device
///
/// Blocking: returns when playback finishes or `cancel` is raised. Meant to
/// run on a blocking thread; the feedback emitter wraps it in
/// `spawn_blocking` and flips `cancel` to cut an utterance short.
///
/// # Errors
///
/// Returns error if decoding fails or no output device is usable
pub fn play_mp3(mp3_data: &[u8], cancel: &AtomicBool) -> Result<()> {
    let samples = decode_mp3(mp3_data)?;
    play_samples(&samples, cancel)
}

fn play_samples(samples: &[f32], cancel: &AtomicBool) -> Result<()> {
    if samples.is_empty() || cancel.load(Ordering::Relaxed) {
        return Ok(());
    }

    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

    let supported = device
        .supported_output_configs()
        .map_err(|e| Error::Audio(e.to_string()))?
        .find(|c| {
            (c.channels() == 1 || c.channels() == 2)
                && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
        })
        .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

    let config = supported
        .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
        .config();
    let channels = config.channels as usize;

    let queue = Arc::new(Mutex::new((samples.to_vec(), 0usize)));
    let (done_tx, done_rx) = mpsc::channel::<()>();

    let queue_cb = Arc::clone(&queue);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let Ok(mut guard) = queue_cb.lock() else {
                    return;
                };
                let (samples, pos) = &mut *guard;

                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(*pos).copied().unwrap_or(0.0);
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                    if *pos < samples.len() {
                        *pos += 1;
                        if *pos == samples.len() {
                            let _ = done_tx.send(());
                        }
                    }
                }
            },
            |err| {
                tracing::error!(error = %err, "playback stream error");
            },
            None,
        )
        .map_err(|e| Error::Audio(e.to_string()))?;

    stream.play().map_err(|e| Error::Audio(e.to_string()))?;

    // Wait for completion, polling the cancel flag
    let total_ms = (samples.len() as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
    let deadline = std::time::Instant::now() + std::time::Duration::from_millis(total_ms + 500);

    loop {
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("playback cancelled");
            break;
        }
        match done_rx.recv_timeout(std::time::Duration::from_millis(50)) {
            Ok(()) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                if std::time::Instant::now() > deadline {
                    break;
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    drop(stream);
    Ok(())
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        (left + right) / 2.0
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_mp3_bytes_decode_to_silence() {
        // minimp3 scans for a frame sync and finds none
        let samples = decode_mp3(&[0u8; 16]).unwrap();
        assert!(samples.is_empty());
    }

    #[test]
    fn cancelled_playback_returns_before_touching_audio() {
        let cancel = AtomicBool::new(true);
        // Empty sample list plus raised flag: must be a no-op even without
        // an output device on the test machine
        assert!(play_samples(&[], &cancel).is_ok());
    }
}
