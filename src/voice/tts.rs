//! Remote text-to-speech client

use crate::{Error, Result};

/// Default synthesis endpoint (OpenAI-compatible)
pub const DEFAULT_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Default synthesis model
const DEFAULT_MODEL: &str = "tts-1";

/// Synthesizes speech from text over HTTP, returning MP3 bytes
pub struct TextToSpeech {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    voice: String,
}

impl TextToSpeech {
    /// Create a new synthesis client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is empty
    pub fn new(
        api_url: String,
        api_key: String,
        voice: String,
        model: Option<String>,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config("API key required for synthesis".to_string()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            voice,
        })
    }

    /// Synthesize `text` at the given rate multiplier
    ///
    /// # Errors
    ///
    /// Returns error if the request fails
    pub async fn synthesize(&self, text: &str, rate: f32) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f32,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: rate,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "synthesis request failed");
                Error::Tts(format!("synthesis request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "synthesis API error");
            return Err(Error::Tts(format!("synthesis API error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), "synthesis complete");
        Ok(audio.to_vec())
    }
}
