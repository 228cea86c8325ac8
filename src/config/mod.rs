//! Configuration management
//!
//! Layering: environment > TOML file > defaults. API keys come from the
//! process environment first; their absence downgrades capabilities rather
//! than failing startup.

pub mod file;

use std::path::PathBuf;

use crate::inference::DEFAULT_API_URL;
use crate::voice::{DEFAULT_STT_URL, DEFAULT_TTS_URL};
use crate::Result;

/// Default API server port
const DEFAULT_PORT: u16 = 18890;

/// Gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Data directory (settings database)
    pub data_dir: PathBuf,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,

    /// Inference service configuration
    pub inference: InferenceConfig,

    /// Voice services configuration
    pub voice: VoiceConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,
}

/// Inference service configuration
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Chat-completion endpoint URL
    pub api_url: String,

    /// Bearer token; absent means queries fail upstream
    pub api_key: Option<String>,
}

/// Voice services configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Transcription endpoint URL
    pub stt_url: String,

    /// Transcription model override
    pub stt_model: Option<String>,

    /// Synthesis endpoint URL
    pub tts_url: String,

    /// Synthesis model override
    pub tts_model: Option<String>,

    /// Synthesis voice identifier
    pub tts_voice: String,

    /// Speech services API key; absent means STT/TTS are unavailable
    pub speech_api_key: Option<String>,
}

impl Config {
    /// Load configuration (env > toml > default)
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be created
    pub fn load() -> Result<Self> {
        let fc = file::load_config_file();

        let port = std::env::var("VOX_API_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .or(fc.server.port)
            .unwrap_or(DEFAULT_PORT);

        let data_dir = std::env::var("VOX_DATA_DIR")
            .map(PathBuf::from)
            .ok()
            .or_else(|| fc.server.data_dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| {
                directories::BaseDirs::new().map_or_else(
                    || PathBuf::from(".local/share/vox/gateway"),
                    |d| d.data_dir().join("vox").join("gateway"),
                )
            });
        std::fs::create_dir_all(&data_dir)?;

        let inference = InferenceConfig {
            api_url: std::env::var("VOX_INFERENCE_URL")
                .ok()
                .or(fc.inference.api_url)
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: std::env::var("GROQ_API_KEY").ok().or(fc.api_keys.inference),
        };

        let voice = VoiceConfig {
            stt_url: std::env::var("VOX_STT_URL")
                .ok()
                .or(fc.voice.stt_url)
                .unwrap_or_else(|| DEFAULT_STT_URL.to_string()),
            stt_model: std::env::var("VOX_STT_MODEL").ok().or(fc.voice.stt_model),
            tts_url: std::env::var("VOX_TTS_URL")
                .ok()
                .or(fc.voice.tts_url)
                .unwrap_or_else(|| DEFAULT_TTS_URL.to_string()),
            tts_model: std::env::var("VOX_TTS_MODEL").ok().or(fc.voice.tts_model),
            tts_voice: std::env::var("VOX_TTS_VOICE")
                .ok()
                .or(fc.voice.tts_voice)
                .unwrap_or_else(|| "alloy".to_string()),
            speech_api_key: std::env::var("OPENAI_API_KEY").ok().or(fc.api_keys.speech),
        };

        Ok(Self {
            data_dir,
            api_server: ApiServerConfig { port },
            inference,
            voice,
        })
    }

    /// Path of the settings database
    #[must_use]
    pub fn settings_db_path(&self) -> PathBuf {
        self.data_dir.join("settings.db")
    }
}
