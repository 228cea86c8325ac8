//! Localized user-facing strings
//!
//! The gateway speaks two locales. Every message a user can see or hear is
//! resolved through [`VoiceMessages`] so display and speech feedback stay in
//! the configured language.

use serde::{Deserialize, Serialize};

/// Supported query/feedback locale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    /// Spanish (Spain)
    #[default]
    #[serde(rename = "es-ES")]
    EsEs,
    /// English (US)
    #[serde(rename = "en-US")]
    EnUs,
}

impl Language {
    /// BCP-47 tag as sent to STT/TTS services
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::EsEs => "es-ES",
            Self::EnUs => "en-US",
        }
    }

    /// Two-letter code for transcription APIs that want ISO 639-1
    #[must_use]
    pub const fn short_code(self) -> &'static str {
        match self {
            Self::EsEs => "es",
            Self::EnUs => "en",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// User-facing strings for the voice search flow
#[derive(Debug, Clone, Copy)]
pub struct VoiceMessages {
    pub listening_speak: &'static str,
    pub stopped_listening: &'static str,
    pub processing: &'static str,
    pub results_ready: &'static str,
    pub processing_error: &'static str,

    // Capture error classifications
    pub no_speech_detected: &'static str,
    pub no_microphone: &'static str,
    pub microphone_denied: &'static str,
    pub network_error: &'static str,
    pub recognition_aborted: &'static str,
    pub recognition_error: &'static str,
    pub not_supported: &'static str,
}

const ES: VoiceMessages = VoiceMessages {
    listening_speak: "Escuchando... Habla ahora",
    stopped_listening: "Dejé de escuchar",
    processing: "Procesando tu solicitud con IA...",
    results_ready: "¡Resultados listos!",
    processing_error: "No se pudo procesar tu solicitud. Intenta de nuevo.",
    no_speech_detected: "No se detectó voz. Intenta de nuevo.",
    no_microphone: "No se encontró micrófono. Revisa tu dispositivo.",
    microphone_denied: "Acceso al micrófono denegado. Por favor permite el acceso.",
    network_error: "Error de red. Verifica tu conexión.",
    recognition_aborted: "El reconocimiento de voz fue cancelado.",
    recognition_error: "Error de reconocimiento de voz",
    not_supported: "El reconocimiento de voz no está disponible. Revisa el micrófono y las credenciales de transcripción.",
};

const EN: VoiceMessages = VoiceMessages {
    listening_speak: "Listening... Speak now",
    stopped_listening: "Stopped listening",
    processing: "Processing your request with AI...",
    results_ready: "Results ready!",
    processing_error: "Your request could not be processed. Please try again.",
    no_speech_detected: "No speech detected. Please try again.",
    no_microphone: "No microphone found. Check your device.",
    microphone_denied: "Microphone access denied. Please allow access.",
    network_error: "Network error. Check your connection.",
    recognition_aborted: "Speech recognition was cancelled.",
    recognition_error: "Speech recognition error",
    not_supported: "Speech recognition is not available. Check the microphone and transcription credentials.",
};

/// Resolve the message catalog for a locale
#[must_use]
pub const fn messages(language: Language) -> &'static VoiceMessages {
    match language {
        Language::EsEs => &ES,
        Language::EnUs => &EN,
    }
}

/// Example queries shown when the session has no results yet
#[must_use]
pub const fn example_queries(language: Language) -> &'static [&'static str] {
    match language {
        Language::EsEs => &[
            "¿Cuál es el clima hoy?",
            "Buscar restaurantes cerca",
            "Poner un recordatorio para mañana",
            "Reproducir música relajante",
        ],
        Language::EnUs => &[
            "What's the weather today?",
            "Find restaurants nearby",
            "Set a reminder for tomorrow",
            "Play relaxing music",
        ],
    }
}
