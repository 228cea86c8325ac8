//! User settings: accessibility flags, voice options, custom commands
//!
//! The [`SettingsStore`] is the single writer for all of this state. UI
//! surfaces read snapshots and mutate through its update operations; every
//! mutation is persisted as one JSON blob.

mod presentation;
mod store;

pub use presentation::PresentationFlags;
pub use store::SettingsStore;

use serde::{Deserialize, Serialize};

use crate::i18n::Language;

/// Speech feedback rate
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl VoiceSpeed {
    /// Playback rate multiplier relative to the platform default
    #[must_use]
    pub const fn rate(self) -> f32 {
        match self {
            Self::Slow => 0.7,
            Self::Normal => 1.0,
            Self::Fast => 1.3,
        }
    }
}

/// A user-defined phrase→action binding
///
/// Matched against queries before any inference call. Collection order is
/// insertion order; the matcher honors it (first match wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomCommand {
    pub id: String,
    pub phrase: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub enabled: bool,
}

/// A command as submitted by the user, before an id is assigned
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandDraft {
    pub phrase: String,
    pub action: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Partial update for an existing command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandPatch {
    #[serde(default)]
    pub phrase: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
}

/// Process-wide user settings
///
/// Every field carries a serde default so blobs written by older builds
/// merge over the current defaults on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    // Accessibility
    #[serde(default)]
    pub screen_reader_optimized: bool,
    #[serde(default)]
    pub high_contrast: bool,
    #[serde(default)]
    pub large_text: bool,
    #[serde(default)]
    pub reduced_motion: bool,
    #[serde(default = "default_true")]
    pub keyboard_navigation: bool,
    #[serde(default = "default_true")]
    pub voice_feedback: bool,

    // Voice
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub voice_speed: VoiceSpeed,
    #[serde(default)]
    pub auto_listen: bool,
    #[serde(default)]
    pub continuous_listening: bool,

    // Commands
    #[serde(default)]
    pub custom_commands: Vec<CustomCommand>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            screen_reader_optimized: false,
            high_contrast: false,
            large_text: false,
            reduced_motion: false,
            keyboard_navigation: true,
            voice_feedback: true,
            language: Language::default(),
            voice_speed: VoiceSpeed::default(),
            auto_listen: false,
            continuous_listening: false,
            custom_commands: Vec::new(),
        }
    }
}

/// Partial settings update as accepted by the settings API
///
/// Absent fields leave the current value untouched (shallow merge).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default)]
    pub screen_reader_optimized: Option<bool>,
    #[serde(default)]
    pub high_contrast: Option<bool>,
    #[serde(default)]
    pub large_text: Option<bool>,
    #[serde(default)]
    pub reduced_motion: Option<bool>,
    #[serde(default)]
    pub keyboard_navigation: Option<bool>,
    #[serde(default)]
    pub voice_feedback: Option<bool>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default)]
    pub voice_speed: Option<VoiceSpeed>,
    #[serde(default)]
    pub auto_listen: Option<bool>,
    #[serde(default)]
    pub continuous_listening: Option<bool>,
}

impl SettingsPatch {
    /// Apply this patch over `settings`, field by field
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.screen_reader_optimized {
            settings.screen_reader_optimized = v;
        }
        if let Some(v) = self.high_contrast {
            settings.high_contrast = v;
        }
        if let Some(v) = self.large_text {
            settings.large_text = v;
        }
        if let Some(v) = self.reduced_motion {
            settings.reduced_motion = v;
        }
        if let Some(v) = self.keyboard_navigation {
            settings.keyboard_navigation = v;
        }
        if let Some(v) = self.voice_feedback {
            settings.voice_feedback = v;
        }
        if let Some(v) = self.language {
            settings.language = v;
        }
        if let Some(v) = self.voice_speed {
            settings.voice_speed = v;
        }
        if let Some(v) = self.auto_listen {
            settings.auto_listen = v;
        }
        if let Some(v) = self.continuous_listening {
            settings.continuous_listening = v;
        }
    }
}

const fn default_true() -> bool {
    true
}
