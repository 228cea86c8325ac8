//! Vox Gateway - voice-driven search for speech-first assistants
//!
//! This library provides the core functionality of the vox gateway:
//! - Speech capture (microphone endpointing, remote transcription)
//! - Custom command matching (phrase→action bindings, no network)
//! - Inference client with response normalization and deterministic fallback
//! - Speech feedback (remote synthesis, single active utterance)
//! - Durable user settings with presentation-flag mirroring
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │      Console  │  HTTP API  │  Global hotkey          │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Search Session                       │
//! │   Capture  │  Commands  │  Inference  │  Feedback   │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              External services                       │
//! │   Completion API  │  STT  │  TTS                    │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod capture;
pub mod commands;
pub mod config;
pub mod error;
pub mod feedback;
pub mod i18n;
pub mod inference;
pub mod response;
pub mod session;
pub mod settings;
pub mod voice;

pub use config::Config;
pub use error::{Error, Result};
pub use i18n::Language;
pub use inference::InferenceClient;
pub use response::{AiResponse, ResultKind, SearchResult};
pub use session::{Banner, BannerKind, SearchSession};
pub use settings::{CustomCommand, Settings, SettingsStore};
