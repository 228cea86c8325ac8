//! Presentation flags derived from accessibility settings
//!
//! Front-ends toggle global presentation state (contrast, text size, motion,
//! focus outlines) from these flags. Derivation is a pure function of the
//! settings value, so applying the same settings twice yields the same flags.

use serde::Serialize;

use super::Settings;

/// Global presentation toggles mirrored from accessibility settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationFlags {
    pub high_contrast: bool,
    pub large_text: bool,
    pub reduced_motion: bool,
    pub keyboard_navigation: bool,
}

impl PresentationFlags {
    /// Derive flags from a settings snapshot
    #[must_use]
    pub const fn derive(settings: &Settings) -> Self {
        Self {
            high_contrast: settings.high_contrast,
            large_text: settings.large_text,
            reduced_motion: settings.reduced_motion,
            keyboard_navigation: settings.keyboard_navigation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_idempotent() {
        let mut settings = Settings::default();
        settings.high_contrast = true;
        settings.reduced_motion = true;

        let once = PresentationFlags::derive(&settings);
        let twice = PresentationFlags::derive(&settings);

        assert_eq!(once, twice);
        assert!(once.high_contrast);
        assert!(once.reduced_motion);
        assert!(!once.large_text);
        assert!(once.keyboard_navigation);
    }
}
