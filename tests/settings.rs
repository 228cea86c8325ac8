//! Settings store durability tests

use tempfile::TempDir;
use vox_gateway::settings::{CommandDraft, SettingsStore, VoiceSpeed};
use vox_gateway::{Language, Settings};

fn draft(phrase: &str) -> CommandDraft {
    CommandDraft {
        phrase: phrase.to_string(),
        action: format!("run {phrase}"),
        url: None,
        enabled: true,
    }
}

#[test]
fn settings_survive_a_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.db");

    {
        let store = SettingsStore::open(&path).unwrap();
        store
            .update(|s| {
                s.language = Language::EnUs;
                s.voice_speed = VoiceSpeed::Slow;
                s.auto_listen = true;
            })
            .unwrap();
        store.add_command(draft("abrir correo")).unwrap();
    }

    let store = SettingsStore::open(&path).unwrap();
    let settings = store.get();

    assert_eq!(settings.language, Language::EnUs);
    assert_eq!(settings.voice_speed, VoiceSpeed::Slow);
    assert!(settings.auto_listen);
    assert_eq!(settings.custom_commands.len(), 1);
    assert_eq!(settings.custom_commands[0].phrase, "abrir correo");
}

#[test]
fn reset_erases_the_durable_blob_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.db");

    let store = SettingsStore::open(&path).unwrap();
    store.update(|s| s.high_contrast = true).unwrap();
    assert!(store.has_durable_state().unwrap());

    let once = store.reset().unwrap();
    let twice = store.reset().unwrap();
    assert_eq!(once, twice);
    assert_eq!(once, Settings::default());
    assert!(!store.has_durable_state().unwrap());

    // A reopened store sees defaults, not the pre-reset state
    drop(store);
    let store = SettingsStore::open(&path).unwrap();
    assert_eq!(store.get(), Settings::default());
}

#[test]
fn command_order_is_preserved_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("settings.db");

    {
        let store = SettingsStore::open(&path).unwrap();
        store.add_command(draft("primero")).unwrap();
        store.add_command(draft("segundo")).unwrap();
        store.add_command(draft("tercero")).unwrap();
    }

    let store = SettingsStore::open(&path).unwrap();
    let phrases: Vec<String> = store
        .get()
        .custom_commands
        .iter()
        .map(|c| c.phrase.clone())
        .collect();

    assert_eq!(phrases, vec!["primero", "segundo", "tercero"]);
}
