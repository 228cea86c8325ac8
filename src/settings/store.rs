//! Durable settings store
//!
//! One JSON blob under a single key in a SQLite key-value table. Loading
//! merges the blob over hardcoded defaults (missing fields keep defaults,
//! unknown fields are ignored), so older and newer blobs both load cleanly.

use std::path::Path;
use std::sync::Mutex;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use tokio::sync::watch;
use uuid::Uuid;

use super::{CommandDraft, CommandPatch, CustomCommand, PresentationFlags, Settings, SettingsPatch};
use crate::{Error, Result};

/// Key under which the settings blob is stored
const SETTINGS_KEY: &str = "settings";

/// Connection pool for the settings database
type DbPool = Pool<SqliteConnectionManager>;

/// Single-writer store for [`Settings`]
///
/// All mutations persist the full blob in one statement and republish the
/// derived presentation flags.
pub struct SettingsStore {
    pool: DbPool,
    state: Mutex<Settings>,
    presentation: watch::Sender<PresentationFlags>,
}

impl SettingsStore {
    /// Open the store backed by a database file, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be opened or initialized
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_manager(SqliteConnectionManager::file(path))
    }

    /// Open an in-memory store (used in tests)
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be initialized
    pub fn in_memory() -> Result<Self> {
        // A single connection so every handle sees the same memory database
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::from_pool(pool)
    }

    fn with_manager(manager: SqliteConnectionManager) -> Result<Self> {
        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .map_err(|e| Error::Database(e.to_string()))?;
        Self::from_pool(pool)
    }

    fn from_pool(pool: DbPool) -> Result<Self> {
        {
            let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
            conn.execute(
                "CREATE TABLE IF NOT EXISTS kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
                [],
            )?;
        }

        let settings = Self::load(&pool)?;
        let (presentation, _) = watch::channel(PresentationFlags::derive(&settings));

        Ok(Self {
            pool,
            state: Mutex::new(settings),
            presentation,
        })
    }

    /// Load the stored blob merged over defaults
    fn load(pool: &DbPool) -> Result<Settings> {
        let conn = pool.get().map_err(|e| Error::Database(e.to_string()))?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1",
                [SETTINGS_KEY],
                |row| row.get(0),
            )
            .ok();

        let Some(blob) = stored else {
            return Ok(Settings::default());
        };

        match serde_json::from_str(&blob) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse stored settings, using defaults");
                Ok(Settings::default())
            }
        }
    }

    /// Current settings snapshot
    #[must_use]
    pub fn get(&self) -> Settings {
        self.state.lock().unwrap().clone()
    }

    /// Subscribe to presentation flag changes
    #[must_use]
    pub fn presentation(&self) -> watch::Receiver<PresentationFlags> {
        self.presentation.subscribe()
    }

    /// Mutate settings through a closure, persist, and publish flags
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails; in-memory state is already
    /// updated at that point and will be re-persisted by the next mutation.
    pub fn update<F>(&self, mutate: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            mutate(&mut state);
            state.clone()
        };

        self.persist(&snapshot)?;
        self.publish(&snapshot);
        Ok(snapshot)
    }

    /// Apply a partial update (shallow merge)
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails
    pub fn apply_patch(&self, patch: &SettingsPatch) -> Result<Settings> {
        self.update(|settings| patch.apply(settings))
    }

    /// Add a custom command, assigning it a fresh id
    ///
    /// # Errors
    ///
    /// Returns error if the phrase is empty or persistence fails
    pub fn add_command(&self, draft: CommandDraft) -> Result<CustomCommand> {
        let phrase = draft.phrase.trim().to_string();
        if phrase.is_empty() {
            return Err(Error::Settings(
                "command phrase must not be empty".to_string(),
            ));
        }

        let command = CustomCommand {
            id: Uuid::new_v4().to_string(),
            phrase,
            action: draft.action,
            url: draft.url,
            enabled: draft.enabled,
        };

        let added = command.clone();
        self.update(move |settings| settings.custom_commands.push(command))?;

        tracing::debug!(id = %added.id, phrase = %added.phrase, "custom command added");
        Ok(added)
    }

    /// Update a command by id
    ///
    /// Returns `Ok(None)` when no command has that id.
    ///
    /// # Errors
    ///
    /// Returns error if the patched phrase is empty or persistence fails
    pub fn update_command(&self, id: &str, patch: &CommandPatch) -> Result<Option<CustomCommand>> {
        if let Some(phrase) = &patch.phrase {
            if phrase.trim().is_empty() {
                return Err(Error::Settings(
                    "command phrase must not be empty".to_string(),
                ));
            }
        }

        let mut updated = None;
        let snapshot = {
            let mut state = self.state.lock().unwrap();
            if let Some(cmd) = state.custom_commands.iter_mut().find(|c| c.id == id) {
                if let Some(phrase) = &patch.phrase {
                    cmd.phrase = phrase.trim().to_string();
                }
                if let Some(action) = &patch.action {
                    cmd.action.clone_from(action);
                }
                if let Some(url) = &patch.url {
                    cmd.url = Some(url.clone());
                }
                if let Some(enabled) = patch.enabled {
                    cmd.enabled = enabled;
                }
                updated = Some(cmd.clone());
            }
            state.clone()
        };

        if updated.is_some() {
            self.persist(&snapshot)?;
            self.publish(&snapshot);
        }
        Ok(updated)
    }

    /// Delete a command by id, returning whether it existed
    ///
    /// # Errors
    ///
    /// Returns error if persistence fails
    pub fn delete_command(&self, id: &str) -> Result<bool> {
        let mut removed = false;
        self.update(|settings| {
            let before = settings.custom_commands.len();
            settings.custom_commands.retain(|c| c.id != id);
            removed = settings.custom_commands.len() != before;
        })?;
        Ok(removed)
    }

    /// Restore defaults and erase durable state
    ///
    /// Idempotent: resetting twice leaves the same state as resetting once.
    ///
    /// # Errors
    ///
    /// Returns error if the durable row cannot be deleted
    pub fn reset(&self) -> Result<Settings> {
        let defaults = Settings::default();
        {
            let mut state = self.state.lock().unwrap();
            *state = defaults.clone();
        }

        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute("DELETE FROM kv WHERE key = ?1", [SETTINGS_KEY])?;

        self.publish(&defaults);
        tracing::info!("settings reset to defaults");
        Ok(defaults)
    }

    /// Write the full blob in a single statement
    fn persist(&self, settings: &Settings) -> Result<()> {
        let blob = serde_json::to_string(settings)?;
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [SETTINGS_KEY, blob.as_str()],
        )?;
        Ok(())
    }

    fn publish(&self, settings: &Settings) {
        let flags = PresentationFlags::derive(settings);
        // Send only fails when every receiver is gone, which is fine
        let _ = self.presentation.send(flags);
    }

    /// Whether a durable blob currently exists (used by tests and diagnostics)
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be queried
    pub fn has_durable_state(&self) -> Result<bool> {
        let conn = self
            .pool
            .get()
            .map_err(|e| Error::Database(e.to_string()))?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM kv WHERE key = ?1",
            [SETTINGS_KEY],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Language;
    use crate::settings::VoiceSpeed;

    fn draft(phrase: &str) -> CommandDraft {
        CommandDraft {
            phrase: phrase.to_string(),
            action: "open mail".to_string(),
            url: Some("https://mail.google.com".to_string()),
            enabled: true,
        }
    }

    #[test]
    fn update_then_get_round_trips() {
        let store = SettingsStore::in_memory().unwrap();

        store
            .update(|s| {
                s.language = Language::EnUs;
                s.voice_speed = VoiceSpeed::Fast;
                s.high_contrast = true;
            })
            .unwrap();

        let settings = store.get();
        assert_eq!(settings.language, Language::EnUs);
        assert_eq!(settings.voice_speed, VoiceSpeed::Fast);
        assert!(settings.high_contrast);
        // Untouched fields keep their prior value
        assert!(settings.voice_feedback);
    }

    #[test]
    fn add_command_assigns_unique_ids_and_preserves_order() {
        let store = SettingsStore::in_memory().unwrap();

        let first = store.add_command(draft("abrir correo")).unwrap();
        let second = store.add_command(draft("poner música")).unwrap();

        assert_ne!(first.id, second.id);
        let commands = store.get().custom_commands;
        assert_eq!(commands[0].phrase, "abrir correo");
        assert_eq!(commands[1].phrase, "poner música");
    }

    #[test]
    fn add_command_rejects_empty_phrase() {
        let store = SettingsStore::in_memory().unwrap();
        let err = store.add_command(draft("   ")).unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
        assert!(store.get().custom_commands.is_empty());
    }

    #[test]
    fn update_command_by_identity() {
        let store = SettingsStore::in_memory().unwrap();
        let cmd = store.add_command(draft("abrir correo")).unwrap();

        let patch = CommandPatch {
            enabled: Some(false),
            ..CommandPatch::default()
        };
        let updated = store.update_command(&cmd.id, &patch).unwrap().unwrap();

        assert!(!updated.enabled);
        assert_eq!(updated.phrase, "abrir correo");
        assert!(store.update_command("missing", &patch).unwrap().is_none());
    }

    #[test]
    fn update_command_rejects_empty_phrase() {
        let store = SettingsStore::in_memory().unwrap();
        let cmd = store.add_command(draft("abrir correo")).unwrap();

        let patch = CommandPatch {
            phrase: Some("  ".to_string()),
            ..CommandPatch::default()
        };
        assert!(store.update_command(&cmd.id, &patch).is_err());
        assert_eq!(store.get().custom_commands[0].phrase, "abrir correo");
    }

    #[test]
    fn delete_command_reports_existence() {
        let store = SettingsStore::in_memory().unwrap();
        let cmd = store.add_command(draft("abrir correo")).unwrap();

        assert!(store.delete_command(&cmd.id).unwrap());
        assert!(!store.delete_command(&cmd.id).unwrap());
        assert!(store.get().custom_commands.is_empty());
    }

    #[test]
    fn reset_is_idempotent_and_erases_durable_state() {
        let store = SettingsStore::in_memory().unwrap();
        store
            .update(|s| {
                s.high_contrast = true;
                s.auto_listen = true;
            })
            .unwrap();
        assert!(store.has_durable_state().unwrap());

        let once = store.reset().unwrap();
        assert!(!store.has_durable_state().unwrap());
        let twice = store.reset().unwrap();

        assert_eq!(once, twice);
        assert_eq!(once, Settings::default());
        assert!(!store.has_durable_state().unwrap());
    }

    #[test]
    fn mutations_publish_presentation_flags() {
        let store = SettingsStore::in_memory().unwrap();
        let rx = store.presentation();
        assert!(!rx.borrow().high_contrast);

        store.update(|s| s.high_contrast = true).unwrap();
        assert!(rx.borrow().high_contrast);

        store.reset().unwrap();
        assert!(!rx.borrow().high_contrast);
    }
}
