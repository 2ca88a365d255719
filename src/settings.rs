use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension};

use crate::error::{RecorderError, Result};
use crate::models::{ConfigItem, FontSize, Theme};

pub const KEY_THEME: &str = "appearance/theme";
pub const KEY_FONT_SIZE: &str = "appearance/font_size";
pub const KEY_LAST_OPENED: &str = "general/last_opened_file";

/// Directory holding the preference database and the app log.
/// `RECORDER_HOME` overrides the default of `~/.recorder`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RECORDER_HOME") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".recorder")
}

/// Key/value preference store.
pub struct SettingsStore {
    conn: Connection,
}

impl SettingsStore {
    pub fn open_default() -> Result<Self> {
        let dir = state_dir();
        std::fs::create_dir_all(&dir)?;
        Self::open(&dir.join("settings.db"))
    }

    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key_name TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;
        Ok(SettingsStore { conn })
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key_name = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Stores a value after checking the key and, for enumerated keys, the value.
    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        validate(key, value)?;
        self.conn.execute(
            "INSERT INTO settings (key_name, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
             ON CONFLICT(key_name) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            [key, value],
        )?;
        log::debug!("setting {} = {}", key, value);
        Ok(())
    }

    /// Returns whether a value was removed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM settings WHERE key_name = ?1", [key])?;
        Ok(rows > 0)
    }

    pub fn list(&self) -> Result<Vec<ConfigItem>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key_name, value, updated_at FROM settings ORDER BY key_name")?;
        let rows = stmt.query_map([], |row| {
            Ok(ConfigItem {
                key_name: row.get(0)?,
                value: row.get(1)?,
                updated_at: row.get(2)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub fn theme(&self) -> Theme {
        self.get_or_warn(KEY_THEME)
            .and_then(|v| Theme::parse(&v))
            .unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.set(KEY_THEME, theme.as_str())
    }

    pub fn font_size(&self) -> FontSize {
        self.get_or_warn(KEY_FONT_SIZE)
            .and_then(|v| FontSize::parse(&v))
            .unwrap_or_default()
    }

    pub fn set_font_size(&self, size: FontSize) -> Result<()> {
        self.set(KEY_FONT_SIZE, size.as_str())
    }

    pub fn last_opened_file(&self) -> Option<PathBuf> {
        self.get_or_warn(KEY_LAST_OPENED).map(PathBuf::from)
    }

    /// `None` forgets the remembered file.
    pub fn set_last_opened_file(&self, path: Option<&Path>) -> Result<()> {
        match path {
            Some(p) => self.set(KEY_LAST_OPENED, &p.to_string_lossy()),
            None => self.remove(KEY_LAST_OPENED).map(|_| ()),
        }
    }

    // Preferences fall back to defaults when the store can't be read.
    fn get_or_warn(&self, key: &str) -> Option<String> {
        match self.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("failed to read setting {}: {}", key, e);
                None
            }
        }
    }
}

fn validate(key: &str, value: &str) -> Result<()> {
    let valid = match key {
        KEY_THEME => Theme::parse(value).is_some(),
        KEY_FONT_SIZE => FontSize::parse(value).is_some(),
        KEY_LAST_OPENED => !value.trim().is_empty(),
        _ => return Err(RecorderError::UnknownSetting(key.to_string())),
    };
    if valid {
        Ok(())
    } else {
        Err(RecorderError::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}
