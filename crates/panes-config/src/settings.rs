//! Flat string-keyed settings store.
//!
//! Holds the agent credentials and the display-mode flag. Read once at
//! startup, written only on an explicit [`SettingsStore::save`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use panes_common::ConfigError;

pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const DARK_MODE: &str = "DARK_MODE";

/// Keys the settings dialog knows about.
pub const KNOWN_KEYS: &[&str] = &[ANTHROPIC_API_KEY, GEMINI_API_KEY, DARK_MODE];

/// Get the platform-specific default settings file path.
pub fn default_settings_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("agentpanes").join("settings.json"))
}

#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl SettingsStore {
    /// A store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from `path`. A missing file yields an empty store bound to it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let values = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                ConfigError::ParseError(format!("failed to parse {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ConfigError::ParseError(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            path: Some(path.to_path_buf()),
            values,
        })
    }

    /// Load from the platform default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(&default_settings_path()?)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Stored display-mode flag; `None` when unset or not `true`/`false`.
    pub fn dark_mode(&self) -> Option<bool> {
        match self.get(DARK_MODE)? {
            "true" => Some(true),
            "false" => Some(false),
            other => {
                tracing::debug!(value = other, "ignoring unparsable DARK_MODE setting");
                None
            }
        }
    }

    pub fn set_dark_mode(&mut self, dark: bool) {
        self.set(DARK_MODE, dark.to_string());
    }

    /// Persist to the bound path. No-op for in-memory stores.
    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| ConfigError::WriteError(format!("failed to serialize settings: {e}")))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::WriteError(format!(
                    "failed to create settings directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json).map_err(|e| {
            ConfigError::WriteError(format!("failed to write {}: {e}", tmp_path.display()))
        })?;
        if let Err(e) = std::fs::rename(&tmp_path, path) {
            tracing::warn!("atomic rename failed ({e}), falling back to direct write");
            std::fs::write(path, &json).map_err(|e2| {
                ConfigError::WriteError(format!("failed to write {}: {e2}", path.display()))
            })?;
        }

        tracing::debug!(path = %path.display(), "Settings saved");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
