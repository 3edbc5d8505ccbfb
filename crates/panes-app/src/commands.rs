//! One-shot subcommands: pane listing and the settings store.

use std::fmt::Write as _;

use panes_common::ConfigError;
use panes_config::settings::{DARK_MODE, KNOWN_KEYS};
use panes_config::{resolve_theme_mode, PanesConfig, SettingsStore};

use crate::cli::SettingsAction;

/// The configured panes, one per line: key, then title.
pub fn list_panes(config: &PanesConfig) -> String {
    let width = config
        .client
        .panes
        .iter()
        .map(|pane| pane.key.len())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for pane in &config.client.panes {
        let _ = writeln!(out, "{:<width$}  {}", pane.key, pane.title);
    }
    out
}

/// Show everything but the last four characters of a credential.
fn mask(key: &str, value: &str) -> String {
    if key == DARK_MODE {
        return value.to_string();
    }
    let count = value.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

/// Apply a settings action. Mutating actions save the store. Returns the
/// text to print.
pub fn run_settings(
    action: SettingsAction,
    store: &mut SettingsStore,
    config: &PanesConfig,
) -> Result<String, ConfigError> {
    match action {
        SettingsAction::Get { key } => Ok(store.get(&key).unwrap_or_default().to_string()),
        SettingsAction::Set { key, value } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                tracing::warn!(key = %key, "storing unrecognised settings key");
            }
            if key == DARK_MODE && !matches!(value.as_str(), "true" | "false") {
                return Err(ConfigError::ValidationError(format!(
                    "{DARK_MODE} must be true or false, got {value:?}"
                )));
            }
            store.set(&key, value);
            store.save()?;
            Ok(format!("{key} saved"))
        }
        SettingsAction::Unset { key } => {
            let existed = store.remove(&key).is_some();
            store.save()?;
            Ok(if existed {
                format!("{key} removed")
            } else {
                format!("{key} was not set")
            })
        }
        SettingsAction::List => {
            let mut out = String::new();
            for (key, value) in store.iter() {
                let _ = writeln!(out, "{key}={}", mask(key, value));
            }
            Ok(out)
        }
        SettingsAction::DarkMode { value: Some(dark) } => {
            store.set_dark_mode(dark);
            store.save()?;
            Ok(format!("{DARK_MODE}={dark}"))
        }
        SettingsAction::DarkMode { value: None } => {
            let mode = resolve_theme_mode(config, store);
            let source = if store.dark_mode().is_some() {
                "settings"
            } else {
                "config"
            };
            Ok(format!("{DARK_MODE}={} (from {source})", mode.is_dark()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use panes_config::settings::ANTHROPIC_API_KEY;

    #[test]
    fn default_panes_are_listed_aligned() {
        let listing = list_panes(&PanesConfig::default());
        assert_eq!(
            listing,
            "pm        Project Manager\nfrontend  Frontend\nbackend   Backend\n"
        );
    }

    #[test]
    fn credentials_are_masked() {
        assert_eq!(mask(ANTHROPIC_API_KEY, "sk-ant-12345678"), "***********5678");
        assert_eq!(mask(ANTHROPIC_API_KEY, "abc"), "***");
        assert_eq!(mask(DARK_MODE, "true"), "true");
    }

    #[test]
    fn set_then_get_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let config = PanesConfig::default();

        let mut store = SettingsStore::load(&path).unwrap();
        let out = run_settings(
            SettingsAction::Set {
                key: ANTHROPIC_API_KEY.into(),
                value: "sk-test".into(),
            },
            &mut store,
            &config,
        )
        .unwrap();
        assert_eq!(out, "ANTHROPIC_API_KEY saved");

        let mut reloaded = SettingsStore::load(&path).unwrap();
        let out = run_settings(
            SettingsAction::Get {
                key: ANTHROPIC_API_KEY.into(),
            },
            &mut reloaded,
            &config,
        )
        .unwrap();
        assert_eq!(out, "sk-test");
    }

    #[test]
    fn get_missing_key_is_empty() {
        let mut store = SettingsStore::in_memory();
        let out = run_settings(
            SettingsAction::Get {
                key: "GEMINI_API_KEY".into(),
            },
            &mut store,
            &PanesConfig::default(),
        )
        .unwrap();
        assert_eq!(out, "");
    }

    #[test]
    fn dark_mode_flag_must_be_boolean() {
        let mut store = SettingsStore::in_memory();
        let err = run_settings(
            SettingsAction::Set {
                key: DARK_MODE.into(),
                value: "yes".into(),
            },
            &mut store,
            &PanesConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
        assert_eq!(store.get(DARK_MODE), None);
    }

    #[test]
    fn dark_mode_reports_source() {
        let config = PanesConfig::default();
        let mut store = SettingsStore::in_memory();

        let out = run_settings(SettingsAction::DarkMode { value: None }, &mut store, &config)
            .unwrap();
        assert_eq!(out, "DARK_MODE=true (from config)");

        run_settings(
            SettingsAction::DarkMode { value: Some(false) },
            &mut store,
            &config,
        )
        .unwrap();
        let out = run_settings(SettingsAction::DarkMode { value: None }, &mut store, &config)
            .unwrap();
        assert_eq!(out, "DARK_MODE=false (from settings)");
    }

    #[test]
    fn list_masks_and_unset_removes() {
        let config = PanesConfig::default();
        let mut store = SettingsStore::in_memory();
        store.set(ANTHROPIC_API_KEY, "sk-ant-abcdef");
        store.set_dark_mode(true);

        let out = run_settings(SettingsAction::List, &mut store, &config).unwrap();
        assert_eq!(out, "ANTHROPIC_API_KEY=*********cdef\nDARK_MODE=true\n");

        let out = run_settings(
            SettingsAction::Unset {
                key: ANTHROPIC_API_KEY.into(),
            },
            &mut store,
            &config,
        )
        .unwrap();
        assert_eq!(out, "ANTHROPIC_API_KEY removed");
        assert_eq!(store.get(ANTHROPIC_API_KEY), None);
    }
}
