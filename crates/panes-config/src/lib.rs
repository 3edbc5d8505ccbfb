//! agentpanes configuration system.
//!
//! Provides the TOML config shared by the backend, the agent sidecar and the
//! pane client, the flat key-value settings store for credentials and the
//! display-mode flag, and theme resolution for terminal surfaces. All config
//! sections use sensible defaults so partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use panes_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! let json = config_to_json(&config);
//! println!("{json}");
//! ```

pub mod schema;
pub mod settings;
pub mod theme;
pub mod toml_loader;
pub mod toml_writer;
pub mod validation;

pub use schema::{PanesConfig, CONFIG_SCHEMA_VERSION};
pub use settings::SettingsStore;
pub use theme::{resolve_theme_mode, TerminalTheme};
pub use toml_writer::{save_config, save_config_to_path};

use std::path::Path;

use panes_common::ConfigError;

/// Load config from `path`, or from the platform default path when `None`.
///
/// The default path is created from the commented template if missing.
/// An explicit path must exist.
pub fn load_config(path: Option<&Path>) -> Result<PanesConfig, ConfigError> {
    let config = match path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path.to_path_buf()));
            }
            toml_loader::load_from_path(path)?
        }
        None => toml_loader::load_default()?,
    };

    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &PanesConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
