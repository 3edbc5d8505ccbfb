//! Tests for TOML config loading, creation, and path resolution.

use super::template::default_config_toml;
use super::*;
use crate::schema::{AgentMode, PanesConfig, ThemeMode};
use std::path::Path;

#[test]
fn load_from_nonexistent_returns_parse_error() {
    let result = load_from_path(Path::new("/tmp/nonexistent_agentpanes_config.toml"));
    assert!(matches!(
        result.unwrap_err(),
        panes_common::ConfigError::ParseError(_)
    ));
}

#[test]
fn load_valid_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[server]
port = 8080

[agents]
mode = "remote"
"#,
    )
    .unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.agents.mode, AgentMode::Remote);
    // Defaults preserved
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.client.backend_url, "ws://localhost:8000");
    assert_eq!(config.theme.mode, ThemeMode::Dark);
}

#[test]
fn load_invalid_toml_returns_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "this is not valid toml {{{").unwrap();

    let result = load_from_path(&path);
    assert!(matches!(
        result.unwrap_err(),
        panes_common::ConfigError::ParseError(_)
    ));
}

#[test]
fn load_with_invalid_values_still_returns_parsed_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[client]\nrows = 0\n").unwrap();

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.client.rows, 0);
}

#[test]
fn template_parses_to_defaults() {
    let config: PanesConfig = toml::from_str(default_config_toml()).unwrap();
    let defaults = PanesConfig::default();
    assert_eq!(config.server.port, defaults.server.port);
    assert_eq!(config.agents.remote_urls, defaults.agents.remote_urls);
    assert_eq!(config.agents.api_key_env, defaults.agents.api_key_env);
    assert_eq!(config.shell.bootstrap, defaults.shell.bootstrap);
    assert_eq!(config.client.panes, defaults.client.panes);
}

#[test]
fn create_default_config_writes_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sub").join("config.toml");

    create_default_config(&path).unwrap();
    assert!(path.exists());

    let config = load_from_path(&path).unwrap();
    assert_eq!(config.server.port, 8000);
}

#[test]
fn default_config_path_ends_with_app_dir() {
    if let Ok(path) = default_config_path() {
        assert!(path.ends_with("agentpanes/config.toml"));
    }
}
