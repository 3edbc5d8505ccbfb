use super::*;
use crate::schema::{AgentMode, PaneConfig};

fn validation_message(config: &PanesConfig) -> String {
    match validate(config) {
        Err(ConfigError::ValidationError(msg)) => msg,
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn default_config_is_valid() {
    assert!(validate(&PanesConfig::default()).is_ok());
}

#[test]
fn zero_ports_rejected() {
    let mut config = PanesConfig::default();
    config.server.port = 0;
    config.execute.port = 0;
    let msg = validation_message(&config);
    assert!(msg.contains("server.port"));
    assert!(msg.contains("execute.port"));
}

#[test]
fn output_capacity_range() {
    let mut config = PanesConfig::default();
    config.server.output_capacity = 8;
    assert!(validation_message(&config).contains("server.output_capacity = 8"));
}

#[test]
fn backend_url_must_be_websocket() {
    let mut config = PanesConfig::default();
    config.client.backend_url = "http://localhost:8000".into();
    assert!(validation_message(&config).contains("client.backend_url"));

    config.client.backend_url = "wss://example.com".into();
    assert!(validate(&config).is_ok());
}

#[test]
fn geometry_ranges() {
    let mut config = PanesConfig::default();
    config.client.cols = 1;
    config.client.rows = 0;
    let msg = validation_message(&config);
    assert!(msg.contains("client.cols = 1"));
    assert!(msg.contains("client.rows = 0"));
}

#[test]
fn duplicate_and_invalid_pane_keys() {
    let mut config = PanesConfig::default();
    config.client.panes.push(PaneConfig::new("pm", "Another PM"));
    config.client.panes.push(PaneConfig::new("front/end", "Broken"));
    let msg = validation_message(&config);
    assert!(msg.contains("duplicate key \"pm\""));
    assert!(msg.contains("invalid session key"));
}

#[test]
fn empty_pane_list_rejected() {
    let mut config = PanesConfig::default();
    config.client.panes.clear();
    assert!(validation_message(&config).contains("at least one pane"));
}

#[test]
fn remote_mode_requires_url_per_allowed_agent() {
    let mut config = PanesConfig::default();
    config.agents.mode = AgentMode::Remote;
    config.agents.remote_urls.remove("frontend");
    assert!(validation_message(&config).contains("no entry for \"frontend\""));
}

#[test]
fn remote_urls_must_be_http() {
    let mut config = PanesConfig::default();
    config
        .agents
        .remote_urls
        .insert("pm".into(), "ftp://localhost".into());
    assert!(validation_message(&config).contains("agents.remote_urls.pm"));
}

#[test]
fn local_mode_requires_command() {
    let mut config = PanesConfig::default();
    config.agents.command.clear();
    assert!(validation_message(&config).contains("agents.command"));
}

#[test]
fn errors_are_collected_together() {
    let mut config = PanesConfig::default();
    config.server.port = 0;
    config.client.cols = 0;
    config.execute.program.clear();
    let msg = validation_message(&config);
    assert_eq!(msg.split("; ").count(), 3);
}
