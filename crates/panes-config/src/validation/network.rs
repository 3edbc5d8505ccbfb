//! Validation for the server, agent and sidecar sections.

use crate::schema::{AgentMode, PanesConfig};

use super::helpers::{validate_range, validate_session_key, validate_url_scheme};

pub(crate) fn validate_server(errors: &mut Vec<String>, config: &PanesConfig) {
    if config.server.port == 0 {
        errors.push("server.port must not be 0".into());
    }
    validate_range(
        errors,
        "server.output_capacity",
        config.server.output_capacity,
        16,
        65_536,
    );
    validate_range(
        errors,
        "server.session_ttl_secs",
        config.server.session_ttl_secs,
        10,
        86_400,
    );
    for agent in &config.server.allowed_agents {
        validate_session_key(errors, "server.allowed_agents", agent);
    }
}

pub(crate) fn validate_agents(errors: &mut Vec<String>, config: &PanesConfig) {
    let agents = &config.agents;
    match agents.mode {
        AgentMode::Local => {
            if agents.command.first().map_or(true, |p| p.is_empty()) {
                errors.push("agents.command must name a program in local mode".into());
            }
        }
        AgentMode::Remote => {
            for agent in &config.server.allowed_agents {
                if !agents.remote_urls.contains_key(agent) {
                    errors.push(format!("agents.remote_urls has no entry for {agent:?}"));
                }
            }
        }
    }
    for (agent, url) in &agents.remote_urls {
        validate_url_scheme(
            errors,
            &format!("agents.remote_urls.{agent}"),
            url,
            &["http://", "https://"],
        );
    }
}

pub(crate) fn validate_execute(errors: &mut Vec<String>, config: &PanesConfig) {
    if config.execute.port == 0 {
        errors.push("execute.port must not be 0".into());
    }
    if config.execute.program.is_empty() {
        errors.push("execute.program must not be empty".into());
    }
}
