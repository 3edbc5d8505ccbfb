//! Agent session configuration types for `/ws/{agent}`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How line-oriented agent sessions are backed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AgentMode {
    /// One long-lived child process per agent; stdout lines stream back.
    #[default]
    Local,
    /// Each message is POSTed to the agent's `/execute` endpoint.
    Remote,
}

/// Agent backing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub mode: AgentMode,
    /// Program and arguments started for every local agent.
    pub command: Vec<String>,
    /// Base URL per agent name for remote mode.
    pub remote_urls: BTreeMap<String, String>,
    /// Environment variable holding the credential sent along with
    /// requests to a given remote agent.
    pub api_key_env: BTreeMap<String, String>,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        let remote_urls = [
            ("pm", "http://localhost:9000"),
            ("frontend", "http://localhost:9001"),
            ("backend", "http://localhost:9002"),
            ("gemini", "http://localhost:9004"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let api_key_env = [
            ("claude", "ANTHROPIC_API_KEY"),
            ("gemini", "GEMINI_API_KEY"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            mode: AgentMode::Local,
            command: vec![
                "sh".into(),
                "-c".into(),
                "echo 'Agent ready'; while IFS= read -r line; do echo \"ECHO: $line\"; done".into(),
            ],
            remote_urls,
            api_key_env,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local_echo_agents() {
        let config = AgentsConfig::default();
        assert_eq!(config.mode, AgentMode::Local);
        assert_eq!(config.command[0], "sh");
        assert_eq!(config.remote_urls["pm"], "http://localhost:9000");
        assert_eq!(config.remote_urls["backend"], "http://localhost:9002");
        assert_eq!(config.api_key_env["gemini"], "GEMINI_API_KEY");
    }

    #[test]
    fn remote_mode_from_toml() {
        let config: AgentsConfig = toml::from_str(
            r#"
mode = "remote"

[remote_urls]
pm = "http://agents.internal:7000"
"#,
        )
        .unwrap();
        assert_eq!(config.mode, AgentMode::Remote);
        assert_eq!(config.remote_urls.len(), 1);
        assert_eq!(config.remote_urls["pm"], "http://agents.internal:7000");
        // Untouched tables keep their defaults.
        assert_eq!(config.api_key_env["claude"], "ANTHROPIC_API_KEY");
    }
}
