//! Agent-execution sidecar configuration types.

use serde::{Deserialize, Serialize};

/// Settings for the `POST /execute` sidecar.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteConfig {
    pub host: String,
    pub port: u16,
    /// Agent CLI spawned once per request.
    pub program: String,
    pub args: Vec<String>,
    /// Environment variable the credential is passed through. Requests
    /// without `apiKey` fall back to the sidecar's own environment.
    pub api_key_env: String,
    /// Reject requests that carry no credential at all.
    pub require_api_key: bool,
}

impl Default for ExecuteConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9000,
            program: "gemini-cli".into(),
            args: vec!["--no-color".into()],
            api_key_env: "GEMINI_API_KEY".into(),
            require_api_key: true,
        }
    }
}

impl ExecuteConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_gemini_cli() {
        let config = ExecuteConfig::default();
        assert_eq!(config.program, "gemini-cli");
        assert_eq!(config.args, vec!["--no-color".to_string()]);
        assert_eq!(config.api_key_env, "GEMINI_API_KEY");
        assert!(config.require_api_key);
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
    }

    #[test]
    fn claude_sidecar_from_toml() {
        let config: ExecuteConfig = toml::from_str(
            r#"
port = 9003
program = "claude"
args = ["-p"]
api_key_env = "ANTHROPIC_API_KEY"
"#,
        )
        .unwrap();
        assert_eq!(config.port, 9003);
        assert_eq!(config.program, "claude");
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
    }
}
