//! Pane client configuration types.

use panes_common::{SessionError, SessionKey};
use serde::{Deserialize, Serialize};

/// One terminal pane bound to a backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaneConfig {
    /// Session key, used as the `/ws-shell/{key}` path segment.
    pub key: String,
    /// Title shown above the pane.
    pub title: String,
}

impl PaneConfig {
    pub fn new(key: &str, title: &str) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
        }
    }

    pub fn session_key(&self) -> Result<SessionKey, SessionError> {
        SessionKey::new(self.key.as_str())
    }
}

/// Client-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base WebSocket URL of the backend (`ws://` or `wss://`).
    pub backend_url: String,
    pub panes: Vec<PaneConfig>,
    /// Initial surface geometry before the first container fit.
    pub cols: u16,
    pub rows: u16,
    /// Lines of scrollback kept per surface.
    pub scrollback_lines: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: "ws://localhost:8000".into(),
            panes: vec![
                PaneConfig::new("pm", "Project Manager"),
                PaneConfig::new("frontend", "Frontend"),
                PaneConfig::new("backend", "Backend"),
            ],
            cols: 80,
            rows: 24,
            scrollback_lines: 10_000,
        }
    }
}

impl ClientConfig {
    /// Look up a configured pane by key.
    pub fn pane(&self, key: &str) -> Option<&PaneConfig> {
        self.panes.iter().find(|p| p.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pane_lookup() {
        let config = ClientConfig::default();
        assert_eq!(config.pane("frontend").unwrap().title, "Frontend");
        assert!(config.pane("qa").is_none());
    }

    #[test]
    fn pane_session_key_validates() {
        assert!(PaneConfig::new("pm", "PM").session_key().is_ok());
        assert!(PaneConfig::new("p m", "PM").session_key().is_err());
    }

    #[test]
    fn panes_from_toml_array_of_tables() {
        let config: ClientConfig = toml::from_str(
            r#"
backend_url = "wss://dev.example:8443"

[[panes]]
key = "pm"
title = "PM"

[[panes]]
key = "qa"
title = "QA"
"#,
        )
        .unwrap();
        assert_eq!(config.backend_url, "wss://dev.example:8443");
        assert_eq!(config.panes.len(), 2);
        assert_eq!(config.panes[1], PaneConfig::new("qa", "QA"));
        assert_eq!(config.cols, 80);
    }
}
