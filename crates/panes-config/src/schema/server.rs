//! Backend server configuration types.

use serde::{Deserialize, Serialize};

/// WebSocket backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// Port for `/ws-shell/{key}` and `/ws/{agent}` (valid range: 1-65535).
    pub port: u16,
    /// Agent names accepted on `/ws/{agent}`.
    pub allowed_agents: Vec<String>,
    /// Output chunks buffered per session for slow subscribers (16-65536).
    pub output_capacity: u32,
    /// Seconds a shell session may sit with no attached pane before it is
    /// reaped (10-86400).
    pub session_ttl_secs: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            allowed_agents: vec!["pm".into(), "frontend".into(), "backend".into()],
            output_capacity: 256,
            session_ttl_secs: 3600,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
