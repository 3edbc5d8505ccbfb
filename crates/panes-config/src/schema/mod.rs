//! Configuration schema types for agentpanes.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod agents;
mod client;
mod execute;
mod server;
mod shell;
mod system;
mod theme;

pub use agents::*;
pub use client::*;
pub use execute::*;
pub use server::*;
pub use shell::*;
pub use system::*;
pub use theme::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration shared by every agentpanes binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanesConfig {
    pub server: ServerConfig,
    pub shell: ShellConfig,
    pub agents: AgentsConfig,
    pub execute: ExecuteConfig,
    pub client: ClientConfig,
    pub theme: ThemeConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
