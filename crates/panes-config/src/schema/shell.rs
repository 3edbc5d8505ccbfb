//! Shell process configuration types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Shell process settings for `/ws-shell/{key}` sessions.
///
/// Controls which shell to launch, its arguments, working directory,
/// extra environment variables, and what runs right after it starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Shell program path. Empty string means auto-detect from `$SHELL`.
    pub program: String,
    /// Extra arguments passed to the shell.
    pub args: Vec<String>,
    /// Initial working directory. `None` means inherit from the server.
    pub working_directory: Option<String>,
    /// Extra environment variables injected into the shell.
    pub env: HashMap<String, String>,
    /// Launch as a login shell.
    pub login_shell: bool,
    /// Line echoed into every new session before the first prompt.
    /// Empty disables the banner.
    pub banner: String,
    /// Commands written to the shell once after spawn.
    pub bootstrap: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            program: String::new(),
            args: Vec::new(),
            working_directory: None,
            env: HashMap::new(),
            login_shell: false,
            banner: "Terminal ready".into(),
            bootstrap: vec!["hash -r".into()],
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
