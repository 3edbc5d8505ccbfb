//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> &'static str {
    r##"# agentpanes configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
# host = "0.0.0.0"
# port = 8000                       # 1-65535
# allowed_agents = ["pm", "frontend", "backend"]
# output_capacity = 256             # 16-65536 chunks per session
# session_ttl_secs = 3600           # 10-86400, idle shell sessions are reaped

[shell]
# program = ""                      # empty = $SHELL, then /bin/sh
# args = []
# working_directory = "/path/to/project"
# login_shell = false
# banner = "Terminal ready"
# bootstrap = ["hash -r"]

# [shell.env]
# EDITOR = "nvim"

[agents]
# mode = "local"                    # local | remote
# command = ["sh", "-c", "echo 'Agent ready'; while IFS= read -r line; do echo \"ECHO: $line\"; done"]

# [agents.remote_urls]
# pm = "http://localhost:9000"
# frontend = "http://localhost:9001"
# backend = "http://localhost:9002"
# gemini = "http://localhost:9004"

# [agents.api_key_env]
# claude = "ANTHROPIC_API_KEY"
# gemini = "GEMINI_API_KEY"

[execute]
# host = "0.0.0.0"
# port = 9000
# program = "gemini-cli"
# args = ["--no-color"]
# api_key_env = "GEMINI_API_KEY"
# require_api_key = true

[client]
# backend_url = "ws://localhost:8000"
# cols = 80                         # 2-1000
# rows = 24                         # 1-500
# scrollback_lines = 10000          # 100-1000000

# [[client.panes]]
# key = "pm"
# title = "Project Manager"

[theme]
# mode = "dark"                     # dark | light

[logging]
# level = "info"                    # trace | debug | info | warn | error
"##
}
