//! PTY spawn logic: start the configured shell on a fresh PTY.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use portable_pty::{native_pty_system, CommandBuilder, PtySize};
use tokio::sync::broadcast;

use panes_common::SessionError;
use panes_config::schema::ShellConfig;

use panes_common::Utf8Carry;
use super::types::{PtyHandle, PtyOutput, PTY_READ_CHUNK};

// =============================================================================
// SHELL DETECTION
// =============================================================================

/// Get the user's default shell.
///
/// - Unix: reads `$SHELL`, falls back to `/bin/sh`
/// - Windows: reads `$COMSPEC`, falls back to `cmd.exe`
pub fn default_shell() -> String {
    #[cfg(unix)]
    {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }
    #[cfg(windows)]
    {
        std::env::var("COMSPEC").unwrap_or_else(|_| "cmd.exe".to_string())
    }
}

/// The configured shell program, or the user's default.
pub fn resolve_shell(config: &ShellConfig) -> String {
    if config.program.trim().is_empty() {
        default_shell()
    } else {
        config.program.clone()
    }
}

// =============================================================================
// ENVIRONMENT SANITIZATION
// =============================================================================

/// Environment variables inherited by spawned shells.
///
/// Anything else (API keys in particular) only reaches the shell through
/// `[shell.env]`.
const ALLOWED_ENV_VARS: &[&str] = &[
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "PATH",
    "TERM",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TMPDIR",
    "TMP",
    "TEMP",
    // Windows-specific
    "USERPROFILE",
    "APPDATA",
    "LOCALAPPDATA",
    "SYSTEMROOT",
    "COMSPEC",
    "HOMEDRIVE",
    "HOMEPATH",
];

/// Build a sanitized `CommandBuilder` from the shell config.
fn build_shell_command(config: &ShellConfig) -> CommandBuilder {
    let shell = resolve_shell(config);
    let mut cmd = CommandBuilder::new(&shell);

    cmd.env_clear();
    for key in ALLOWED_ENV_VARS {
        if let Ok(val) = std::env::var(key) {
            cmd.env(key, val);
        }
    }
    cmd.env("TERM", "xterm-256color");
    for (key, val) in &config.env {
        cmd.env(key, val);
    }

    #[cfg(unix)]
    if config.login_shell {
        cmd.arg("-l");
    }
    for arg in &config.args {
        cmd.arg(arg);
    }

    if let Some(dir) = &config.working_directory {
        cmd.cwd(dir);
    }

    cmd
}

// =============================================================================
// BOOTSTRAP
// =============================================================================

/// Quote `text` for a POSIX shell.
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}

/// Input typed into a new shell before any client input: the banner echo
/// followed by the bootstrap commands, one per line.
pub fn bootstrap_input(config: &ShellConfig) -> String {
    let mut input = String::new();
    if !config.banner.is_empty() {
        input.push_str(&format!("echo {}\n", shell_quote(&config.banner)));
    }
    for command in &config.bootstrap {
        input.push_str(command);
        input.push('\n');
    }
    input
}

// =============================================================================
// SPAWN
// =============================================================================

/// Spawn the configured shell on a new PTY of the given size.
///
/// A background thread reads the PTY and publishes decoded text on
/// `output`, then [`PtyOutput::Exited`] once the shell side closes. Subscribe
/// before calling this to see the shell's first output.
pub fn spawn_pty(
    config: &ShellConfig,
    cols: u16,
    rows: u16,
    output: broadcast::Sender<PtyOutput>,
) -> Result<PtyHandle, SessionError> {
    let pty_system = native_pty_system();

    let size = PtySize {
        rows,
        cols,
        pixel_width: 0,
        pixel_height: 0,
    };

    let pair = pty_system
        .openpty(size)
        .map_err(|e| SessionError::Spawn(format!("failed to open PTY: {e}")))?;

    let cmd = build_shell_command(config);
    let child = pair.slave.spawn_command(cmd).map_err(|e| {
        SessionError::Spawn(format!("failed to spawn shell '{}': {e}", resolve_shell(config)))
    })?;

    // Only the master side is kept.
    drop(pair.slave);

    let writer = pair
        .master
        .take_writer()
        .map_err(|e| SessionError::Spawn(format!("failed to take PTY writer: {e}")))?;

    let mut reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| SessionError::Spawn(format!("failed to clone PTY reader: {e}")))?;

    let exited = Arc::new(AtomicBool::new(false));
    let reader_exited = exited.clone();

    thread::Builder::new()
        .name("pty-reader".to_string())
        .spawn(move || {
            let mut buf = [0u8; PTY_READ_CHUNK];
            let mut carry = Utf8Carry::default();
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let text = carry.decode(&buf[..n]);
                        // No receivers just means nobody is attached right now.
                        if !text.is_empty() {
                            let _ = output.send(PtyOutput::Data(text));
                        }
                    }
                    Err(e) => {
                        tracing::debug!("PTY reader error: {e}");
                        break;
                    }
                }
            }
            if carry.pending() > 0 {
                tracing::debug!(bytes = carry.pending(), "PTY closed mid-character");
            }
            reader_exited.store(true, Ordering::Release);
            let _ = output.send(PtyOutput::Exited);
        })
        .map_err(|e| SessionError::Spawn(format!("failed to spawn PTY reader thread: {e}")))?;

    Ok(PtyHandle {
        writer,
        child,
        master: pair.master,
        exited,
        size,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sh_config() -> ShellConfig {
        ShellConfig {
            program: "/bin/sh".into(),
            ..Default::default()
        }
    }

    #[test]
    fn default_shell_returns_nonempty() {
        assert!(!default_shell().is_empty());
    }

    #[test]
    fn configured_program_wins() {
        assert_eq!(resolve_shell(&sh_config()), "/bin/sh");
        assert_eq!(resolve_shell(&ShellConfig::default()), default_shell());
    }

    #[test]
    fn allowed_env_vars_excludes_secrets() {
        for var in ALLOWED_ENV_VARS {
            let lower = var.to_lowercase();
            for word in ["key", "secret", "token", "password"] {
                assert!(
                    !lower.contains(word),
                    "ALLOWED_ENV_VARS should not contain '{var}'"
                );
            }
        }
    }

    #[test]
    fn bootstrap_echoes_banner_then_commands() {
        let config = ShellConfig::default();
        assert_eq!(bootstrap_input(&config), "echo 'Terminal ready'\nhash -r\n");
    }

    #[test]
    fn bootstrap_quotes_banner() {
        let config = ShellConfig {
            banner: "it's up".into(),
            bootstrap: Vec::new(),
            ..Default::default()
        };
        assert_eq!(bootstrap_input(&config), "echo 'it'\\''s up'\n");
    }

    #[test]
    fn empty_banner_is_skipped() {
        let config = ShellConfig {
            banner: String::new(),
            bootstrap: vec!["cd /tmp".into()],
            ..Default::default()
        };
        assert_eq!(bootstrap_input(&config), "cd /tmp\n");
    }

    #[cfg(unix)]
    #[test]
    fn spawn_pty_creates_handle() {
        let (tx, _rx) = broadcast::channel(16);
        let mut handle = spawn_pty(&sh_config(), 80, 24, tx).expect("spawn should succeed");
        assert_eq!(handle.size(), (80, 24));
        handle.kill();
    }

    #[test]
    fn spawn_missing_program_fails() {
        let (tx, _rx) = broadcast::channel(16);
        let config = ShellConfig {
            program: "/nonexistent/shell-binary".into(),
            ..Default::default()
        };
        let err = spawn_pty(&config, 80, 24, tx).unwrap_err();
        assert!(matches!(err, SessionError::Spawn(_)));
    }
}
