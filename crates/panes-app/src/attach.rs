//! `panes attach`: one pane, rendered to stdout, fed from stdin.
//!
//! Line mode treats each stdin line as a prompt submission, with a few
//! `:`-prefixed commands for history recall and session control. Raw mode
//! hands stdin to the surface's input path unchanged.

use std::io::{BufRead, Read, Write};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;

use panes_common::{PanesError, SessionKey, Utf8Carry};
use panes_config::{PanesConfig, TerminalTheme};
use panes_terminal::{
    BackendFactory, Connector, Key, PaneController, PaneHandle, Submission, SurfaceOptions,
    TermSize, WriterBackend, WsConnector,
};

const HELP: &str =
    "commands: :older, :newer, :switch <key>, :reconnect, :quit (:: sends a literal ':')";

// =============================================================================
// LINE COMMANDS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Submit this text.
    Submit(String),
    /// Empty line: submit whatever history recall staged.
    SendStaged,
    Older,
    Newer,
    Switch(String),
    Reconnect,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> LineCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return LineCommand::SendStaged;
    }
    if let Some(literal) = line.strip_prefix("::") {
        return LineCommand::Submit(format!(":{literal}"));
    }
    let Some(command) = line.strip_prefix(':') else {
        return LineCommand::Submit(line.to_string());
    };

    let words: Vec<&str> = command.split_whitespace().collect();
    match words.as_slice() {
        ["older"] => LineCommand::Older,
        ["newer"] => LineCommand::Newer,
        ["switch", key] => LineCommand::Switch((*key).to_string()),
        ["reconnect"] => LineCommand::Reconnect,
        ["quit"] | ["q"] => LineCommand::Quit,
        _ => LineCommand::Unknown(line.to_string()),
    }
}

fn note(status: &mut dyn Write, message: &str) {
    let _ = writeln!(status, "{message}");
}

fn recall(pane: &mut PaneController, key: Key, status: &mut dyn Write) {
    pane.key_press(key);
    if pane.staged().is_empty() {
        note(status, "[nothing staged]");
    } else {
        note(status, &format!("[staged: {}] press Enter to send", pane.staged()));
    }
}

/// Apply one stdin line to the pane.
pub fn apply_line(pane: &mut PaneController, line: &str, status: &mut dyn Write) {
    match parse_line(line) {
        LineCommand::Submit(text) => {
            if pane.submit(&text) == Submission::NotConnected {
                note(status, "[not connected; line kept in history]");
            }
        }
        LineCommand::SendStaged => {
            pane.key_press(Key::Enter {
                newline_modifier: false,
            });
        }
        LineCommand::Older => recall(pane, Key::Up, status),
        LineCommand::Newer => recall(pane, Key::Down, status),
        LineCommand::Switch(key) => match SessionKey::new(key) {
            Ok(key) => {
                if let Err(e) = pane.switch_session(key) {
                    note(status, &format!("[{e}]"));
                }
            }
            Err(e) => note(status, &format!("[{e}]")),
        },
        LineCommand::Reconnect => {
            if !pane.reconnect() {
                note(status, "[nothing to reconnect]");
            }
        }
        LineCommand::Quit => {
            pane.teardown();
        }
        LineCommand::Unknown(line) => note(status, &format!("[unknown command {line:?}] {HELP}")),
    }
}

// =============================================================================
// DRIVER
// =============================================================================

/// Mount the pane and run its inbox, applying stdin lines between events,
/// until the pane is closed.
pub async fn drive(
    pane: &mut PaneController,
    mut lines: mpsc::UnboundedReceiver<String>,
    status: &mut dyn Write,
) {
    pane.mount();
    let mut lines_open = true;

    while !pane.is_closed() {
        tokio::select! {
            event = pane.next_event() => match event {
                Some(event) => pane.handle_event(event),
                None => break,
            },
            line = lines.recv(), if lines_open => match line {
                Some(line) => apply_line(pane, &line, status),
                None => lines_open = false,
            },
        }
    }
}

/// Forward stdin lines to `lines`; tear the pane down at end of input.
///
/// Stdin is read on a plain thread so a pending read never holds up runtime
/// shutdown.
fn spawn_line_reader(lines: mpsc::UnboundedSender<String>, handle: PaneHandle) {
    let spawned = thread::Builder::new()
        .name("stdin-lines".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if lines.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            handle.teardown();
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "failed to spawn stdin reader");
    }
}

/// Forward raw stdin chunks into the surface input path.
fn spawn_raw_reader(handle: PaneHandle) {
    let spawned = thread::Builder::new()
        .name("stdin-raw".to_string())
        .spawn(move || {
            forward_raw(std::io::stdin().lock(), &handle);
            handle.teardown();
        });
    if let Err(e) = spawned {
        tracing::error!(error = %e, "failed to spawn stdin reader");
    }
}

/// Copy `reader` into the pane's raw input path until EOF. Characters split
/// across reads are joined before they are sent.
fn forward_raw(mut reader: impl Read, handle: &PaneHandle) {
    let mut carry = Utf8Carry::default();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let data = carry.decode(&buf[..n]);
                if !data.is_empty() && !handle.raw_input(data) {
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        }
    }
    if let Some(rest) = carry.finish() {
        handle.raw_input(rest);
    }
}

// =============================================================================
// ENTRY POINT
// =============================================================================

pub struct AttachOptions {
    pub key: SessionKey,
    pub backend_url: String,
    pub raw: bool,
    pub theme: TerminalTheme,
}

/// Resolve the session key: the explicit one, else the first configured
/// pane.
pub fn session_key(
    config: &PanesConfig,
    explicit: Option<&str>,
) -> Result<SessionKey, PanesError> {
    match explicit {
        Some(key) => Ok(SessionKey::new(key)?),
        None => match config.client.panes.first() {
            Some(pane) => Ok(pane.session_key()?),
            None => Err(PanesError::Other("no panes configured; pass --session".into())),
        },
    }
}

pub fn surface_options(config: &PanesConfig, theme: TerminalTheme) -> SurfaceOptions {
    SurfaceOptions {
        size: TermSize::new(config.client.cols, config.client.rows),
        scrollback_lines: config.client.scrollback_lines as usize,
        theme,
        ..Default::default()
    }
}

pub async fn run(config: &PanesConfig, options: AttachOptions) {
    let connector: Arc<dyn Connector> = Arc::new(WsConnector::new(options.backend_url.clone()));
    let make_backend: BackendFactory =
        Box::new(|| Box::new(WriterBackend::new(std::io::stdout())));
    let mut pane = PaneController::new(
        options.key.clone(),
        connector,
        surface_options(config, options.theme),
        make_backend,
    );

    tracing::info!(
        session = %options.key,
        backend = %options.backend_url,
        raw = options.raw,
        "attaching pane"
    );

    let handle = pane.handle();
    let ctrl_c = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.teardown();
        }
    });

    let mut status = std::io::stderr();
    let (lines_tx, lines_rx) = mpsc::unbounded_channel();
    if options.raw {
        drop(lines_tx);
        spawn_raw_reader(handle);
    } else {
        note(&mut status, HELP);
        spawn_line_reader(lines_tx, handle);
    }

    drive(&mut pane, lines_rx, &mut status).await;
}

// =============================================================================
// TESTS
// =============================================================================
